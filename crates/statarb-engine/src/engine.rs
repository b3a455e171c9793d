use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use statarb_core::config::EngineConfig;
use statarb_core::error::{EngineError, EngineResult};
use statarb_core::traits::HostApi;
use statarb_core::types::{
    CointegrationMetrics, EntrySnapshot, OrderEvent, OrderEventKind, ParsedResults, Pair, PositionState, PriceBar, RegimeTier,
};
use statarb_filters::{evaluate, FilterInputs};
use statarb_regime::RegimeClassifier;
use statarb_sizing::{apply_leverage_cap, entry_tag, exit_tag, long_intent, short_intent, Leg, PairIntent};
use statarb_stats::{refresh_cointegration, SpreadWindow};

use crate::recorder::EquityRecorder;
use crate::state_machine::{decide, Direction, Thresholds, Transition};

/// Number of historical bars requested per leg for a cointegration refresh.
/// Generous relative to `lookback_period` so the AR(1) regression has room.
const COINTEGRATION_HISTORY_BARS: usize = 252;

/// A pair that decided to enter this bar, carrying everything `place_entries`
/// needs to size and tag it once every pair's intent for the bar is known.
struct PendingEntry {
    idx: usize,
    direction: Direction,
    snapshot: EntrySnapshot,
    size_multiplier: f64,
    long_symbol: String,
    short_symbol: String,
    pair_name: String,
    long_close: f64,
    short_close: f64,
}

/// Per-pair mutable runtime state. Constructed once at `initialize` and
/// owned exclusively by the `Engine` for the run's duration (§3).
struct PairRuntime {
    pair: Pair,
    window: SpreadWindow,
    cointegration: CointegrationMetrics,
    cointegration_was_valid: bool,
    last_refresh_iso_week: Option<(i32, u32)>,
    position: PositionState,
}

/// Top-level orchestrator: wires the bar-feed adapter (C1), rolling stats
/// (C2), cointegration diagnostics (C3), regime classifier (C4), filter
/// stack (C5), position state machine (C6), sizer/order-router (C7), and
/// equity recorder (C8) into the host's `on_bar` contract (§2, §6).
pub struct Engine {
    config: EngineConfig,
    pairs: Vec<PairRuntime>,
    regime: RegimeClassifier,
    recorder: EquityRecorder,
    last_bar_time: Option<DateTime<Utc>>,
    refresh_cursor: usize,
}

impl Engine {
    /// Materialise config and build per-pair runtime state (C9). Called
    /// once by the host before the first `on_bar`.
    pub fn initialize(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let pairs = config
            .pairs
            .iter()
            .cloned()
            .map(|pair| PairRuntime {
                pair,
                window: SpreadWindow::new(config.lookback_period),
                cointegration: CointegrationMetrics::blank(0),
                cointegration_was_valid: false,
                last_refresh_iso_week: None,
                position: PositionState::Flat,
            })
            .collect();

        let regime = RegimeClassifier::new(config.vix_thresholds, config.vix_multipliers.clone());

        Ok(Self {
            config,
            pairs,
            regime,
            recorder: EquityRecorder::new(),
            last_bar_time: None,
            refresh_cursor: 0,
        })
    }

    /// Process one timestep. `bars_by_symbol` must carry the latest
    /// completed bar for every symbol the engine needs this tick; a pair
    /// whose leg is missing is skipped entirely for the tick (§4.1).
    pub fn on_bar<H: HostApi>(
        &mut self,
        host: &mut H,
        bars_by_symbol: &HashMap<String, PriceBar>,
        current_vix: f64,
    ) -> EngineResult<()> {
        let now = host.current_time();
        if let Some(last) = self.last_bar_time {
            if now <= last {
                return Err(EngineError::StaleData {
                    symbol: "<bar-feed>".to_string(),
                });
            }
        }
        self.last_bar_time = Some(now);

        let regime_state = self.regime.on_bar(current_vix);
        self.run_scheduled_refresh(host, now)?;

        let mut pending_entries = Vec::new();
        for idx in 0..self.pairs.len() {
            match self.process_pair(
                host,
                idx,
                bars_by_symbol,
                now,
                regime_state.tier,
                regime_state.size_multiplier,
                regime_state.crisis_liquidate,
                regime_state.current_vix,
            ) {
                Ok(Some(entry)) => pending_entries.push(entry),
                Ok(None) => {}
                Err(err) => warn!(pair = %self.pairs[idx].pair.name, error = %err, "skipping pair for this tick"),
            }
        }
        if !pending_entries.is_empty() {
            if let Err(err) = self.place_entries(host, pending_entries) {
                warn!(error = %err, "failed to place sized entries for this tick");
            }
        }

        match host.portfolio_equity() {
            Ok(equity) => self.recorder.record_equity(now.timestamp_millis(), equity)?,
            Err(err) => warn!(error = %err, "failed to sample portfolio equity this tick"),
        }

        Ok(())
    }

    /// Processes one pair's filters and state-machine decision for the
    /// current bar. Exits and stays are fully handled here; an `Enter`
    /// transition is only priced and returned as a `PendingEntry` - actual
    /// sizing happens in `place_entries`, once every pair's intent for this
    /// bar is known, so the gross-leverage cap (§4.7) sees the whole book.
    #[allow(clippy::too_many_arguments)]
    fn process_pair<H: HostApi>(
        &mut self,
        host: &mut H,
        idx: usize,
        bars_by_symbol: &HashMap<String, PriceBar>,
        now: DateTime<Utc>,
        regime_tier: RegimeTier,
        regime_multiplier: f64,
        crisis_liquidate: bool,
        current_vix: f64,
    ) -> EngineResult<Option<PendingEntry>> {
        let (long_symbol, short_symbol, pair_name) = {
            let rt = &self.pairs[idx];
            (rt.pair.long_leg.clone(), rt.pair.short_leg.clone(), rt.pair.name.clone())
        };

        let long_bar = bars_by_symbol.get(&long_symbol).ok_or_else(|| EngineError::StaleData {
            symbol: long_symbol.clone(),
        })?;
        let short_bar = bars_by_symbol.get(&short_symbol).ok_or_else(|| EngineError::StaleData {
            symbol: short_symbol.clone(),
        })?;

        let spread = long_bar.close.ln() - short_bar.close.ln();
        let rt = &mut self.pairs[idx];
        let stats = rt.window.update(spread);
        let window_full = rt.window.is_full();
        let (z, stats_unstable) = match stats {
            Some(s) => (s.z, s.unstable),
            None => (0.0, true),
        };

        // The HL= tag segment tracks whether half-life/ADF filtering is
        // enabled, not whether the current fit happens to be valid - a
        // pair whose cointegration just broke still reports its last
        // computed half-life alongside the force-exit.
        let half_life = if self.config.enable_adf_filter || self.config.enable_half_life_filter {
            Some(rt.cointegration.half_life_days)
        } else {
            None
        };

        let inputs = FilterInputs {
            window_full,
            stats_unstable,
            bar_is_stale: false,
            z,
            regime: statarb_core::types::RegimeState {
                current_vix,
                tier: regime_tier,
                size_multiplier: regime_multiplier,
                crisis_liquidate,
            },
            cointegration: rt.cointegration,
            cointegration_was_valid_last_bar: rt.cointegration_was_valid,
            enable_adf_filter: self.config.enable_adf_filter,
            enable_half_life_filter: self.config.enable_half_life_filter,
            enable_spread_filter: self.config.enable_spread_filter,
            z_spread_critical: self.config.z_spread_critical,
        };
        let verdict = evaluate(&inputs);
        rt.cointegration_was_valid = rt.cointegration.is_valid;

        let holding_days = match rt.position.entry() {
            Some(entry) => (now.timestamp_millis() - entry.entry_time_ms) / 86_400_000,
            None => 0,
        };
        let thresholds = Thresholds {
            z_entry: self.config.z_entry,
            z_exit: self.config.z_exit,
            z_stop: self.config.z_stop,
            max_holding_days: self.config.max_holding_days,
        };

        let transition = decide(
            &rt.position,
            z,
            &verdict,
            holding_days,
            &thresholds,
            now.timestamp_millis(),
            regime_tier,
            half_life,
            0.0, // placeholder notional, sized below only on Enter
        );

        match transition {
            Transition::Stay => Ok(None),
            Transition::Enter { direction, snapshot } => {
                info!(pair = %pair_name, z, direction = ?direction, "sizing new position");
                Ok(Some(PendingEntry {
                    idx,
                    direction,
                    snapshot: EntrySnapshot { entry_spread: spread, ..snapshot },
                    size_multiplier: verdict.size_multiplier * regime_multiplier,
                    long_symbol,
                    short_symbol,
                    pair_name,
                    long_close: long_bar.close,
                    short_close: short_bar.close,
                }))
            }
            Transition::Exit { reason } => {
                let rt = &mut self.pairs[idx];
                let entry = *rt.position.entry().ok_or_else(|| {
                    EngineError::Invariant(format!("{pair_name} exit decided while already flat"))
                })?;
                let pnl = match rt.position {
                    PositionState::Long(_) => entry.notional_per_leg * (spread - entry.entry_spread),
                    PositionState::Short(_) => entry.notional_per_leg * (entry.entry_spread - spread),
                    PositionState::Flat => 0.0,
                };
                // Flip to Flat before issuing either liquidate call: if the
                // short leg's call fails after the long leg succeeded, the
                // pair must not be left straddling Long/Short with a stale
                // entry snapshot (§4.6).
                rt.position = PositionState::Flat;
                let tag = exit_tag(&pair_name, reason, z, half_life, holding_days, current_vix);
                host.liquidate(&long_symbol, &tag)?;
                host.liquidate(&short_symbol, &tag)?;

                self.recorder.record_trade(pnl);
                info!(pair = %pair_name, ?reason, "exited position");
                Ok(None)
            }
        }
    }

    /// Size and place every pair that decided to enter this bar, sharing a
    /// single gross-leverage budget (§4.7) with whatever positions are
    /// already open. New entries are shrunk together, proportionally, if
    /// the combined book would otherwise exceed `gross_leverage_max ×
    /// equity`; already-open legs are left untouched rather than re-hedged.
    fn place_entries<H: HostApi>(&mut self, host: &mut H, pending: Vec<PendingEntry>) -> EngineResult<()> {
        let equity = host.portfolio_equity()?;

        let mut intents: Vec<PairIntent> = self
            .pairs
            .iter()
            .enumerate()
            .filter_map(|(i, rt)| match rt.position {
                PositionState::Long(e) => Some(long_intent(i, e.notional_per_leg)),
                PositionState::Short(e) => Some(short_intent(i, e.notional_per_leg)),
                PositionState::Flat => None,
            })
            .collect();
        let new_start = intents.len();
        for p in &pending {
            let raw_target = statarb_sizing::target_notional(equity, self.config.allocation_per_pair, p.size_multiplier, 1.0);
            intents.push(match p.direction {
                Direction::Long => long_intent(p.idx, raw_target),
                Direction::Short => short_intent(p.idx, raw_target),
            });
        }

        let capped = apply_leverage_cap(&intents, equity, self.config.gross_leverage_max);

        for (offset, p) in pending.into_iter().enumerate() {
            let intent = &capped[new_start + offset];
            let target = intent.long_notional.abs();

            let tag_long = entry_tag(&p.pair_name, p.snapshot.entry_z, p.snapshot.entry_half_life_days, p.size_multiplier, Leg::Long);
            let tag_short = entry_tag(&p.pair_name, p.snapshot.entry_z, p.snapshot.entry_half_life_days, p.size_multiplier, Leg::Short);
            host.place_order(&p.long_symbol, intent.long_notional / p.long_close, &tag_long)?;
            host.place_order(&p.short_symbol, intent.short_notional / p.short_close, &tag_short)?;

            let rt = &mut self.pairs[p.idx];
            let snapshot = EntrySnapshot {
                notional_per_leg: target,
                ..p.snapshot
            };
            rt.position = match p.direction {
                Direction::Long => PositionState::Long(snapshot),
                Direction::Short => PositionState::Short(snapshot),
            };
            info!(pair = %p.pair_name, notional = target, "entered position");
        }
        Ok(())
    }

    /// Weekly cointegration refresh, time-sliced to at most one pair per
    /// bar (§5). Uses `host.history` for both legs, not the O(1) rolling
    /// window, since the AR(1) regression wants a longer series.
    fn run_scheduled_refresh<H: HostApi>(&mut self, host: &mut H, now: DateTime<Utc>) -> EngineResult<()> {
        if self.pairs.is_empty() {
            return Ok(());
        }
        let current_week = (now.iso_week().year(), now.iso_week().week());

        for step in 0..self.pairs.len() {
            let idx = (self.refresh_cursor + step) % self.pairs.len();
            let needs_refresh = self.pairs[idx].last_refresh_iso_week != Some(current_week);
            if !needs_refresh {
                continue;
            }

            let (long_symbol, short_symbol) = {
                let rt = &self.pairs[idx];
                (rt.pair.long_leg.clone(), rt.pair.short_leg.clone())
            };
            let long_history = host.history(&long_symbol, COINTEGRATION_HISTORY_BARS)?;
            let short_history = host.history(&short_symbol, COINTEGRATION_HISTORY_BARS)?;

            let n = long_history.len().min(short_history.len());
            let spread_series: Vec<f64> = (0..n)
                .map(|i| long_history[i].close.ln() - short_history[i].close.ln())
                .collect();

            let metrics = refresh_cointegration(
                &spread_series,
                self.config.adf_pmax,
                self.config.half_life_max_days,
                self.config.enable_adf_filter,
                self.config.enable_half_life_filter,
                now.timestamp_millis(),
            );

            let rt = &mut self.pairs[idx];
            rt.cointegration = metrics;
            rt.last_refresh_iso_week = Some(current_week);
            self.refresh_cursor = (idx + 1) % self.pairs.len();
            break;
        }
        Ok(())
    }

    /// Finalise the run: compute the performance summary from the complete
    /// trade list and equity curve (§4.8). The host tears the engine down
    /// afterward.
    pub fn shutdown(&self) -> ParsedResults {
        self.recorder.finalize()
    }

    pub fn equity_curve(&self) -> &[statarb_core::types::EquityPoint] {
        self.recorder.equity_curve()
    }

    /// Handle a fill/rejection/status update for a previously placed order
    /// (§6 inbound contract). A rejection recovers the pair to `Flat` rather
    /// than leaving it half-open; a fill is informational only, since sizing
    /// already committed to the target notional when the order was placed
    /// (§4.6 failure handling).
    pub fn on_order_event(&mut self, event: &OrderEvent) {
        match &event.kind {
            OrderEventKind::Filled => {}
            OrderEventKind::Rejected { reason } => {
                if let Some(rt) = self.pairs.iter_mut().find(|rt| {
                    rt.pair.long_leg == event.symbol || rt.pair.short_leg == event.symbol
                }) {
                    if !rt.position.is_flat() {
                        warn!(
                            pair = %rt.pair.name,
                            symbol = %event.symbol,
                            order_id = %event.order_id,
                            reason = %reason,
                            "order rejected, recovering pair to flat"
                        );
                        rt.position = PositionState::Flat;
                    }
                }
            }
        }
    }
}
