use std::collections::HashMap;

use chrono::{DateTime, Utc};
use statarb_core::config::{EngineConfig, VixMultipliers, VixThresholds};
use statarb_core::error::EngineResult;
use statarb_core::traits::HostApi;
use statarb_core::types::{Pair, PriceBar};

pub const LONG_SYMBOL: &str = "LONGX";
pub const SHORT_SYMBOL: &str = "SHORTX";
pub const PAIR_NAME: &str = "TEST_PAIR";

/// Mirrors the filter the binaries set up in production; lets `RUST_LOG`
/// surface engine decisions while a scenario test runs. Safe to call from
/// every test since `try_init` no-ops once a subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// A small, fully hand-verifiable configuration shared by the scenario
/// tests: a 3-bar lookback keeps every z-score derivable by hand (the
/// maximum |z| reachable with n=3 observations is `(n-1)/sqrt(n) ~= 1.1547`,
/// so thresholds are scaled down from the illustrative values in the host
/// contract rather than reused verbatim).
pub fn base_config() -> EngineConfig {
    EngineConfig {
        pairs: vec![Pair::new(LONG_SYMBOL, SHORT_SYMBOL, PAIR_NAME)],
        lookback_period: 3,
        z_entry: 1.0,
        z_exit: 0.3,
        z_stop: 1.3,
        max_holding_days: 5,
        allocation_per_pair: 0.1,
        enable_adf_filter: false,
        adf_pmax: 0.5,
        enable_half_life_filter: false,
        half_life_max_days: 100.0,
        enable_spread_filter: false,
        z_spread_critical: 5.0,
        vix_thresholds: VixThresholds {
            warning: 20.0,
            high: 30.0,
            crisis: 40.0,
        },
        vix_multipliers: VixMultipliers::default(),
        gross_leverage_max: 10.0,
    }
}

/// A scripted, in-memory stand-in for the QuantConnect host. Records every
/// order placed or liquidated so scenario tests can assert on tag grammar
/// directly, and serves canned `history()` responses for cointegration
/// refreshes.
pub struct FakeHost {
    pub now: DateTime<Utc>,
    pub equity: f64,
    history: HashMap<String, Vec<PriceBar>>,
    pub placed: Vec<PlacedOrder>,
    pub liquidations: Vec<Liquidation>,
    next_order_id: u64,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub symbol: String,
    pub signed_quantity: f64,
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct Liquidation {
    pub symbol: String,
    pub tag: String,
}

impl FakeHost {
    pub fn new(now: DateTime<Utc>, equity: f64) -> Self {
        Self {
            now,
            equity,
            history: HashMap::new(),
            placed: Vec::new(),
            liquidations: Vec::new(),
            next_order_id: 0,
        }
    }

    /// Replace the canned history series for `symbol`, consumed by the next
    /// `history()` call the engine makes for a cointegration refresh.
    pub fn set_history(&mut self, symbol: &str, bars: Vec<PriceBar>) {
        self.history.insert(symbol.to_string(), bars);
    }

    pub fn advance(&mut self, days: i64) {
        self.now += chrono::Duration::days(days);
    }
}

impl HostApi for FakeHost {
    fn place_order(&mut self, symbol: &str, signed_quantity: f64, tag: &str) -> EngineResult<String> {
        self.next_order_id += 1;
        self.placed.push(PlacedOrder {
            symbol: symbol.to_string(),
            signed_quantity,
            tag: tag.to_string(),
        });
        Ok(format!("order-{}", self.next_order_id))
    }

    fn liquidate(&mut self, symbol: &str, tag: &str) -> EngineResult<()> {
        self.liquidations.push(Liquidation {
            symbol: symbol.to_string(),
            tag: tag.to_string(),
        });
        Ok(())
    }

    fn portfolio_equity(&self) -> EngineResult<f64> {
        Ok(self.equity)
    }

    fn current_time(&self) -> DateTime<Utc> {
        self.now
    }

    fn history(&self, symbol: &str, n_bars: usize) -> EngineResult<Vec<PriceBar>> {
        Ok(match self.history.get(symbol) {
            Some(bars) => {
                let start = bars.len().saturating_sub(n_bars);
                bars[start..].to_vec()
            }
            None => Vec::new(),
        })
    }
}

/// A bar whose log-spread against a short leg pinned at close=1.0 is exactly
/// `spread` (since `ln(1.0) == 0.0`). Keeps scenario math one-dimensional.
pub fn bar_with_spread(timestamp: DateTime<Utc>, spread: f64) -> (PriceBar, PriceBar) {
    let long_bar = PriceBar {
        timestamp,
        close: spread.exp(),
    };
    let short_bar = PriceBar { timestamp, close: 1.0 };
    (long_bar, short_bar)
}

pub fn bars_map(long_symbol: &str, short_symbol: &str, long_bar: PriceBar, short_bar: PriceBar) -> HashMap<String, PriceBar> {
    let mut map = HashMap::new();
    map.insert(long_symbol.to_string(), long_bar);
    map.insert(short_symbol.to_string(), short_bar);
    map
}
