use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered pair of tradable legs, keyed by a stable human name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub long_leg: String,
    pub short_leg: String,
    pub name: String,
}

impl Pair {
    pub fn new(long_leg: impl Into<String>, short_leg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            long_leg: long_leg.into(),
            short_leg: short_leg.into(),
            name: name.into(),
        }
    }
}

/// A single completed OHLC(V) bar for one symbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Rolling mean/stdev/z-score for a pair's log-price spread, as of the
/// current bar. `unstable` marks a degenerate (near-zero variance) window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpreadStats {
    pub mean: f64,
    pub stdev: f64,
    pub z: f64,
    pub unstable: bool,
}

/// Cointegration health for a pair, refreshed at most once per calendar week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CointegrationMetrics {
    pub adf_statistic: f64,
    pub adf_pvalue: f64,
    pub half_life_days: f64,
    pub last_refresh_time_ms: i64,
    pub is_valid: bool,
}

impl CointegrationMetrics {
    pub fn blank(now_ms: i64) -> Self {
        Self {
            adf_statistic: f64::NAN,
            adf_pvalue: 1.0,
            half_life_days: f64::NAN,
            last_refresh_time_ms: now_ms,
            is_valid: false,
        }
    }
}

/// Volatility-index driven sizing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegimeTier {
    Normal,
    Warning,
    High,
    Crisis,
}

/// Process-wide regime state, updated every bar by the regime classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegimeState {
    pub current_vix: f64,
    pub tier: RegimeTier,
    pub size_multiplier: f64,
    /// One-shot signal: true only on the bar the tier first transitions into Crisis.
    pub crisis_liquidate: bool,
}

/// Reason a position was forced or chose to close. Also doubles as the
/// `<REASON>` segment of the exit order tag (§6 of the spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    MeanReversion,
    Timeout,
    StopLoss,
    SpreadCritical,
    BrokenCointegration,
    VixCrisis,
}

impl ExitReason {
    pub fn as_tag_str(&self) -> &'static str {
        match self {
            ExitReason::MeanReversion => "MEAN_REVERSION",
            ExitReason::Timeout => "TIMEOUT",
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::SpreadCritical => "SPREAD_CRITICAL",
            ExitReason::BrokenCointegration => "BROKEN_COINTEGRATION",
            ExitReason::VixCrisis => "VIX_CRISIS",
        }
    }
}

/// Snapshot recorded at entry time; carried for the lifetime of the position
/// so exits can report `DAYS=` and (if enabled) `HL=` without recomputation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub entry_spread: f64,
    pub entry_z: f64,
    pub entry_time_ms: i64,
    pub entry_vix_tier: RegimeTier,
    pub entry_half_life_days: Option<f64>,
    pub notional_per_leg: f64,
}

/// Per-pair position. Only one open position per pair at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Long(EntrySnapshot),
    Short(EntrySnapshot),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn entry(&self) -> Option<&EntrySnapshot> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(e) | PositionState::Short(e) => Some(e),
        }
    }
}

/// An order emitted by the engine. `signed_quantity` is positive for a buy,
/// negative for a sell. `tag` follows the bit-exact grammar of §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub signed_quantity: f64,
    pub tag: String,
}

/// Delivered via `on_order_event` (§6 host contract, inbound).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEventKind {
    Filled,
    Rejected { reason: String },
}

/// A fill, rejection, or status update the host reports for a previously
/// placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub symbol: String,
    pub kind: OrderEventKind,
}

/// One sample of the equity curve. Never interpolated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp_utc_ms: i64,
    pub portfolio_value: f64,
}

/// Final performance summary, computed from the complete trade list at shutdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResults {
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub total_trades: u64,
    pub win_rate: f64,
    pub profit_factor: f64,
}
