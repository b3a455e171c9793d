use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::types::PriceBar;

/// The outbound half of the host contract (§6): everything the engine calls
/// *out* to the backtest/live host. The engine never performs network or
/// disk I/O itself — all such access is mediated through this trait so the
/// engine stays synchronous and host-agnostic.
pub trait HostApi {
    /// Submit an order; returns a host-assigned order id.
    fn place_order(&mut self, symbol: &str, signed_quantity: f64, tag: &str) -> EngineResult<String>;

    /// Flatten a symbol to zero.
    fn liquidate(&mut self, symbol: &str, tag: &str) -> EngineResult<()>;

    /// Current mark-to-market portfolio value.
    fn portfolio_equity(&self) -> EngineResult<f64>;

    /// Host clock, used for weekly-refresh scheduling and tag timestamps.
    fn current_time(&self) -> DateTime<Utc>;

    /// Historical close series for a symbol, most-recent last, used by the
    /// cointegration refresh. `n_bars` is a request, not a guarantee.
    fn history(&self, symbol: &str, n_bars: usize) -> EngineResult<Vec<PriceBar>>;
}
