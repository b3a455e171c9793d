use thiserror::Error;

/// Error taxonomy for the statistical-arbitrage engine.
///
/// `Config` and `Invariant` are fatal — the engine must not continue past them.
/// `StaleData`, `Numeric`, and `Host` are recoverable: they affect only the
/// current tick/pair and are logged rather than propagated to a crash.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("stale or missing data for {symbol}")]
    StaleData { symbol: String },

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("invariant violation: {0}")]
    Invariant(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
