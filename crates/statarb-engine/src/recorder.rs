use statarb_core::error::{EngineError, EngineResult};
use statarb_core::types::{EquityPoint, ParsedResults};

/// Trading days per year, used to annualise daily risk ratios — the
/// convention the teacher's backtester uses throughout.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One closed round-trip, used only to compute the final summary.
#[derive(Debug, Clone, Copy)]
pub struct ClosedTrade {
    pub profit_loss: f64,
}

/// Append-only equity curve plus the closed-trade ledger, consumed at
/// shutdown to compute the final performance summary (§4.8).
#[derive(Debug, Default)]
pub struct EquityRecorder {
    equity_curve: Vec<EquityPoint>,
    trades: Vec<ClosedTrade>,
}

impl EquityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an equity sample. Rejects a non-increasing timestamp — the
    /// curve is an append-only, strictly monotonic sequence (§4.8).
    pub fn record_equity(&mut self, timestamp_utc_ms: i64, portfolio_value: f64) -> EngineResult<()> {
        if let Some(last) = self.equity_curve.last() {
            if timestamp_utc_ms <= last.timestamp_utc_ms {
                return Err(EngineError::Invariant(format!(
                    "equity timestamp {timestamp_utc_ms} did not advance past {}",
                    last.timestamp_utc_ms
                )));
            }
        }
        self.equity_curve.push(EquityPoint {
            timestamp_utc_ms,
            portfolio_value,
        });
        Ok(())
    }

    pub fn record_trade(&mut self, profit_loss: f64) {
        self.trades.push(ClosedTrade { profit_loss });
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    /// Compute the final summary from the complete equity curve and trade
    /// list. Sharpe/Sortino follow the teacher's daily-return convention;
    /// drawdown, win-rate, and profit-factor are computed directly from
    /// the trade ledger.
    pub fn finalize(&self) -> ParsedResults {
        let (sharpe_ratio, _sortino) = compute_risk_ratios(&self.equity_curve);
        let max_drawdown = compute_max_drawdown(&self.equity_curve);
        let total_return = compute_total_return(&self.equity_curve);
        let (win_rate, profit_factor) = compute_trade_stats(&self.trades);

        ParsedResults {
            sharpe_ratio: sharpe_ratio.unwrap_or(0.0),
            max_drawdown,
            total_return,
            total_trades: self.trades.len() as u64,
            win_rate,
            profit_factor,
        }
    }
}

/// Sharpe/Sortino from daily equity returns, annualised by `sqrt(252)`.
/// Grounded on the teacher's `compute_risk_ratios`.
fn compute_risk_ratios(equity_curve: &[EquityPoint]) -> (Option<f64>, Option<f64>) {
    if equity_curve.len() < 2 {
        return (None, None);
    }
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| (w[1].portfolio_value / w[0].portfolio_value) - 1.0)
        .collect();
    if returns.is_empty() {
        return (None, None);
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let sharpe = if std_dev > 0.0 {
        Some((mean / std_dev) * TRADING_DAYS_PER_YEAR.sqrt())
    } else {
        None
    };

    let downside: Vec<f64> = returns.iter().filter(|r| **r < 0.0).map(|r| r.powi(2)).collect();
    let downside_dev = if !downside.is_empty() {
        (downside.iter().sum::<f64>() / downside.len() as f64).sqrt()
    } else {
        0.0
    };
    let sortino = if downside_dev > 0.0 {
        Some((mean / downside_dev) * TRADING_DAYS_PER_YEAR.sqrt())
    } else {
        sharpe
    };

    (sharpe, sortino)
}

fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.portfolio_value);
        if peak > 0.0 {
            let dd = (peak - point.portfolio_value) / peak;
            max_dd = max_dd.max(dd);
        }
    }
    max_dd
}

fn compute_total_return(equity_curve: &[EquityPoint]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) if first.portfolio_value > 0.0 => {
            (last.portfolio_value / first.portfolio_value) - 1.0
        }
        _ => 0.0,
    }
}

fn compute_trade_stats(trades: &[ClosedTrade]) -> (f64, f64) {
    if trades.is_empty() {
        return (0.0, 0.0);
    }
    let wins = trades.iter().filter(|t| t.profit_loss > 0.0).count();
    let win_rate = wins as f64 / trades.len() as f64;

    let gross_profit: f64 = trades.iter().filter(|t| t.profit_loss > 0.0).map(|t| t.profit_loss).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.profit_loss < 0.0).map(|t| t.profit_loss.abs()).sum();
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    (win_rate, profit_factor)
}
