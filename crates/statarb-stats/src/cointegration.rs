use statrs::distribution::{ContinuousCDF, Normal};

use statarb_core::types::CointegrationMetrics;

/// Minimum number of log-spread observations before a regression is
/// attempted; below this the fit is too noisy to trust (mirrors the OU
/// estimator's own floor).
const MIN_HISTORY: usize = 20;

/// Refresh cointegration diagnostics for one pair from its log-price spread
/// history (`ln(p_long) - ln(p_short)`, oldest first).
///
/// Runs an Augmented-Dickey-Fuller-style regression `Δs_t = α + β·s_{t-1} + ε`
/// and converts the slope into an Ornstein-Uhlenbeck half-life via
/// `-ln(2) / ln(1 + β)`. `now_ms` stamps `last_refresh_time_ms`.
///
/// `enable_adf_filter` and `enable_half_life_filter` are independently
/// toggleable legs of `is_valid` (§6): a disabled leg's criterion is
/// vacuously satisfied rather than evaluated.
#[allow(clippy::too_many_arguments)]
pub fn refresh(
    spread_history: &[f64],
    p_max: f64,
    hl_max_days: f64,
    enable_adf_filter: bool,
    enable_half_life_filter: bool,
    now_ms: i64,
) -> CointegrationMetrics {
    match fit_adf(spread_history) {
        Some((adf_statistic, beta)) => {
            let adf_pvalue = adf_pvalue_from_statistic(adf_statistic);
            let half_life_days = half_life_from_beta(beta);
            let adf_leg_ok = !enable_adf_filter || adf_pvalue <= p_max;
            let half_life_leg_ok = !enable_half_life_filter
                || (half_life_days.is_finite() && half_life_days > 0.0 && half_life_days <= hl_max_days);
            let is_valid = adf_leg_ok && half_life_leg_ok;
            CointegrationMetrics {
                adf_statistic,
                adf_pvalue,
                half_life_days,
                last_refresh_time_ms: now_ms,
                is_valid,
            }
        }
        None => CointegrationMetrics::blank(now_ms),
    }
}

/// OLS fit of `Δs_t = α + β·s_{t-1} + ε`. Returns `(t_stat(β), β)`.
/// `None` on insufficient history or a singular design matrix.
fn fit_adf(spread_history: &[f64]) -> Option<(f64, f64)> {
    if spread_history.len() < MIN_HISTORY {
        return None;
    }
    let levels = &spread_history[..spread_history.len() - 1];
    let diffs: Vec<f64> = spread_history.windows(2).map(|w| w[1] - w[0]).collect();
    let n = levels.len() as f64;

    let x_mean = levels.iter().sum::<f64>() / n;
    let y_mean = diffs.iter().sum::<f64>() / n;

    let sxx: f64 = levels.iter().map(|x| (x - x_mean).powi(2)).sum();
    if sxx < 1e-12 {
        return None;
    }
    let sxy: f64 = levels
        .iter()
        .zip(diffs.iter())
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    let beta = sxy / sxx;
    let alpha = y_mean - beta * x_mean;

    let rss: f64 = levels
        .iter()
        .zip(diffs.iter())
        .map(|(x, y)| {
            let resid = y - (alpha + beta * x);
            resid * resid
        })
        .sum();

    if n <= 2.0 {
        return None;
    }
    let residual_variance = rss / (n - 2.0);
    let se_beta = (residual_variance / sxx).sqrt();
    if se_beta < 1e-12 || !se_beta.is_finite() {
        return None;
    }

    let t_stat = beta / se_beta;
    if !t_stat.is_finite() {
        return None;
    }
    Some((t_stat, beta))
}

/// Half-life of mean reversion in bars, `-ln(2) / ln(1 + β)`. Non-finite or
/// non-positive whenever `β` does not imply mean reversion (`β >= 0`).
fn half_life_from_beta(beta: f64) -> f64 {
    let ratio = 1.0 + beta;
    if ratio <= 0.0 {
        return f64::NAN;
    }
    -std::f64::consts::LN_2 / ratio.ln()
}

/// One-tailed approximate p-value for the ADF t-statistic. A rejection of
/// the unit-root null requires a strongly negative statistic, so the
/// standard-normal left tail stands in for the Dickey-Fuller critical-value
/// table (documented approximation, not exact MacKinnon surfaces).
fn adf_pvalue_from_statistic(t_stat: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("standard normal is always valid");
    normal.cdf(t_stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_reverting_series(n: usize) -> Vec<f64> {
        // Deterministic AR(1)-like series that reverts toward 0, no RNG
        // available in this environment.
        let mut s = 2.0_f64;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(s);
            let wiggle = if i % 2 == 0 { 0.05 } else { -0.05 };
            s = 0.85 * s + wiggle;
        }
        out
    }

    #[test]
    fn insufficient_history_is_blank() {
        let metrics = refresh(&[0.1, 0.2, 0.3], 0.1, 30.0, true, true, 1_000);
        assert!(!metrics.is_valid);
        assert!(metrics.half_life_days.is_nan());
    }

    #[test]
    fn mean_reverting_series_is_valid_under_loose_thresholds() {
        let series = mean_reverting_series(200);
        let metrics = refresh(&series, 0.5, 100.0, true, true, 1_000);
        assert!(metrics.half_life_days > 0.0);
        assert!(metrics.is_valid);
    }

    #[test]
    fn flat_series_is_singular_and_blank() {
        let series = vec![1.0; 50];
        let metrics = refresh(&series, 0.1, 30.0, true, true, 1_000);
        assert!(!metrics.is_valid);
    }

    #[test]
    fn tight_hl_cap_invalidates_otherwise_good_fit() {
        let series = mean_reverting_series(200);
        let metrics = refresh(&series, 0.5, 0.001, true, true, 1_000);
        assert!(!metrics.is_valid);
    }

    #[test]
    fn disabled_half_life_leg_ignores_its_own_cap() {
        let series = mean_reverting_series(200);
        // adf leg passes under the loose threshold; hl cap is absurdly tight
        // but the leg is switched off, so it must not veto the fit.
        let metrics = refresh(&series, 0.5, 0.001, true, false, 1_000);
        assert!(metrics.is_valid);
    }

    #[test]
    fn disabled_adf_leg_ignores_its_own_pvalue() {
        let series = mean_reverting_series(200);
        // pmax of 0.0 can never be satisfied by any finite p-value; with the
        // adf leg off, only the half-life criterion should gate validity.
        let metrics = refresh(&series, 0.0, 100.0, false, true, 1_000);
        assert!(metrics.is_valid);
    }
}
