use tracing::warn;

/// A dollar-neutral pair of leg orders prior to leverage-cap shrinkage.
#[derive(Debug, Clone, Copy)]
pub struct PairIntent {
    pub pair_index: usize,
    pub long_notional: f64,
    pub short_notional: f64,
}

impl PairIntent {
    pub fn gross_notional(&self) -> f64 {
        self.long_notional.abs() + self.short_notional.abs()
    }
}

/// Target notional per pair, per §4.7:
/// `equity × allocation_per_pair × Π(filter multipliers) × regime_multiplier`.
pub fn target_notional(portfolio_equity: f64, allocation_per_pair: f64, filter_multiplier: f64, regime_multiplier: f64) -> f64 {
    portfolio_equity * allocation_per_pair * filter_multiplier * regime_multiplier
}

/// Build the dollar-neutral intent for a new `Long` position: long the first
/// leg, short the second, equal and opposite notional.
pub fn long_intent(pair_index: usize, target: f64) -> PairIntent {
    PairIntent {
        pair_index,
        long_notional: target,
        short_notional: -target,
    }
}

/// Build the dollar-neutral intent for a new `Short` position: symmetric to
/// `long_intent` with the legs reversed.
pub fn short_intent(pair_index: usize, target: f64) -> PairIntent {
    PairIntent {
        pair_index,
        long_notional: -target,
        short_notional: target,
    }
}

/// Shrink every intent proportionally so the sum of absolute per-pair
/// notionals does not exceed `gross_leverage_max × portfolio_equity` (§4.7).
/// No-op (returns the input unchanged) when already within bounds.
pub fn apply_leverage_cap(intents: &[PairIntent], portfolio_equity: f64, gross_leverage_max: f64) -> Vec<PairIntent> {
    let total_gross: f64 = intents.iter().map(PairIntent::gross_notional).sum();
    let cap = gross_leverage_max * portfolio_equity;
    if total_gross <= cap || total_gross <= 0.0 {
        return intents.to_vec();
    }
    let shrink = cap / total_gross;
    warn!(total_gross, cap, shrink, "gross leverage cap exceeded, shrinking all intents");
    intents
        .iter()
        .map(|i| PairIntent {
            pair_index: i.pair_index,
            long_notional: i.long_notional * shrink,
            short_notional: i.short_notional * shrink,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn long_and_short_intents_are_dollar_neutral() {
        let intent = long_intent(0, 1_000.0);
        assert_relative_eq!(intent.long_notional + intent.short_notional, 0.0);

        let intent = short_intent(0, 1_000.0);
        assert_relative_eq!(intent.long_notional + intent.short_notional, 0.0);
    }

    #[test]
    fn within_cap_is_unchanged() {
        let intents = vec![long_intent(0, 1_000.0), short_intent(1, 1_000.0)];
        let capped = apply_leverage_cap(&intents, 100_000.0, 2.0);
        assert_relative_eq!(capped[0].long_notional, 1_000.0);
    }

    #[test]
    fn over_cap_shrinks_proportionally() {
        let intents = vec![long_intent(0, 60_000.0), long_intent(1, 60_000.0)];
        // gross = 240,000 (both legs counted), cap = 1.0 * 100,000
        let capped = apply_leverage_cap(&intents, 100_000.0, 1.0);
        let shrunk_gross: f64 = capped.iter().map(PairIntent::gross_notional).sum();
        assert_relative_eq!(shrunk_gross, 100_000.0, max_relative = 1e-9);
        // both pairs shrunk by the same factor
        assert_relative_eq!(capped[0].long_notional, capped[1].long_notional);
    }
}
