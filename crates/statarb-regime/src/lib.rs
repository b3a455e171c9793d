use statarb_core::config::VixMultipliers;
use statarb_core::types::{RegimeState, RegimeTier};
use statarb_core::VixThresholds;

/// Number of consecutive bars in a new tier required before the classifier
/// commits to it, suppressing single-bar VIX noise (§4.4).
const DEBOUNCE_BARS: u32 = 2;

fn classify_tier(vix: f64, thresholds: &VixThresholds) -> RegimeTier {
    if vix < thresholds.warning {
        RegimeTier::Normal
    } else if vix < thresholds.high {
        RegimeTier::Warning
    } else if vix < thresholds.crisis {
        RegimeTier::High
    } else {
        RegimeTier::Crisis
    }
}

/// Maps the latest VIX print to a sizing tier, with hysteresis against
/// single-bar noise and a one-shot crisis-liquidation edge signal.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    thresholds: VixThresholds,
    multipliers: VixMultipliers,
    committed_tier: RegimeTier,
    pending_tier: Option<RegimeTier>,
    pending_count: u32,
}

impl RegimeClassifier {
    pub fn new(thresholds: VixThresholds, multipliers: VixMultipliers) -> Self {
        Self {
            thresholds,
            multipliers,
            committed_tier: RegimeTier::Normal,
            pending_tier: None,
            pending_count: 0,
        }
    }

    /// Feed the latest VIX bar; returns the process-wide regime state.
    pub fn on_bar(&mut self, current_vix: f64) -> RegimeState {
        let observed = classify_tier(current_vix, &self.thresholds);
        let previous_tier = self.committed_tier;

        if observed == self.committed_tier {
            self.pending_tier = None;
            self.pending_count = 0;
        } else {
            match self.pending_tier {
                Some(t) if t == observed => {
                    self.pending_count += 1;
                }
                _ => {
                    self.pending_tier = Some(observed);
                    self.pending_count = 1;
                }
            }
            if self.pending_count >= DEBOUNCE_BARS {
                self.committed_tier = observed;
                self.pending_tier = None;
                self.pending_count = 0;
            }
        }

        let crisis_liquidate =
            self.committed_tier == RegimeTier::Crisis && previous_tier != RegimeTier::Crisis;

        RegimeState {
            current_vix,
            tier: self.committed_tier,
            size_multiplier: self.multipliers.for_tier(self.committed_tier),
            crisis_liquidate,
        }
    }

    pub fn current_tier(&self) -> RegimeTier {
        self.committed_tier
    }
}
