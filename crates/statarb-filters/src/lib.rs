use statarb_core::types::{CointegrationMetrics, ExitReason, RegimeState};

/// Why a filter refused an entry. Never enters a tag string — unlike
/// `ExitReason`, vetoed entries emit no order at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoReason {
    NotReady,
    RegimeZeroMultiplier,
    CointegrationInvalid,
}

/// One filter's verdict for a single pair on a single bar (§4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    AllowEntry(f64),
    VetoEntry(VetoReason),
    ForceExit(ExitReason),
    NoOpinion,
}

/// Inputs a bar brings to the filter stack; everything already computed by
/// upstream components (C2-C4), nothing recomputed here.
#[derive(Debug, Clone, Copy)]
pub struct FilterInputs {
    pub window_full: bool,
    pub stats_unstable: bool,
    pub bar_is_stale: bool,
    pub z: f64,
    pub regime: RegimeState,
    pub cointegration: CointegrationMetrics,
    pub cointegration_was_valid_last_bar: bool,
    pub enable_adf_filter: bool,
    pub enable_half_life_filter: bool,
    pub enable_spread_filter: bool,
    pub z_spread_critical: f64,
}

fn data_ready(inputs: &FilterInputs) -> FilterDecision {
    if !inputs.window_full || inputs.stats_unstable || inputs.bar_is_stale {
        FilterDecision::VetoEntry(VetoReason::NotReady)
    } else {
        FilterDecision::NoOpinion
    }
}

fn regime_filter(inputs: &FilterInputs) -> FilterDecision {
    if inputs.regime.crisis_liquidate {
        return FilterDecision::ForceExit(ExitReason::VixCrisis);
    }
    if inputs.regime.size_multiplier <= 0.0 {
        FilterDecision::VetoEntry(VetoReason::RegimeZeroMultiplier)
    } else {
        FilterDecision::AllowEntry(inputs.regime.size_multiplier)
    }
}

fn cointegration_filter(inputs: &FilterInputs) -> FilterDecision {
    if !(inputs.enable_adf_filter || inputs.enable_half_life_filter) {
        return FilterDecision::NoOpinion;
    }
    if inputs.cointegration_was_valid_last_bar && !inputs.cointegration.is_valid {
        return FilterDecision::ForceExit(ExitReason::BrokenCointegration);
    }
    if !inputs.cointegration.is_valid {
        FilterDecision::VetoEntry(VetoReason::CointegrationInvalid)
    } else {
        FilterDecision::NoOpinion
    }
}

fn spread_deviation_filter(inputs: &FilterInputs) -> FilterDecision {
    if !inputs.enable_spread_filter {
        return FilterDecision::NoOpinion;
    }
    if inputs.z.abs() > inputs.z_spread_critical {
        FilterDecision::ForceExit(ExitReason::SpreadCritical)
    } else {
        FilterDecision::NoOpinion
    }
}

/// Composed verdict of the whole filter stack for one pair on one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackVerdict {
    pub force_exit: Option<ExitReason>,
    pub entry_vetoed: bool,
    pub veto_reason: Option<VetoReason>,
    pub size_multiplier: f64,
}

/// Run the fixed, ordered filter list and apply the composition rule:
/// `ForceExit` outranks `VetoEntry` outranks `AllowEntry`; the resulting
/// size multiplier is the product of every filter's multiplier (§4.5).
pub fn evaluate(inputs: &FilterInputs) -> StackVerdict {
    let decisions = [
        data_ready(inputs),
        regime_filter(inputs),
        cointegration_filter(inputs),
        spread_deviation_filter(inputs),
    ];

    let mut force_exit = None;
    let mut entry_vetoed = false;
    let mut veto_reason = None;
    let mut multiplier = 1.0;

    for decision in decisions {
        match decision {
            FilterDecision::ForceExit(reason) => {
                if force_exit.is_none() {
                    force_exit = Some(reason);
                }
            }
            FilterDecision::VetoEntry(reason) => {
                entry_vetoed = true;
                if veto_reason.is_none() {
                    veto_reason = Some(reason);
                }
            }
            FilterDecision::AllowEntry(mult) => {
                multiplier *= mult;
            }
            FilterDecision::NoOpinion => {}
        }
    }

    StackVerdict {
        force_exit,
        entry_vetoed,
        veto_reason,
        size_multiplier: multiplier,
    }
}

impl StackVerdict {
    pub fn entry_allowed(&self) -> bool {
        self.force_exit.is_none() && !self.entry_vetoed && self.size_multiplier > 0.0
    }
}
