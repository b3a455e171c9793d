use statarb_core::types::{EntrySnapshot, ExitReason, PositionState, RegimeTier};
use statarb_filters::StackVerdict;

/// Threshold set the state machine consults; materialised once from config
/// and passed in by value each bar (§4.6, §4.9).
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub z_entry: f64,
    pub z_exit: f64,
    pub z_stop: f64,
    pub max_holding_days: i64,
}

/// Which leg goes long on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

/// What a single `decide` call asks the caller to do.
#[derive(Debug, Clone, Copy)]
pub enum Transition {
    Stay,
    Enter {
        direction: Direction,
        snapshot: EntrySnapshot,
    },
    Exit {
        reason: ExitReason,
    },
}

/// Evaluate one bar's transition for a single pair, already filtered through
/// the filter stack. Pure function: no state is mutated here, the caller
/// applies the resulting `Transition` to its own `PositionState`.
#[allow(clippy::too_many_arguments)]
pub fn decide(
    position: &PositionState,
    z: f64,
    verdict: &StackVerdict,
    holding_days: i64,
    thresholds: &Thresholds,
    entry_time_ms: i64,
    entry_vix_tier: RegimeTier,
    entry_half_life_days: Option<f64>,
    notional_per_leg: f64,
) -> Transition {
    match position {
        PositionState::Flat => decide_from_flat(
            z,
            verdict,
            thresholds,
            entry_time_ms,
            entry_vix_tier,
            entry_half_life_days,
            notional_per_leg,
        ),
        PositionState::Long(_) => decide_from_open(Direction::Long, z, verdict, holding_days, thresholds),
        PositionState::Short(_) => decide_from_open(Direction::Short, z, verdict, holding_days, thresholds),
    }
}

fn decide_from_flat(
    z: f64,
    verdict: &StackVerdict,
    thresholds: &Thresholds,
    entry_time_ms: i64,
    entry_vix_tier: RegimeTier,
    entry_half_life_days: Option<f64>,
    notional_per_leg: f64,
) -> Transition {
    if !verdict.entry_allowed() {
        return Transition::Stay;
    }
    let snapshot = EntrySnapshot {
        entry_spread: f64::NAN, // filled in by the caller, which owns the raw spread
        entry_z: z,
        entry_time_ms,
        entry_vix_tier,
        entry_half_life_days,
        notional_per_leg,
    };
    if z <= -thresholds.z_entry {
        Transition::Enter {
            direction: Direction::Long,
            snapshot,
        }
    } else if z >= thresholds.z_entry {
        Transition::Enter {
            direction: Direction::Short,
            snapshot,
        }
    } else {
        Transition::Stay
    }
}

/// Ordered exit evaluation, first match wins: force-exit precedes stop-loss,
/// stop-loss precedes timeout, timeout precedes mean-reversion (§4.6). This
/// ordering is an observable contract, not an implementation detail.
fn decide_from_open(direction: Direction, z: f64, verdict: &StackVerdict, holding_days: i64, thresholds: &Thresholds) -> Transition {
    if let Some(reason) = verdict.force_exit {
        return Transition::Exit { reason };
    }
    if z.abs() >= thresholds.z_stop {
        return Transition::Exit {
            reason: ExitReason::StopLoss,
        };
    }
    if holding_days >= thresholds.max_holding_days {
        return Transition::Exit {
            reason: ExitReason::Timeout,
        };
    }
    let mean_reverted = match direction {
        Direction::Long => z >= -thresholds.z_exit,
        Direction::Short => z <= thresholds.z_exit,
    };
    if mean_reverted {
        return Transition::Exit {
            reason: ExitReason::MeanReversion,
        };
    }
    Transition::Stay
}
