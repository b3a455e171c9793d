pub mod sizer;
pub mod tag;

pub use sizer::{apply_leverage_cap, long_intent, short_intent, target_notional, PairIntent};
pub use tag::{entry_tag, exit_tag, Leg};
