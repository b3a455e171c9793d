pub mod engine;
pub mod recorder;
pub mod state_machine;

pub use engine::Engine;
pub use recorder::{ClosedTrade, EquityRecorder};
