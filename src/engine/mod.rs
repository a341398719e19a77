mod controller;
mod state;

pub use controller::EngineController;
pub use state::{EngineSnapshot, EngineState, Phase, TickOutcome, WorkSummary};
