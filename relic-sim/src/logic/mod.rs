pub mod reports;
pub mod seeds;
pub mod simulation;

pub use seeds::resolve_seed_inputs;
pub use simulation::{
    SimulationConfig, SimulationRecord, SimulationSummary, run_simulation, summarize,
};
