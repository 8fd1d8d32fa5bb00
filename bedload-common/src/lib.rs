pub mod config;
pub mod lattice;
pub mod sim_params;
pub mod snapshot;


// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, StreamConfig, RunConfig, HopConfig, SelectionConfig, OutputConfig};
pub use lattice::{Lattice, EXIT_SENTINEL, elevation_key, round_to, is_exit};
pub use sim_params::SimParams;
pub use snapshot::Snapshot;
