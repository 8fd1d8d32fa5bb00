use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Stream geometry
    pub x_max: f64, // Replaced by the achieved bed extent once the bed is built
    pub num_subregions: u32,

    // Grains
    pub diameter: f64,
    pub layer_offset: f64, // Elevation gained when resting on two grains
    pub pack_fraction: f64,
    pub level_limit: u32,

    // Iterations
    pub iterations: u32,
    pub events_per_subregion: u32,
    pub max_collision_rounds: u32,

    // Hops
    pub hop_mu: f64,
    pub hop_sigma: f64,
    pub hop_normal: bool,

    // Selection
    pub height_dependent: bool,
}
