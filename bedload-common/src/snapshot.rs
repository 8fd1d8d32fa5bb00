use serde::{Serialize, Deserialize};

/// A snapshot of the pile and the flux measurements after one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Iteration after which the snapshot was taken (0 = initial state).
    pub iteration: u32,
    /// Model particles currently resting in the stream.
    pub in_stream_count: u32,
    /// Model particles waiting outside the stream to be recycled.
    pub out_of_stream_count: u32,
    /// Model particles with nothing resting on them.
    pub active_count: u32,
    /// Number of admissible vertices for the next iteration.
    pub available_vertex_count: u32,
    /// Distinct elevation layers, bed included.
    pub layer_count: u32,
    pub mean_elevation: f64,
    /// Highest surface elevation above each bed particle, upstream to downstream.
    pub surface_profile: Vec<f64>,
    /// Particles that crossed each subregion's downstream boundary this iteration.
    pub flux: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<(f64, f64)>>,
}
