use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Geometry of the flume and the grain population
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StreamConfig {
    pub x_max: f64, // Requested stream extent; the bed may round this up
    pub num_subregions: u32,
    pub diameter: f64,
    pub pack_fraction: f64,
    pub level_limit: u32, // Maximum number of model layers above the bed
}

// Iteration control, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    pub iterations: u32,
    pub events_per_subregion: u32,
    pub seed: u64,
    #[serde(default = "default_max_collision_rounds")]
    pub max_collision_rounds: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32, // Iterations between recorded snapshots
}

// Hop length distribution
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct HopConfig {
    pub mu: f64,
    pub sigma: f64,
    #[serde(default)]
    pub normal: bool, // false = log-normal (default), true = normal
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SelectionConfig {
    /// Entrain every particle on the topmost layer once the pile hits the level limit.
    #[serde(default)]
    pub height_dependent: bool,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_flux: bool,
    pub save_positions: bool,
    pub save_stats: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

const MIN_DIAMETER: f64 = 0.02;

fn default_max_collision_rounds() -> u32 {
    100
}

fn default_record_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub stream: StreamConfig,
    pub run: RunConfig,
    pub hop: HopConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        // Elevations are kept to two decimals, so thinner layers would merge.
        if !(self.stream.diameter >= MIN_DIAMETER) {
            anyhow::bail!("diameter must be at least {}.", MIN_DIAMETER);
        }
        if !(self.stream.x_max > 0.0) {
            anyhow::bail!("x_max must be positive.");
        }
        if self.stream.num_subregions == 0 {
            anyhow::bail!("num_subregions must be greater than 0.");
        }
        if !(self.stream.pack_fraction > 0.0) {
            anyhow::bail!("pack_fraction must be positive.");
        }
        if self.stream.level_limit == 0 {
            anyhow::bail!("level_limit must be at least 1.");
        }
        if self.run.iterations == 0 {
            anyhow::bail!("iterations must be greater than 0.");
        }
        if self.run.events_per_subregion == 0 {
            anyhow::bail!("events_per_subregion must be greater than 0.");
        }
        if self.run.max_collision_rounds == 0 {
            anyhow::bail!("max_collision_rounds must be greater than 0.");
        }
        if !self.hop.mu.is_finite() || !self.hop.sigma.is_finite() || self.hop.sigma < 0.0 {
            anyhow::bail!("hop parameters must be finite with sigma >= 0.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let diameter = self.stream.diameter;
        let half_diameter = diameter / 2.0;
        // Vertical offset between a grain and the two grains it rests on.
        let layer_offset = (diameter * diameter - half_diameter * half_diameter).sqrt();

        SimParams {
            x_max: self.stream.x_max,
            num_subregions: self.stream.num_subregions,
            diameter,
            layer_offset,
            pack_fraction: self.stream.pack_fraction,
            level_limit: self.stream.level_limit,
            iterations: self.run.iterations,
            events_per_subregion: self.run.events_per_subregion,
            max_collision_rounds: self.run.max_collision_rounds,
            hop_mu: self.hop.mu,
            hop_sigma: self.hop.sigma,
            hop_normal: self.hop.normal,
            height_dependent: self.selection.height_dependent,
        }
    }
}
