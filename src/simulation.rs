use crate::bed::build_streambed;
use crate::entrainment::get_event_particles;
use crate::error::SimResult;
use crate::hop::{compute_hops, HopDistribution};
use crate::initializer::set_model_particles;
use crate::particle::{Particle, ParticleId, ParticleTable};
use crate::state::{increment_age, update_flux, update_particle_states};
use crate::subregion::{define_subregions, Subregion};
use crate::transport::move_model_particles;
use crate::vertex::VertexCatalog;
use anyhow::Result;
use bedload_common::{elevation_key, Lattice, SimParams, SimulationConfig, Snapshot};
use log::{debug, info};
use rand::prelude::*;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// What happened during one call to [`Simulation::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: u32,
    /// Entrained particles, recycled ones included.
    pub selected: Vec<ParticleId>,
    pub exited: Vec<ParticleId>,
    pub collision_rounds: u32,
    /// Boundary crossings per subregion during this iteration.
    pub flux: Vec<u32>,
}

/// Owns the state of a bedload run and advances it one iteration at a time.
pub struct Simulation {
    config: SimulationConfig,
    params: SimParams,
    table: ParticleTable,
    subregions: Vec<Subregion>,
    /// Vertices open for the next iteration.
    vertices: VertexCatalog,
    hop_distribution: HopDistribution,
    /// Single RNG threaded through every randomised component.
    rng: StdRng,
    current_iteration: u32,
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Builds the bed, defines the subregions and seeds the model particles.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.run.seed);
        let mut params = config.get_sim_params();

        let (bed, extent) = build_streambed(params.x_max, params.diameter);
        params.x_max = extent;
        let lattice = Lattice::new(params.diameter);
        let mut table = ParticleTable::new(lattice, bed);

        let subregions = define_subregions(extent, params.num_subregions, params.iterations)?;
        let hop_distribution = HopDistribution::new(params.hop_mu, params.hop_sigma, params.hop_normal)?;

        let bed_vertices = VertexCatalog::compute(&table, params.level_limit, None);
        info!("Bed of {} particles offers {} vertices.", table.bed().len(), bed_vertices.len());
        set_model_particles(&mut table, &bed_vertices, params.pack_fraction, params.layer_offset, &mut rng)?;
        info!("Placed {} model particles.", table.model_count());

        let vertices = VertexCatalog::compute(&table, params.level_limit, None);

        Ok(Self {
            config,
            params,
            table,
            subregions,
            vertices,
            hop_distribution,
            rng,
            current_iteration: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Runs one entrainment iteration.
    ///
    /// On error the particle table and flux counters are left as they were.
    pub fn step(&mut self) -> SimResult<IterationReport> {
        let iteration = self.current_iteration;

        // --- 1. Select particles to entrain ---
        let selected = get_event_particles(
            &self.table,
            &self.subregions,
            self.params.events_per_subregion,
            self.params.level_limit,
            self.params.height_dependent,
            &mut self.rng,
        );
        let lifted: HashSet<ParticleId> = selected.iter().copied().collect();

        // --- 2. Vertices with the entrained particles lifted out ---
        let available = VertexCatalog::compute(&self.table, self.params.level_limit, Some(&lifted));

        // --- 3. Sample hops ---
        let hops = compute_hops(&selected, &self.table, &self.hop_distribution, &mut self.rng);

        // --- 4. Move, repairing collisions ---
        let outcome = move_model_particles(
            &mut self.table,
            &hops,
            &available,
            &lifted,
            self.params.layer_offset,
            self.params.max_collision_rounds,
            &mut self.rng,
        )?;

        // --- 5. States, ages and flux ---
        update_particle_states(&mut self.table);
        increment_age(&mut self.table, &selected);
        update_flux(&outcome.displacements, iteration, &mut self.subregions);

        // --- 6. Refresh vertices for the next iteration ---
        self.vertices = VertexCatalog::compute(&self.table, self.params.level_limit, None);

        let flux = self.subregions.iter().map(|s| s.flux_at(iteration)).collect();
        debug!(
            "Iteration {}: {} entrained, {} exited, {} collision rounds.",
            iteration,
            selected.len(),
            outcome.exited.len(),
            outcome.collision_rounds
        );

        self.current_iteration += 1;
        Ok(IterationReport {
            iteration,
            selected,
            exited: outcome.exited,
            collision_rounds: outcome.collision_rounds,
            flux,
        })
    }

    /// Highest resting elevation above each bed particle, computed in parallel.
    fn surface_profile(&self) -> Vec<f64> {
        let lattice = self.table.lattice;
        let model = self.table.model();
        self.table
            .bed()
            .par_iter()
            .map(|bed_particle| {
                let column = lattice.key(bed_particle.x);
                model
                    .iter()
                    .filter(|p| p.in_stream() && (lattice.key(p.x) - column).abs() <= 1)
                    .map(|p| p.elevation)
                    .fold(0.0, f64::max)
            })
            .collect()
    }

    /// Records the current state as a snapshot.
    pub fn record_snapshot(&mut self) -> Result<()> {
        let model = self.table.model();
        let (in_stream_count, active_count, elevation_sum) = model
            .par_iter()
            .filter(|p| p.in_stream())
            .map(|p| (1u32, p.active as u32, p.elevation))
            .reduce(|| (0, 0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));
        let mean_elevation = if in_stream_count > 0 {
            elevation_sum / in_stream_count as f64
        } else {
            0.0
        };
        let layer_count = self
            .table
            .in_stream()
            .map(|p| elevation_key(p.elevation))
            .collect::<BTreeSet<_>>()
            .len() as u32;

        // Flux of the most recently completed iteration
        let flux = match self.current_iteration.checked_sub(1) {
            Some(last) => self.subregions.iter().map(|s| s.flux_at(last)).collect(),
            None => vec![0; self.subregions.len()],
        };

        let positions = if self.config.output.save_positions_in_snapshot {
            Some(self.get_results())
        } else {
            None
        };

        let snapshot = Snapshot {
            iteration: self.current_iteration,
            in_stream_count,
            out_of_stream_count: model.len() as u32 - in_stream_count,
            active_count,
            available_vertex_count: self.vertices.len() as u32,
            layer_count,
            mean_elevation,
            surface_profile: self.surface_profile(),
            flux,
            positions,
        };
        debug!(
            "Snapshot at iteration {}: {} in stream, {} active, {} layers.",
            snapshot.iteration, snapshot.in_stream_count, snapshot.active_count, snapshot.layer_count
        );

        self.recorded_snapshots.push(snapshot);
        Ok(())
    }

    /// `(x, elevation)` of every model particle.
    pub fn get_results(&self) -> Vec<(f64, f64)> {
        self.table.model().iter().map(|p| (p.x, p.elevation)).collect()
    }

    /// Subregion × iteration flux counts.
    pub fn flux_matrix(&self) -> Vec<Vec<u32>> {
        self.subregions.iter().map(|s| s.flux().to_vec()).collect()
    }

    pub fn model_particles(&self) -> &[Particle] {
        self.table.model()
    }

    pub fn table(&self) -> &ParticleTable {
        &self.table
    }

    pub fn subregions(&self) -> &[Subregion] {
        &self.subregions
    }

    pub fn vertices(&self) -> &VertexCatalog {
        &self.vertices
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &Vec<Snapshot> {
        &self.recorded_snapshots
    }
}
