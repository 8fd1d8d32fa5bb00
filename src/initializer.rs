use crate::error::SimResult;
use crate::particle::{Particle, ParticleTable};
use crate::state::update_particle_states;
use crate::support::place_particle;
use crate::vertex::VertexCatalog;
use log::{debug, warn};
use rand::Rng;
use std::collections::HashSet;

/// Number of model particles needed to fill `pack_fraction` of the vertices.
pub fn determine_num_particles(pack_fraction: f64, num_vertices: usize) -> usize {
    (num_vertices as f64 * pack_fraction).ceil() as usize
}

/// Seeds the model particles onto randomly chosen, distinct vertices.
///
/// Particles receive ids `0, 1, ...` in placement order. Active flags are
/// refreshed once every particle is down.
pub fn set_model_particles<R: Rng + ?Sized>(
    table: &mut ParticleTable,
    available: &VertexCatalog,
    pack_fraction: f64,
    layer_offset: f64,
    rng: &mut R,
) -> SimResult<()> {
    let mut open: Vec<f64> = available.positions().to_vec();
    let mut count = determine_num_particles(pack_fraction, open.len());
    if count > open.len() {
        warn!(
            "Packing fraction {} asks for {} particles but only {} vertices exist. Placing {}.",
            pack_fraction,
            count,
            open.len(),
            open.len()
        );
        count = open.len();
    }

    let diameter = table.lattice.diameter;
    let no_exclusions = HashSet::new();
    for _ in 0..count {
        // Remove the chosen vertex so no two particles share it
        let vertex = open.swap_remove(rng.random_range(0..open.len()));
        let id = table.next_model_id();
        let placement = place_particle(table, id, vertex, layer_offset, &no_exclusions)?;
        table.push_model(
            Particle::model(id, placement.x, placement.elevation, diameter),
            Some(placement.supports),
        );
    }

    update_particle_states(table);
    debug!("Seeded {} model particles on {} vertices.", count, available.len());
    Ok(())
}
