use crate::particle::{ParticleId, ParticleTable};
use crate::subregion::{subregion_index, Subregion};
use bedload_common::is_exit;
use log::warn;
use std::collections::HashSet;

/// Marks every model particle active unless another particle rests on it.
pub fn update_particle_states(table: &mut ParticleTable) {
    let supporting: HashSet<ParticleId> = table
        .supports()
        .iter()
        .flatten()
        .flat_map(|pair| [pair.left, pair.right])
        .filter(|id| !id.is_bed())
        .collect();

    for particle in table.model_mut() {
        particle.active = !supporting.contains(&particle.id);
    }
}

/// Ages every model particle by one iteration, restarting the clock for `entrained`.
pub fn increment_age(table: &mut ParticleTable, entrained: &[ParticleId]) {
    for particle in table.model_mut() {
        particle.age += 1;
    }
    for &id in entrained {
        if let Some(particle) = table.get_model_mut(id) {
            particle.age = 0;
        }
    }
}

/// One particle's displacement during an iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub id: ParticleId,
    pub from: f64,
    /// `EXIT_SENTINEL` if the particle left the stream.
    pub to: f64,
}

/// Indices of the subregions whose downstream boundary a move crosses.
///
/// Counting starts at the subregion holding the start position. An exit is
/// credited to the final subregion.
pub fn crossed_boundaries(subregions: &[Subregion], from: f64, to: f64) -> Vec<usize> {
    let Some(start) = subregion_index(subregions, from) else {
        return Vec::new();
    };
    let last = subregions.len() - 1;
    (start..subregions.len())
        .filter(|&idx| {
            if is_exit(to) {
                idx == last
            } else {
                to >= subregions[idx].right_boundary()
            }
        })
        .collect()
}

/// Adds this iteration's boundary crossings to the subregion flux counters.
pub fn update_flux(displacements: &[Displacement], iteration: u32, subregions: &mut [Subregion]) {
    for displacement in displacements {
        if subregion_index(subregions, displacement.from).is_none() {
            warn!(
                "Particle {} started at {} which is outside every subregion; flux not recorded.",
                displacement.id, displacement.from
            );
            continue;
        }
        for idx in crossed_boundaries(subregions, displacement.from, displacement.to) {
            subregions[idx].increment_flux(iteration);
        }
    }
}
