use crate::particle::{Particle, ParticleId};
use log::{debug, warn};

// Tolerance used when deciding whether the grains exactly fill the extent.
const PACKING_EPSILON: f64 = 1e-9;

/// Packs bed particles edge to edge from the upstream origin.
///
/// Centers sit at `d/2, 3d/2, ...` until the requested extent is covered.
/// Returns the bed and the extent it actually spans, which is rounded up to a
/// whole number of grains when `diameter` does not divide `x_max`.
pub fn build_streambed(x_max: f64, diameter: f64) -> (Vec<Particle>, f64) {
    let count = ((x_max / diameter) - PACKING_EPSILON).ceil().max(1.0) as usize;
    let half = diameter / 2.0;

    let bed: Vec<Particle> = (0..count)
        .map(|i| {
            let id = ParticleId(-(i as i64) - 1); // Bed particles get negative IDs
            Particle::bed(id, half + i as f64 * diameter, diameter)
        })
        .collect();

    let achieved = count as f64 * diameter;
    if (achieved - x_max).abs() > PACKING_EPSILON {
        warn!(
            "Bed packing could not match x_max ({}). Updating x_max to match packing extent: {}.",
            x_max, achieved
        );
    }
    debug!("Built streambed of {} particles spanning {}.", bed.len(), achieved);

    (bed, achieved)
}
