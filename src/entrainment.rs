use crate::particle::{Particle, ParticleId, ParticleTable};
use crate::subregion::Subregion;
use bedload_common::elevation_key;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Chooses the particles to entrain this iteration.
///
/// Subregions are visited upstream to downstream; a particle resting on a
/// shared boundary can only be picked by the first subregion that sees it.
/// Every particle waiting outside the stream then joins the selection; it
/// hops from the upstream origin (see [`Particle::hop_origin`]). The table
/// itself is not touched.
pub fn get_event_particles<R: Rng + ?Sized>(
    table: &ParticleTable,
    subregions: &[Subregion],
    events_per_subregion: u32,
    level_limit: u32,
    height_dependent: bool,
    rng: &mut R,
) -> Vec<ParticleId> {
    let requested = events_per_subregion as usize;
    let mut selected: Vec<ParticleId> = Vec::new();
    let mut claimed: HashSet<ParticleId> = HashSet::new();

    for subregion in subregions {
        let within = |p: &&Particle| {
            p.in_stream() && p.x >= subregion.left_boundary() && p.x <= subregion.right_boundary()
        };
        let mut candidates: Vec<&Particle> = table
            .model()
            .iter()
            .filter(within)
            .filter(|p| p.active && !claimed.contains(&p.id))
            .collect();

        let mut subregion_ids: Vec<ParticleId> = Vec::new();

        if height_dependent {
            let levels: BTreeSet<i64> = table
                .model()
                .iter()
                .filter(within)
                .map(|p| elevation_key(p.elevation))
                .collect();
            if levels.len() >= level_limit as usize {
                if let Some(&top) = levels.last() {
                    // Tip particles go first and count toward the request
                    let (tips, rest): (Vec<&Particle>, Vec<&Particle>) =
                        candidates.into_iter().partition(|p| elevation_key(p.elevation) == top);
                    subregion_ids.extend(tips.iter().map(|p| p.id));
                    candidates = rest;
                }
            }
        }

        let remaining = requested.saturating_sub(subregion_ids.len()).min(candidates.len());
        for idx in rand::seq::index::sample(rng, candidates.len(), remaining) {
            subregion_ids.push(candidates[idx].id);
        }

        if subregion_ids.len() < requested {
            warn!(
                "Requested {} events in {} but only {} are occurring.",
                requested,
                subregion.name(),
                subregion_ids.len()
            );
        }
        debug!("{}: selected {:?}", subregion.name(), subregion_ids);

        claimed.extend(subregion_ids.iter().copied());
        selected.extend(subregion_ids);
    }

    for id in table.out_of_stream_ids() {
        info!("Particle {} re-entering the stream at the upstream origin.", id);
        selected.push(id);
    }

    selected
}
