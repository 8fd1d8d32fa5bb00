use crate::error::{SimError, SimResult};
use crate::hop::DesiredHop;
use crate::particle::{ParticleId, ParticleTable};
use crate::state::Displacement;
use crate::support::{place_particle, Placement};
use crate::vertex::VertexCatalog;
use bedload_common::{Lattice, EXIT_SENTINEL};
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};

// Absorbs float noise between sampled hops and lattice positions.
const VERTEX_EPSILON: f64 = 1e-9;

/// Where an entrained particle ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HopTarget {
    Vertex(f64),
    /// No admissible vertex downstream of the desired position.
    Exit,
}

impl HopTarget {
    pub fn vertex(self) -> Option<f64> {
        match self {
            HopTarget::Vertex(x) => Some(x),
            HopTarget::Exit => None,
        }
    }
}

/// Closest vertex at or downstream of `desired`. `vertices` must be ascending.
pub fn find_closest_vertex(desired: f64, vertices: &[f64]) -> HopTarget {
    let idx = vertices.partition_point(|&v| v < desired - VERTEX_EPSILON);
    vertices.get(idx).copied().map_or(HopTarget::Exit, HopTarget::Vertex)
}

/// Finds particles that must give up their target vertex.
///
/// For every vertex claimed by several particles one claimant, chosen
/// uniformly at random, keeps it. All other claimants are returned.
pub fn check_unique_entrainments<R: Rng + ?Sized>(
    targets: &BTreeMap<ParticleId, HopTarget>,
    lattice: Lattice,
    rng: &mut R,
) -> Vec<ParticleId> {
    let mut groups: BTreeMap<i64, Vec<ParticleId>> = BTreeMap::new();
    for (&id, target) in targets {
        if let HopTarget::Vertex(x) = target {
            groups.entry(lattice.key(*x)).or_default().push(id);
        }
    }

    let mut redo = Vec::new();
    for (key, claimants) in groups.into_iter().filter(|(_, c)| c.len() > 1) {
        let Some(&stay) = claimants.choose(rng) else { continue };
        info!(
            "Non-unique entrainment: particles {:?} attempted to entrain at vertex {}. {} stays, others are forced to the next available vertex.",
            claimants,
            lattice.position(key),
            stay
        );
        redo.extend(claimants.into_iter().filter(|&id| id != stay));
    }
    redo
}

/// Unique target for every hop plus the number of repair rounds it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub targets: BTreeMap<ParticleId, HopTarget>,
    pub rounds: u32,
}

/// Maps each desired hop onto a vertex, repairing collisions until every
/// vertex has at most one claimant.
///
/// Each repair round removes every claimed vertex from the pool and re-maps
/// the displaced particles from their original desired positions.
pub fn resolve_targets<R: Rng + ?Sized>(
    hops: &[DesiredHop],
    available: &VertexCatalog,
    lattice: Lattice,
    max_rounds: u32,
    rng: &mut R,
) -> SimResult<Resolution> {
    let desired: HashMap<ParticleId, f64> = hops.iter().map(|h| (h.id, h.desired)).collect();
    let mut targets: BTreeMap<ParticleId, HopTarget> = hops
        .iter()
        .map(|h| (h.id, find_closest_vertex(h.desired, available.positions())))
        .collect();
    let mut pool = available.clone();
    let mut rounds = 0;

    loop {
        let redo = check_unique_entrainments(&targets, lattice, rng);
        if redo.is_empty() {
            return Ok(Resolution { targets, rounds });
        }
        if rounds == max_rounds {
            return Err(SimError::UnresolvedCollision { rounds, pending: redo.len() });
        }
        rounds += 1;

        let claimed: Vec<f64> = targets.values().filter_map(|t| t.vertex()).collect();
        pool = pool.without(lattice, &claimed);
        if pool.is_empty() {
            return Err(SimError::UnresolvedCollision { rounds, pending: redo.len() });
        }
        for id in redo {
            let target = find_closest_vertex(desired[&id], pool.positions());
            targets.insert(id, target);
        }
    }
}

/// Outcome of moving the entrained particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOutcome {
    pub displacements: Vec<Displacement>,
    pub exited: Vec<ParticleId>,
    pub collision_rounds: u32,
}

// A resolved hop, computed before anything is written back.
enum Landing {
    Exit,
    Rest(Placement),
}

/// Moves every entrained particle to its resolved vertex or out of the stream.
///
/// `lifted` holds the particles taken out of the pile this iteration; they
/// cannot support anything that lands now. Every landing is worked out
/// against the untouched table first, so an error leaves `table` unchanged.
pub fn move_model_particles<R: Rng + ?Sized>(
    table: &mut ParticleTable,
    hops: &[DesiredHop],
    available: &VertexCatalog,
    lifted: &HashSet<ParticleId>,
    layer_offset: f64,
    max_rounds: u32,
    rng: &mut R,
) -> SimResult<TransportOutcome> {
    let lattice = table.lattice;
    let resolution = resolve_targets(hops, available, lattice, max_rounds, rng)?;

    let mut planned = Vec::with_capacity(hops.len());
    for hop in hops {
        let Some(&target) = resolution.targets.get(&hop.id) else { continue };
        let Some(from) = table.get(hop.id).map(|p| p.hop_origin()) else { continue };
        let landing = match target {
            HopTarget::Exit => Landing::Exit,
            HopTarget::Vertex(vertex) => Landing::Rest(place_particle(table, hop.id, vertex, layer_offset, lifted)?),
        };
        planned.push((hop, from, landing));
    }

    let mut outcome = TransportOutcome {
        collision_rounds: resolution.rounds,
        ..Default::default()
    };

    for (hop, from, landing) in planned {
        let to = match landing {
            Landing::Exit => {
                if let Some(particle) = table.get_model_mut(hop.id) {
                    particle.x = EXIT_SENTINEL;
                    particle.loop_age += 1;
                }
                table.set_supports(hop.id, None);
                info!("Particle {} exceeded stream... sending to -1 axis.", hop.id);
                outcome.exited.push(hop.id);
                EXIT_SENTINEL
            }
            Landing::Rest(placement) => {
                if let Some(particle) = table.get_model_mut(hop.id) {
                    particle.x = placement.x;
                    particle.elevation = placement.elevation;
                }
                table.set_supports(hop.id, Some(placement.supports));
                debug!(
                    "Particle {} entrained from {} to {}. Desired placement was: {}",
                    hop.id, from, placement.x, hop.desired
                );
                placement.x
            }
        };

        outcome.displacements.push(Displacement { id: hop.id, from, to });
    }

    Ok(outcome)
}
