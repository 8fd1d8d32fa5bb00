use crate::error::{Side, SimError, SimResult};
use crate::particle::{ParticleId, ParticleTable, SupportPair};
use bedload_common::{elevation_key, round_to, Lattice};
use std::collections::HashSet;

/// Which particles may act as supports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// The particle is about to be set down: every in-stream particle qualifies.
    Placement,
    /// The particle is already resting at `elevation`: only lower particles qualify.
    Settled { elevation: f64 },
}

/// One supporting particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    pub id: ParticleId,
    pub elevation: f64,
}

/// The particles under a grain's left and right contact points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supports {
    pub left: Support,
    pub right: Support,
}

impl Supports {
    pub fn pair(&self) -> SupportPair {
        SupportPair { left: self.left.id, right: self.right.id }
    }
}

/// Result of setting a particle down at a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub elevation: f64,
    pub supports: SupportPair,
}

/// Finds the highest particle under each contact point of a grain centred at `x`.
///
/// `particle` is never its own support; `excluded` removes further
/// candidates (particles lifted out of the pile this iteration).
pub fn find_supports(
    table: &ParticleTable,
    particle: ParticleId,
    x: f64,
    mode: SearchMode,
    excluded: &HashSet<ParticleId>,
) -> SimResult<Supports> {
    let lattice = table.lattice;
    let center = lattice.key(x);
    let left_key = Lattice::left_of(center);
    let right_key = Lattice::right_of(center);
    let ceiling = match mode {
        SearchMode::Placement => None,
        SearchMode::Settled { elevation } => Some(elevation_key(elevation)),
    };

    let mut left: Option<Support> = None;
    let mut right: Option<Support> = None;

    for candidate in table.in_stream() {
        if candidate.id == particle || excluded.contains(&candidate.id) {
            continue;
        }
        if let Some(ceiling) = ceiling {
            if elevation_key(candidate.elevation) >= ceiling {
                continue;
            }
        }
        let slot = match lattice.key(candidate.x) {
            k if k == left_key => &mut left,
            k if k == right_key => &mut right,
            _ => continue,
        };
        // Highest candidate in the column wins
        if slot.map_or(true, |s| candidate.elevation > s.elevation) {
            *slot = Some(Support { id: candidate.id, elevation: candidate.elevation });
        }
    }

    let left = left.ok_or(SimError::SupportNotFound {
        particle,
        side: Side::Left,
        x: lattice.position(left_key),
    })?;
    let right = right.ok_or(SimError::SupportNotFound {
        particle,
        side: Side::Right,
        x: lattice.position(right_key),
    })?;

    Ok(Supports { left, right })
}

/// Sets a particle down at `x` and reports where it comes to rest.
///
/// The resting elevation is taken from the left support only.
pub fn place_particle(
    table: &ParticleTable,
    particle: ParticleId,
    x: f64,
    layer_offset: f64,
    excluded: &HashSet<ParticleId>,
) -> SimResult<Placement> {
    let supports = find_supports(table, particle, x, SearchMode::Placement, excluded)?;
    let lattice = table.lattice;
    Ok(Placement {
        x: lattice.position(lattice.key(x)),
        elevation: round_to(supports.left.elevation + layer_offset, 2),
        supports: supports.pair(),
    })
}
