use crate::particle::{ParticleId, ParticleTable};
use bedload_common::{elevation_key, Lattice};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The lattice positions a grain could currently come to rest on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexCatalog {
    keys: BTreeSet<i64>,
    positions: Vec<f64>, // Ascending, mirrors `keys`
    layer_count: usize,
}

impl VertexCatalog {
    /// Sweeps the pile from the top layer down to the bed.
    ///
    /// Each layer nulls the columns its particles occupy and offers the
    /// vertices formed by two neighbouring particles of the same layer. Once
    /// the pile holds `level_limit` model layers the top layer offers nothing.
    /// Particles in `lifted` are treated as already removed from the pile.
    pub fn compute(table: &ParticleTable, level_limit: u32, lifted: Option<&HashSet<ParticleId>>) -> Self {
        let lattice = table.lattice;

        let mut layers: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for particle in table.in_stream() {
            if lifted.is_some_and(|l| l.contains(&particle.id)) {
                continue;
            }
            layers
                .entry(elevation_key(particle.elevation))
                .or_default()
                .push(lattice.key(particle.x));
        }

        let layer_count = layers.len();
        let capped = layer_count >= level_limit as usize + 1;
        let mut nulled: HashSet<i64> = HashSet::new();
        let mut keys = BTreeSet::new();

        for (depth, (elevation, columns)) in layers.iter().rev().enumerate() {
            nulled.extend(columns.iter().copied());

            let right_contacts: HashSet<i64> = columns.iter().map(|&k| Lattice::right_of(k)).collect();
            let shared = columns
                .iter()
                .map(|&k| Lattice::left_of(k))
                .filter(|k| right_contacts.contains(k));

            if depth == 0 && capped {
                nulled.extend(shared);
                trace!("Layer {} is at the level limit; its vertices are closed.", elevation);
                continue;
            }
            for vertex in shared {
                if !nulled.contains(&vertex) {
                    keys.insert(vertex);
                }
            }
        }

        Self::from_keys(lattice, keys, layer_count)
    }

    fn from_keys(lattice: Lattice, keys: BTreeSet<i64>, layer_count: usize) -> Self {
        let positions = keys.iter().map(|&k| lattice.position(k)).collect();
        VertexCatalog { keys, positions, layer_count }
    }

    /// Builds a catalog straight from vertex positions.
    pub fn from_positions(lattice: Lattice, positions: &[f64]) -> Self {
        let keys = positions.iter().map(|&x| lattice.key(x)).collect();
        Self::from_keys(lattice, keys, 0)
    }

    /// A copy with the given vertices removed.
    pub fn without(&self, lattice: Lattice, claimed: &[f64]) -> Self {
        let claimed: HashSet<i64> = claimed.iter().map(|&x| lattice.key(x)).collect();
        let keys = self.keys.iter().copied().filter(|k| !claimed.contains(k)).collect();
        Self::from_keys(lattice, keys, self.layer_count)
    }

    /// Ascending vertex positions.
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn contains(&self, lattice: Lattice, x: f64) -> bool {
        self.keys.contains(&lattice.key(x))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Distinct elevations (bed included) seen when the catalog was computed.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }
}
