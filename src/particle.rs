use bedload_common::{is_exit, Lattice};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a particle waiting outside the stream starts its next hop.
pub const RECYCLE_ORIGIN: f64 = 0.0;

/// Stable particle identifier. Bed particles use `-1, -2, ...`, model
/// particles use `0, 1, ...` and double as their index in the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleId(pub i64);

impl ParticleId {
    #[inline]
    pub fn is_bed(self) -> bool {
        self.0 < 0
    }

    /// Index into the model table, `None` for bed ids.
    #[inline]
    pub fn model_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Index into the bed table, `None` for model ids.
    #[inline]
    pub fn bed_index(self) -> Option<usize> {
        if self.is_bed() {
            usize::try_from(-self.0 - 1).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single grain, either part of the fixed bed or a mobile model particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Center position, or `EXIT_SENTINEL` while outside the stream.
    pub x: f64,
    pub diameter: f64,
    pub elevation: f64,
    pub id: ParticleId,
    /// False while another particle rests on this one. Always false for bed particles.
    pub active: bool,
    /// Iterations since the particle was last entrained.
    pub age: u32,
    /// Number of times the particle has left the downstream end.
    pub loop_age: u32,
}

impl Particle {
    pub fn bed(id: ParticleId, x: f64, diameter: f64) -> Self {
        Particle { x, diameter, elevation: 0.0, id, active: false, age: 0, loop_age: 0 }
    }

    pub fn model(id: ParticleId, x: f64, elevation: f64, diameter: f64) -> Self {
        Particle { x, diameter, elevation, id, active: true, age: 0, loop_age: 0 }
    }

    #[inline]
    pub fn in_stream(&self) -> bool {
        !is_exit(self.x)
    }

    /// Position the next hop is measured from.
    #[inline]
    pub fn hop_origin(&self) -> f64 {
        if self.in_stream() {
            self.x
        } else {
            RECYCLE_ORIGIN
        }
    }
}

/// The two particles a model particle rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportPair {
    pub left: ParticleId,
    pub right: ParticleId,
}

impl SupportPair {
    #[inline]
    pub fn contains(&self, id: ParticleId) -> bool {
        self.left == id || self.right == id
    }
}

/// Owns every particle of a run together with the model particles' supports.
///
/// The simulation driver holds the only instance and lends it out by `&mut`
/// to whichever component is mutating it.
#[derive(Debug, Clone)]
pub struct ParticleTable {
    pub lattice: Lattice,
    bed: Vec<Particle>,
    model: Vec<Particle>,
    // Indexed like `model`; `None` while the particle is outside the stream.
    supports: Vec<Option<SupportPair>>,
}

impl ParticleTable {
    /// Creates a table holding only the bed.
    pub fn new(lattice: Lattice, bed: Vec<Particle>) -> Self {
        Self { lattice, bed, model: Vec::new(), supports: Vec::new() }
    }

    /// Appends a model particle. Its id must equal the next model index.
    pub fn push_model(&mut self, particle: Particle, supports: Option<SupportPair>) -> ParticleId {
        debug_assert_eq!(particle.id.model_index(), Some(self.model.len()));
        let id = particle.id;
        self.model.push(particle);
        self.supports.push(supports);
        id
    }

    /// Id the next pushed model particle must carry.
    pub fn next_model_id(&self) -> ParticleId {
        ParticleId(self.model.len() as i64)
    }

    pub fn bed(&self) -> &[Particle] {
        &self.bed
    }

    pub fn model(&self) -> &[Particle] {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut [Particle] {
        &mut self.model
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        match id.bed_index() {
            Some(idx) => self.bed.get(idx),
            None => id.model_index().and_then(|idx| self.model.get(idx)),
        }
    }

    /// Mutable access to a model particle. Bed particles are immutable.
    pub fn get_model_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        id.model_index().and_then(move |idx| self.model.get_mut(idx))
    }

    pub fn supports(&self) -> &[Option<SupportPair>] {
        &self.supports
    }

    pub fn supports_of(&self, id: ParticleId) -> Option<SupportPair> {
        id.model_index().and_then(|idx| self.supports.get(idx).copied().flatten())
    }

    pub fn set_supports(&mut self, id: ParticleId, supports: Option<SupportPair>) {
        if let Some(slot) = id.model_index().and_then(|idx| self.supports.get_mut(idx)) {
            *slot = supports;
        }
    }

    /// Bed particles followed by the model particles currently in the stream.
    pub fn in_stream(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.bed.iter().chain(self.model.iter().filter(|p| p.in_stream()))
    }

    pub fn model_count(&self) -> usize {
        self.model.len()
    }

    pub fn out_of_stream_ids(&self) -> Vec<ParticleId> {
        self.model.iter().filter(|p| !p.in_stream()).map(|p| p.id).collect()
    }

    /// Right edge of the bed.
    pub fn extent(&self) -> f64 {
        self.bed.len() as f64 * self.lattice.diameter
    }
}
