use crate::error::{SimError, SimResult};
use crate::particle::{ParticleId, ParticleTable};
use bedload_common::round_to;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};

/// Travel-distance distribution for entrained particles.
#[derive(Debug, Clone)]
pub enum HopDistribution {
    LogNormal(LogNormal<f64>),
    Normal(Normal<f64>),
}

impl HopDistribution {
    /// Log-normal by default, normal when `normal` is set.
    pub fn new(mu: f64, sigma: f64, normal: bool) -> SimResult<Self> {
        if normal {
            Normal::new(mu, sigma)
                .map(HopDistribution::Normal)
                .map_err(|e| SimError::HopDistribution(format!("normal({}, {}): {}", mu, sigma, e)))
        } else {
            LogNormal::new(mu, sigma)
                .map(HopDistribution::LogNormal)
                .map_err(|e| SimError::HopDistribution(format!("log-normal({}, {}): {}", mu, sigma, e)))
        }
    }

    /// Draws one hop length, rounded to one decimal.
    pub fn sample_hop<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let raw = match self {
            HopDistribution::LogNormal(d) => d.sample(rng),
            HopDistribution::Normal(d) => d.sample(rng),
        };
        round_to(raw, 1)
    }
}

/// Where an entrained particle would like to land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesiredHop {
    pub id: ParticleId,
    pub desired: f64,
}

/// Adds a sampled hop to each selected particle's hop origin.
///
/// The particle table is left untouched.
pub fn compute_hops<R: Rng + ?Sized>(
    selected: &[ParticleId],
    table: &ParticleTable,
    distribution: &HopDistribution,
    rng: &mut R,
) -> Vec<DesiredHop> {
    selected
        .iter()
        .filter_map(|&id| table.get(id).map(|p| (id, p.hop_origin())))
        .map(|(id, x)| DesiredHop { id, desired: x + distribution.sample_hop(rng) })
        .collect()
}
