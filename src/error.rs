//! Engine error type.
//!
//! Conditions the caller is expected to recover from (packing mismatch,
//! selection shortfall, stream exit) are logged, not returned.

use std::fmt;

use thiserror::Error;

use crate::particle::ParticleId;

/// Which contact point of a particle a support search was looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no {side} support found for particle {particle} (searched at x={x})")]
    SupportNotFound {
        particle: ParticleId,
        side: Side,
        x: f64,
    },

    #[error("unresolved collision after {rounds} rounds: {pending} particle(s) still contend for vertices")]
    UnresolvedCollision { rounds: u32, pending: usize },

    #[error("invalid hop distribution: {0}")]
    HopDistribution(String),
}

/// Shorthand result type for the engine.
pub type SimResult<T> = Result<T, SimError>;
