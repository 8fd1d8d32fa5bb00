use serde::{Deserialize, Serialize};

/// Position of a particle that has left the downstream end and awaits recycling.
pub const EXIT_SENTINEL: f64 = -1.0;

/// Integer view of the 1-D grain lattice.
///
/// Centers of equal grains only ever sit on multiples of half a diameter, and
/// elevations are stored with two decimals. Comparing keys instead of raw
/// floats makes "same column" and "same layer" exact.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    pub diameter: f64,
    pub half: f64,
}

impl Lattice {
    /// Creates a lattice for grains of the given diameter.
    pub fn new(diameter: f64) -> Self {
        Lattice { diameter, half: diameter / 2.0 }
    }

    /// Lattice column of an x-position, in half-diameter units.
    #[inline]
    pub fn key(&self, x: f64) -> i64 {
        (x / self.half).round() as i64
    }

    /// x-position of a lattice column.
    #[inline]
    pub fn position(&self, key: i64) -> f64 {
        key as f64 * self.half
    }

    /// Column of the left contact point for a grain centred on `key`.
    #[inline]
    pub fn left_of(key: i64) -> i64 {
        key - 1
    }

    /// Column of the right contact point for a grain centred on `key`.
    #[inline]
    pub fn right_of(key: i64) -> i64 {
        key + 1
    }
}

/// Layer key of an elevation (hundredths).
#[inline]
pub fn elevation_key(elevation: f64) -> i64 {
    (elevation * 100.0).round() as i64
}

/// Rounds to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Returns true if the position marks a particle outside the stream.
#[inline]
pub fn is_exit(x: f64) -> bool {
    x < 0.0
}
