use crate::error::{SimError, SimResult};

/// A fixed interval of the stream whose downstream boundary is monitored for flux.
#[derive(Debug, Clone, PartialEq)]
pub struct Subregion {
    name: String,
    left_boundary: f64,
    right_boundary: f64,
    flux: Vec<u32>, // One counter per iteration
}

impl Subregion {
    pub fn new(name: impl Into<String>, left_boundary: f64, right_boundary: f64, iterations: u32) -> Self {
        Subregion {
            name: name.into(),
            left_boundary,
            right_boundary,
            flux: vec![0; iterations as usize],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn left_boundary(&self) -> f64 {
        self.left_boundary
    }

    pub fn right_boundary(&self) -> f64 {
        self.right_boundary
    }

    /// True if `x` lies in `[left, right)`.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.left_boundary && x < self.right_boundary
    }

    pub fn increment_flux(&mut self, iteration: u32) {
        if let Some(count) = self.flux.get_mut(iteration as usize) {
            *count += 1;
        } else {
            log::warn!(
                "Flux increment for iteration {} ignored: {} only tracks {} iterations.",
                iteration,
                self.name,
                self.flux.len()
            );
        }
    }

    pub fn flux(&self) -> &[u32] {
        &self.flux
    }

    pub fn flux_at(&self, iteration: u32) -> u32 {
        self.flux.get(iteration as usize).copied().unwrap_or(0)
    }
}

/// Splits `[0, bed_length]` into `num_subregions` equal subregions.
///
/// Fails if the count does not evenly divide the bed length.
pub fn define_subregions(bed_length: f64, num_subregions: u32, iterations: u32) -> SimResult<Vec<Subregion>> {
    if num_subregions == 0 {
        return Err(SimError::Config("at least one subregion is required".into()));
    }
    let n = num_subregions as f64;
    let remainder = bed_length % n;
    if remainder.abs() > 1e-9 && (n - remainder).abs() > 1e-9 {
        return Err(SimError::Config(format!(
            "number of subregions must divide the bed length: {} % {} != 0",
            bed_length, num_subregions
        )));
    }

    let subregion_length = bed_length / n;
    let mut left_boundary = 0.0;
    let mut subregions = Vec::with_capacity(num_subregions as usize);
    for region in 0..num_subregions {
        let right_boundary = if region + 1 == num_subregions {
            bed_length
        } else {
            left_boundary + subregion_length
        };
        subregions.push(Subregion::new(format!("subregion-{}", region), left_boundary, right_boundary, iterations));
        left_boundary = right_boundary;
    }
    Ok(subregions)
}

/// Index of the subregion containing `x`. The final subregion also owns its right edge.
pub fn subregion_index(subregions: &[Subregion], x: f64) -> Option<usize> {
    subregions.iter().position(|s| s.contains(x)).or_else(|| {
        subregions
            .last()
            .filter(|last| x == last.right_boundary())
            .map(|_| subregions.len() - 1)
    })
}
