use parking_lot::RwLock;

use super::ratio;
use crate::Error;

/// Like `LinearStrategy` but squares the ratio, so it throttles gently just
/// above the lower threshold and catches up near the upper one.
#[derive(Debug)]
pub struct QuadraticStrategy {
    lower_threshold: u64,
    upper_threshold: u64,
    intensity: RwLock<f64>,
}

impl QuadraticStrategy {
    pub fn new(lower_threshold: u64, upper_threshold: u64) -> Result<Self, Error> {
        if upper_threshold <= lower_threshold {
            error!(
                message = "Invalid thresholds for quadratic strategy",
                lower_threshold,
                upper_threshold,
            );

            return Err(Error::InvalidThresholds {
                lower: lower_threshold,
                upper: upper_threshold,
            });
        }

        Ok(Self {
            lower_threshold,
            upper_threshold,
            intensity: RwLock::new(0.0),
        })
    }

    #[inline]
    pub const fn thresholds(&self) -> (u64, u64) {
        (self.lower_threshold, self.upper_threshold)
    }

    pub fn update(&self, pending_bytes: u64) -> f64 {
        let linear = ratio(self.lower_threshold, self.upper_threshold, pending_bytes);
        let intensity = linear * linear;

        *self.intensity.write() = intensity;
        intensity
    }

    pub fn reset(&self) {
        *self.intensity.write() = 0.0;
    }

    pub fn load(&self) -> f64 {
        *self.intensity.read()
    }
}
