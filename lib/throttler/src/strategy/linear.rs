use parking_lot::RwLock;

use super::ratio;
use crate::Error;

/// Intensity grows linearly from 0 at the lower threshold to 1 at the upper
/// threshold.
#[derive(Debug)]
pub struct LinearStrategy {
    lower_threshold: u64,
    upper_threshold: u64,
    intensity: RwLock<f64>,
}

impl LinearStrategy {
    pub fn new(lower_threshold: u64, upper_threshold: u64) -> Result<Self, Error> {
        if upper_threshold <= lower_threshold {
            error!(
                message = "Invalid thresholds for linear strategy",
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
        let intensity = ratio(self.lower_threshold, self.upper_threshold, pending_bytes);

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
