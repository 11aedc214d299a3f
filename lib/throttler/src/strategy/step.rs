use parking_lot::RwLock;

/// Binary throttling, fully on as soon as the backlog exceeds the threshold.
#[derive(Debug)]
pub struct StepStrategy {
    lower_threshold: u64,
    intensity: RwLock<f64>,
}

impl StepStrategy {
    pub fn new(lower_threshold: u64) -> Self {
        Self {
            lower_threshold,
            intensity: RwLock::new(0.0),
        }
    }

    #[inline]
    pub const fn lower_threshold(&self) -> u64 {
        self.lower_threshold
    }

    pub fn update(&self, pending_bytes: u64) -> f64 {
        let intensity = if pending_bytes > self.lower_threshold {
            1.0
        } else {
            0.0
        };

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
