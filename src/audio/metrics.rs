//! Loudness aggregation
//!
//! Running min/max/mean over the per-cycle loudness, kept between explicit
//! resets so a host can poll on its own schedule.

/// Aggregated loudness statistics in dB.
#[derive(Debug, Clone, Copy)]
pub struct LoudnessMetrics {
    count: u32,
    sum: f32,
    min: f32,
    max: f32,
    current: f32,
}

impl Default for LoudnessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LoudnessMetrics {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f32::INFINITY,
            max: 0.0,
            current: 0.0,
        }
    }

    /// Fold one cycle's loudness into the running statistics.
    ///
    /// The minimum only tracks strictly positive readings, so silence floors
    /// and sub-zero dB cycles never pin it for the whole polling interval.
    pub fn record(&mut self, loudness_db: f32) {
        self.count += 1;
        self.sum += loudness_db;
        self.current = loudness_db;
        if loudness_db > self.max {
            self.max = loudness_db;
        }
        if loudness_db > 0.0 && loudness_db < self.min {
            self.min = loudness_db;
        }
    }

    /// Start a fresh aggregation interval.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean loudness over the interval, or `None` before the first cycle.
    pub fn average(&self) -> Option<f32> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f32)
        }
    }

    /// Quietest positive reading, or `None` if none was recorded.
    pub fn min(&self) -> Option<f32> {
        if self.min.is_finite() {
            Some(self.min)
        } else {
            None
        }
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Most recent cycle's loudness.
    pub fn current(&self) -> f32 {
        self.current
    }
}
