//! Debounced frequency matching
//!
//! A single loud transient at the right frequency must not count as a
//! detection. Each target keeps a 32-cycle rolling history of hit/miss bits
//! and reports detected only while enough recent cycles landed in its window.

use log::debug;

use crate::config::{DetectorConfig, MatchMode, TargetConfig};

/// Hits required inside the 32-cycle history for a target to read detected.
pub const MIN_MATCHES: u32 = 15;

/// One watched frequency, resolved to an FFT bin and debounced over time.
pub struct SoundTarget {
    label: String,
    bin: usize,
    mode: MatchMode,
    history: u32,
    detected: bool,
}

impl SoundTarget {
    pub fn new(label: impl Into<String>, bin: usize, mode: MatchMode) -> Self {
        Self {
            label: label.into(),
            bin,
            mode,
            history: 0,
            detected: false,
        }
    }

    /// Resolve a configured frequency to its bin for the given setup.
    pub fn from_config(target: &TargetConfig, config: &DetectorConfig) -> Self {
        Self::new(
            target.label.clone(),
            config.frequency_to_bin(target.frequency_hz),
            target.mode,
        )
    }

    /// Whether a peak at `peak_bin` counts as a hit for this target.
    ///
    /// The window always spans two bins so a tone sitting on a bin boundary
    /// still registers; wide mode adds one bin of slack on each side for
    /// sources that drift, such as mechanical chimes.
    pub fn matches(&self, peak_bin: usize) -> bool {
        let (low, high) = match self.mode {
            MatchMode::Narrow => (self.bin, self.bin + 1),
            MatchMode::Wide => (self.bin.saturating_sub(1), self.bin + 2),
        };
        (low..=high).contains(&peak_bin)
    }

    /// Record one cycle's peak and return the updated detection state.
    pub fn observe(&mut self, peak_bin: usize) -> bool {
        self.history <<= 1;
        if self.matches(peak_bin) {
            self.history |= 1;
        }

        let detected = self.history.count_ones() >= MIN_MATCHES;
        if detected != self.detected {
            if detected {
                debug!("target '{}' detected at bin {}", self.label, self.bin);
            } else {
                debug!("target '{}' no longer detected", self.label);
            }
            self.detected = detected;
        }
        detected
    }

    /// Drop all accumulated history, e.g. after the feed was interrupted.
    pub fn reset(&mut self) {
        self.history = 0;
        self.detected = false;
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Hits currently inside the rolling history.
    pub fn match_count(&self) -> u32 {
        self.history.count_ones()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bin(&self) -> usize {
        self.bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_target(bin: usize) -> SoundTarget {
        SoundTarget::new("test", bin, MatchMode::Wide)
    }

    // --- Match windows ---

    #[test]
    fn narrow_window_covers_two_bins() {
        let target = SoundTarget::new("test", 16, MatchMode::Narrow);
        assert!(!target.matches(15));
        assert!(target.matches(16));
        assert!(target.matches(17));
        assert!(!target.matches(18));
    }

    #[test]
    fn wide_window_covers_four_bins() {
        let target = wide_target(16);
        assert!(!target.matches(14));
        assert!(target.matches(15));
        assert!(target.matches(16));
        assert!(target.matches(17));
        assert!(target.matches(18));
        assert!(!target.matches(19));
    }

    #[test]
    fn wide_window_saturates_at_bin_zero() {
        let target = wide_target(0);
        assert!(target.matches(0));
        assert!(target.matches(2));
        assert!(!target.matches(3));
    }

    // --- Debounce ---

    #[test]
    fn single_hit_is_not_a_detection() {
        let mut target = wide_target(16);
        assert!(!target.observe(16));
        assert_eq!(target.match_count(), 1);
        assert!(!target.is_detected());
    }

    #[test]
    fn detection_requires_min_matches() {
        let mut target = wide_target(16);
        for _ in 0..MIN_MATCHES - 1 {
            assert!(!target.observe(16));
        }
        assert!(target.observe(16), "the {}th hit must detect", MIN_MATCHES);
        assert!(target.is_detected());
    }

    #[test]
    fn misses_do_not_accumulate() {
        let mut target = wide_target(16);
        for _ in 0..100 {
            assert!(!target.observe(500));
        }
        assert_eq!(target.match_count(), 0);
    }

    #[test]
    fn interleaved_hits_within_window_still_detect() {
        // Alternating hit/miss keeps 16 hits in the 32-bit history.
        let mut target = wide_target(16);
        let mut detected = false;
        for i in 0..32 {
            let peak = if i % 2 == 0 { 16 } else { 500 };
            detected = target.observe(peak);
        }
        assert!(detected);
    }

    #[test]
    fn detection_decays_as_hits_age_out() {
        let mut target = wide_target(16);
        for _ in 0..32 {
            target.observe(16);
        }
        assert!(target.is_detected());

        // Hits shift out one per cycle; 18 misses leave 14 in history.
        let mut detected = true;
        for _ in 0..18 {
            detected = target.observe(500);
        }
        assert!(!detected);
        assert_eq!(target.match_count(), 14);
    }

    #[test]
    fn reset_clears_history_and_state() {
        let mut target = wide_target(16);
        for _ in 0..32 {
            target.observe(16);
        }
        target.reset();

        assert!(!target.is_detected());
        assert_eq!(target.match_count(), 0);
    }

    // --- Config resolution ---

    #[test]
    fn from_config_resolves_frequency_to_bin() {
        let config = DetectorConfig::default();
        let target = SoundTarget::from_config(
            &TargetConfig {
                label: "doorbell".to_string(),
                frequency_hz: 689.0,
                mode: MatchMode::Wide,
            },
            &config,
        );
        assert_eq!(target.bin(), 16);
        assert_eq!(target.label(), "doorbell");
    }
}
