//! Detector configuration
//!
//! A [`DetectorConfig`] is validated once at setup; an invalid configuration
//! means the detector refuses to arm rather than failing mid-stream.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default FFT buffer capacity (samples). Must be a power of two.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default sample rate assumed when the host does not report one.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// How a target's match window is widened around its configured bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match the target bin and its neighbors: `bin-1 ..= bin+2`.
    #[default]
    Wide,
    /// Match only the two logical bins: `bin` and `bin+1`.
    Narrow,
}

/// One frequency of interest to watch for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub label: String,
    pub frequency_hz: f32,
    #[serde(default)]
    pub mode: MatchMode,
}

/// Full configuration for an [`AudioDetector`](crate::audio::AudioDetector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// FFT buffer capacity in samples; must be a power of two.
    pub buffer_size: usize,
    /// Sample rate of the inbound feed, used to map frequencies to bins.
    pub sample_rate_hz: u32,
    /// Scale factor applied to octave energies before loudness weighting.
    pub loudness_scale: f32,
    /// Frequencies to detect.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            loudness_scale: 1.0,
            targets: Vec::new(),
        }
    }
}

impl DetectorConfig {
    /// Check every setup-time invariant. Runtime analysis cannot fail once
    /// this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 || !self.buffer_size.is_power_of_two() {
            return Err(ConfigError::BufferSizeNotPowerOfTwo(self.buffer_size));
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if !self.loudness_scale.is_finite() || self.loudness_scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.loudness_scale));
        }
        let nyquist = self.sample_rate_hz as f32 / 2.0;
        for target in &self.targets {
            if !(target.frequency_hz > 0.0) {
                return Err(ConfigError::NonPositiveFrequency {
                    label: target.label.clone(),
                    frequency_hz: target.frequency_hz,
                });
            }
            if target.frequency_hz >= nyquist {
                return Err(ConfigError::FrequencyAboveNyquist {
                    label: target.label.clone(),
                    frequency_hz: target.frequency_hz,
                    nyquist_hz: nyquist,
                });
            }
        }
        Ok(())
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate_hz as f32 / self.buffer_size as f32
    }

    /// Map a frequency of interest to its nearest FFT bin.
    pub fn frequency_to_bin(&self, frequency_hz: f32) -> usize {
        (frequency_hz / self.bin_width_hz()).round() as usize
    }

    /// Center frequency of an FFT bin.
    pub fn bin_to_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width_hz()
    }
}
