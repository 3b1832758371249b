pub mod analyzer;
pub mod buffer;
pub mod detector;
pub mod matcher;
pub mod metrics;

pub use analyzer::SpectralAnalyzer;
pub use buffer::SampleBuffer;
pub use detector::AudioDetector;
pub use matcher::SoundTarget;
pub use metrics::LoudnessMetrics;

/// Number of octave bands aggregated from the power spectrum.
pub const OCTAVES: usize = 9;

/// A-weighting curve in dB for the 31.5 Hz … 8000 Hz octave centers.
pub const A_WEIGHTING: [f32; OCTAVES] = [-39.4, -26.2, -16.1, -8.6, -3.2, 0.0, 1.2, 1.0, -1.1];

/// Sentinel decibel value substituted for `log10` of a non-positive energy,
/// so silence never publishes NaN or negative infinity.
pub const DB_FLOOR: f32 = -120.0;

/// Result of one analysis cycle. Created and consumed within the cycle;
/// nothing here is heap-allocated.
#[derive(Debug, Clone, Copy)]
pub struct SpectralFrame {
    /// Per-octave energy, converted to dB during loudness calculation.
    pub octaves: [f32; OCTAVES],
    /// A-weighted total loudness in dB.
    pub loudness_db: f32,
    /// Index of the FFT bin with the largest spectral magnitude (DC excluded).
    pub peak_bin: usize,
}

/// Outward publish surface. The host injects an implementation at detector
/// construction and receives one call per completed analysis cycle.
pub trait CycleSink {
    fn cycle_complete(&mut self, frame: &SpectralFrame, targets: &[SoundTarget]);
}

/// Sink for hosts that do not consume cycle results.
pub struct NullSink;

impl CycleSink for NullSink {
    fn cycle_complete(&mut self, _frame: &SpectralFrame, _targets: &[SoundTarget]) {}
}
