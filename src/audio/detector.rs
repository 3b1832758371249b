//! Detection pipeline
//!
//! [`AudioDetector`] ties the pieces together: samples stream in through
//! [`push_samples`](AudioDetector::push_samples), and every time the buffer
//! fills, one analysis cycle runs synchronously on the caller's thread and
//! the injected [`CycleSink`] is notified. The caller owns all locking; the
//! detector itself holds no synchronization.

use log::info;

use super::{CycleSink, LoudnessMetrics, SampleBuffer, SoundTarget, SpectralAnalyzer};
use crate::config::DetectorConfig;
use crate::error::ConfigError;

pub struct AudioDetector<S: CycleSink> {
    buffer: SampleBuffer,
    analyzer: SpectralAnalyzer,
    targets: Vec<SoundTarget>,
    metrics: LoudnessMetrics,
    scale: f32,
    sink: S,
}

impl<S: CycleSink> AudioDetector<S> {
    /// Validate the configuration and arm the detector. All allocation
    /// happens here; the streaming path never allocates.
    pub fn new(config: &DetectorConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let targets: Vec<SoundTarget> = config
            .targets
            .iter()
            .map(|t| SoundTarget::from_config(t, config))
            .collect();

        info!(
            "detector armed: {} samples @ {} Hz ({:.2} Hz/bin), {} target(s)",
            config.buffer_size,
            config.sample_rate_hz,
            config.bin_width_hz(),
            targets.len()
        );
        for target in &targets {
            info!(
                "  watching '{}' around bin {} ({:.0} Hz)",
                target.label(),
                target.bin(),
                config.bin_to_frequency(target.bin())
            );
        }

        Ok(Self {
            buffer: SampleBuffer::new(config.buffer_size),
            analyzer: SpectralAnalyzer::new(config.buffer_size),
            targets,
            metrics: LoudnessMetrics::new(),
            scale: config.loudness_scale,
            sink,
        })
    }

    /// Feed one block of PCM samples. Returns `true` when the block completed
    /// a frame and an analysis cycle ran.
    pub fn push_samples(&mut self, samples: &[i16]) -> bool {
        if !self.buffer.push(samples) {
            return false;
        }
        self.run_cycle();
        true
    }

    fn run_cycle(&mut self) {
        let frame = self.analyzer.analyze(&mut self.buffer, self.scale);
        self.buffer.clear();

        self.metrics.record(frame.loudness_db);
        for target in &mut self.targets {
            target.observe(frame.peak_bin);
        }

        self.sink.cycle_complete(&frame, &self.targets);
    }

    pub fn metrics(&self) -> &LoudnessMetrics {
        &self.metrics
    }

    /// Start a fresh loudness aggregation interval. Target histories are
    /// unaffected.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    pub fn targets(&self) -> &[SoundTarget] {
        &self.targets
    }

    /// Detection state of a target by label, or `None` for an unknown label.
    pub fn is_detected(&self, label: &str) -> Option<bool> {
        self.targets
            .iter()
            .find(|t| t.label() == label)
            .map(|t| t.is_detected())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::matcher::MIN_MATCHES;
    use crate::audio::SpectralFrame;
    use crate::config::{MatchMode, TargetConfig};

    /// Sink that remembers everything it was handed.
    #[derive(Default)]
    struct RecordingSink {
        cycles: usize,
        last_frame: Option<SpectralFrame>,
        detections: Vec<String>,
    }

    impl CycleSink for RecordingSink {
        fn cycle_complete(&mut self, frame: &SpectralFrame, targets: &[SoundTarget]) {
            self.cycles += 1;
            self.last_frame = Some(*frame);
            self.detections = targets
                .iter()
                .filter(|t| t.is_detected())
                .map(|t| t.label().to_string())
                .collect();
        }
    }

    fn small_config() -> DetectorConfig {
        DetectorConfig {
            buffer_size: 256,
            ..DetectorConfig::default()
        }
    }

    fn sine_frame(size: usize, bin: usize) -> Vec<i16> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / size as f32;
                (phase.sin() * 8_000.0) as i16
            })
            .collect()
    }

    // --- Construction ---

    #[test]
    fn invalid_config_is_rejected() {
        let config = DetectorConfig {
            buffer_size: 1000,
            ..DetectorConfig::default()
        };
        assert!(AudioDetector::new(&config, RecordingSink::default()).is_err());
    }

    #[test]
    fn fresh_detector_has_clean_metrics() {
        let detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        assert_eq!(detector.metrics().count(), 0);
    }

    // --- Cycle triggering ---

    #[test]
    fn partial_frame_runs_no_cycle() {
        let mut detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        assert!(!detector.push_samples(&[0i16; 100]));
        assert_eq!(detector.sink().cycles, 0);
        assert_eq!(detector.metrics().count(), 0);
    }

    #[test]
    fn completing_a_frame_runs_exactly_one_cycle() {
        let mut detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        assert!(!detector.push_samples(&[0i16; 128]));
        assert!(detector.push_samples(&[0i16; 128]));

        assert_eq!(detector.sink().cycles, 1);
        assert_eq!(detector.metrics().count(), 1);
    }

    #[test]
    fn buffer_is_reused_across_cycles() {
        let mut detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        for _ in 0..3 {
            assert!(detector.push_samples(&sine_frame(256, 16)));
        }
        assert_eq!(detector.sink().cycles, 3);
        assert_eq!(detector.sink().last_frame.unwrap().peak_bin, 16);
    }

    #[test]
    fn oversized_block_is_dropped_without_a_cycle() {
        let mut detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        detector.push_samples(&[0i16; 200]);
        assert!(!detector.push_samples(&[0i16; 100]));

        assert_eq!(detector.sink().cycles, 0);
        // the next fitting block still completes the frame
        assert!(detector.push_samples(&[0i16; 56]));
    }

    // --- Detection ---

    #[test]
    fn sustained_tone_detects_its_target() {
        let mut config = small_config();
        config.targets.push(TargetConfig {
            label: "tone".to_string(),
            frequency_hz: config.bin_to_frequency(16),
            mode: MatchMode::Wide,
        });
        let mut detector = AudioDetector::new(&config, RecordingSink::default()).unwrap();

        let frame = sine_frame(256, 16);
        for _ in 0..MIN_MATCHES {
            detector.push_samples(&frame);
        }

        assert_eq!(detector.is_detected("tone"), Some(true));
        assert_eq!(detector.sink().detections, vec!["tone".to_string()]);
    }

    #[test]
    fn tone_at_other_frequency_does_not_detect() {
        let mut config = small_config();
        config.targets.push(TargetConfig {
            label: "tone".to_string(),
            frequency_hz: config.bin_to_frequency(16),
            mode: MatchMode::Narrow,
        });
        let mut detector = AudioDetector::new(&config, RecordingSink::default()).unwrap();

        let frame = sine_frame(256, 40);
        for _ in 0..MIN_MATCHES * 2 {
            detector.push_samples(&frame);
        }

        assert_eq!(detector.is_detected("tone"), Some(false));
        assert!(detector.sink().detections.is_empty());
    }

    #[test]
    fn unknown_label_reports_none() {
        let detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        assert_eq!(detector.is_detected("missing"), None);
    }

    // --- Metrics over cycles ---

    #[test]
    fn metrics_accumulate_and_reset() {
        let mut detector = AudioDetector::new(&small_config(), RecordingSink::default()).unwrap();
        let frame = sine_frame(256, 16);
        detector.push_samples(&frame);
        detector.push_samples(&frame);

        assert_eq!(detector.metrics().count(), 2);
        assert!(detector.metrics().max() > 0.0);

        detector.reset_metrics();
        assert_eq!(detector.metrics().count(), 0);
        assert_eq!(detector.metrics().max(), 0.0);
    }
}
