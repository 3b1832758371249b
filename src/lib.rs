//! Soundsense — streaming microphone loudness and frequency detection
//!
//! Turns raw PCM sample blocks into an A-weighted loudness estimate and
//! per-target frequency detection flags, using a fixed-size FFT pipeline
//! suitable for embedded hosts: no allocation on the data path, one analysis
//! cycle per filled buffer.
//!
//! ## Quick start
//!
//! ```no_run
//! use soundsense::audio::{AudioDetector, CycleSink, SoundTarget, SpectralFrame};
//! use soundsense::config::DetectorConfig;
//!
//! struct PrintSink;
//! impl CycleSink for PrintSink {
//!     fn cycle_complete(&mut self, frame: &SpectralFrame, targets: &[SoundTarget]) {
//!         println!("{:.1} dB, peak bin {}", frame.loudness_db, frame.peak_bin);
//!         for t in targets.iter().filter(|t| t.is_detected()) {
//!             println!("detected: {}", t.label());
//!         }
//!     }
//! }
//!
//! let config = DetectorConfig::default();
//! let mut detector = AudioDetector::new(&config, PrintSink).unwrap();
//! detector.push_samples(&[0i16; 256]);
//! ```

pub mod audio;
pub mod config;
pub mod error;
