//! Spectral analysis
//!
//! One cycle runs windowing, an in-place FFT, power-spectrum conversion,
//! octave-band aggregation, and A-weighted loudness over a filled
//! [`SampleBuffer`]. The flat-top window is fixed: it minimizes amplitude
//! measurement error, which matters more for loudness estimation than
//! frequency resolution does.

use std::sync::Arc;

use log::trace;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::{SampleBuffer, SpectralFrame, A_WEIGHTING, DB_FLOOR, OCTAVES};

pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    /// Plan the transform and precompute the window for a fixed frame size.
    /// Nothing is allocated per cycle after this.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window: flat_top_window(size),
            scratch,
        }
    }

    /// Analyze one filled buffer in place and produce the cycle's frame.
    /// The buffer contents are consumed: after this call they hold the power
    /// spectrum, and the caller is expected to `clear()` before reuse.
    pub fn analyze(&mut self, buffer: &mut SampleBuffer, scale: f32) -> SpectralFrame {
        let bins = buffer.bins_mut();

        for (bin, w) in bins.iter_mut().zip(&self.window) {
            bin.re *= w;
        }

        self.fft.process_with_scratch(bins, &mut self.scratch);

        // Peak search uses the magnitude spectrum, so it has to happen before
        // the in-place energy conversion overwrites the complex bins.
        let peak_bin = dominant_bin(bins);
        convert_energy(bins);

        let mut octaves = [0.0f32; OCTAVES];
        sum_octaves(bins, &mut octaves);
        let loudness_db = calculate_loudness(&mut octaves, scale);

        trace!("cycle: loudness {:.2} dB, peak bin {}", loudness_db, peak_bin);

        SpectralFrame {
            octaves,
            loudness_db,
            peak_bin,
        }
    }
}

/// Flat-top window coefficients for a frame of `size` samples.
fn flat_top_window(size: usize) -> Vec<f32> {
    let denom = (size - 1) as f32;
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / denom;
            0.281_063_9 - 0.520_897_2 * phase.cos() + 0.198_039_9 * (2.0 * phase).cos()
        })
        .collect()
}

/// Index of the bin with the largest spectral magnitude, searched over the
/// lower half of the spectrum with DC excluded.
fn dominant_bin(bins: &[Complex<f32>]) -> usize {
    let half = bins.len() / 2;
    let mut peak = 0usize;
    let mut peak_energy = 0.0f32;
    for (i, bin) in bins.iter().enumerate().take(half).skip(1) {
        let energy = bin.norm_sqr();
        if energy > peak_energy {
            peak_energy = energy;
            peak = i;
        }
    }
    peak
}

/// Replace every bin with its energy: `re = re² + im²`, `im = 0`.
fn convert_energy(bins: &mut [Complex<f32>]) {
    for bin in bins.iter_mut() {
        *bin = Complex::new(bin.norm_sqr(), 0.0);
    }
}

/// Sum per-bin energies into octave bands of doubling width, starting at
/// bin 1 (DC always skipped). Bands never read past the magnitude half of
/// the spectrum.
fn sum_octaves(bins: &[Complex<f32>], octaves: &mut [f32; OCTAVES]) {
    let half = bins.len() / 2;
    let mut bin = 1usize;
    let mut width = 1usize;
    for octave in octaves.iter_mut() {
        let mut sum = 0.0f32;
        for _ in 0..width {
            if bin >= half {
                break;
            }
            sum += bins[bin].re;
            bin += 1;
        }
        *octave = sum;
        width *= 2;
    }
}

/// Convert each octave's energy to dB in place and return the A-weighted
/// total loudness in dB. `scale` is applied to every octave before weighting.
fn calculate_loudness(octaves: &mut [f32; OCTAVES], scale: f32) -> f32 {
    let mut total = 0.0f32;
    for (energy, weight) in octaves.iter_mut().zip(A_WEIGHTING) {
        let scaled = scale * *energy;
        total += scaled * 10.0f32.powf(weight / 10.0);
        *energy = decibel(scaled);
    }
    decibel(total)
}

/// `10 * log10(v)`, with a fixed floor for non-positive input so silence
/// stays a well-defined number on the publish surface.
pub fn decibel(v: f32) -> f32 {
    if v > 0.0 {
        10.0 * v.log10()
    } else {
        DB_FLOOR
    }
}
