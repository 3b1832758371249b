use rustfft::num_complex::Complex;

/// Fixed attenuation applied to every incoming 16-bit sample.
const ATTENUATION: f32 = 10.0;

/// Fixed-capacity accumulator for incoming PCM blocks.
///
/// Backs the FFT with a single preallocated complex buffer (the real and
/// imaginary sequences of one analysis frame). Blocks that would overflow
/// the remaining capacity are dropped whole — silent data loss by design,
/// never a partial write.
pub struct SampleBuffer {
    bins: Vec<Complex<f32>>,
    len: usize,
}

impl SampleBuffer {
    /// `capacity` must already be validated as a power of two.
    pub fn new(capacity: usize) -> Self {
        Self {
            bins: vec![Complex::new(0.0, 0.0); capacity],
            len: 0,
        }
    }

    /// Append a block of samples, attenuated by 1/10. Returns `true` when the
    /// buffer has just filled and a frame is ready for analysis. A block that
    /// does not fit in the remaining capacity is discarded and the prior
    /// contents are left untouched.
    pub fn push(&mut self, samples: &[i16]) -> bool {
        if self.len + samples.len() > self.bins.len() {
            return false;
        }
        for &sample in samples {
            self.bins[self.len] = Complex::new(sample as f32 / ATTENUATION, 0.0);
            self.len += 1;
        }
        self.len == self.bins.len()
    }

    /// Reset the fill length for the next cycle. The storage itself is reused.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.bins.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.bins.len()
    }

    /// The full real/imaginary frame, for the analyzer's in-place transform.
    pub(crate) fn bins_mut(&mut self) -> &mut [Complex<f32>] {
        &mut self.bins
    }

    #[cfg(test)]
    pub(crate) fn bins(&self) -> &[Complex<f32>] {
        &self.bins
    }
}
