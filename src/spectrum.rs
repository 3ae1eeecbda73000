//! Windowed FFT power spectrum estimation.
//!
//! Turns one block of IQ samples into a dB power spectrum with the frequency
//! axis re-centered so DC sits in the middle of the plot.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Floor added to linear power before the dB conversion so an all-zero
/// block produces a finite value instead of negative infinity.
pub const DB_FLOOR_EPSILON: f32 = 1e-20;

/// FFT-based power spectrum estimator.
///
/// The window, FFT plan and frequency axis are computed once at startup and
/// shared by every capture tick. `compute` is a pure function of its input
/// block: same samples in, same spectrum out.
pub struct SpectrumEstimator {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    freq_axis_mhz: Vec<f32>,
    fft_size: usize,
}

impl std::fmt::Debug for SpectrumEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumEstimator")
            .field("fft_size", &self.fft_size)
            .finish_non_exhaustive()
    }
}

impl SpectrumEstimator {
    /// Create an estimator for blocks of `fft_size` samples at `sample_rate_hz`.
    #[allow(
        clippy::cast_precision_loss,
        reason = "FFT size and bin indices fit f32/f64 exactly at realistic sizes"
    )]
    pub fn new(fft_size: usize, sample_rate_hz: f64) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        // Hann window, symmetric form (N-1 denominator)
        let window: Vec<f32> = (0..fft_size)
            .map(|n| {
                let x = std::f32::consts::TAU * n as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - x.cos())
            })
            .collect();

        // Frequency axis after the circular shift: strictly increasing from
        // -sample_rate/2 up to +sample_rate/2 - one bin, DC at index N/2, in MHz.
        let bin_hz = sample_rate_hz / fft_size as f64;
        let half = fft_size / 2;
        let freq_axis_mhz: Vec<f32> = (0..fft_size)
            .map(|i| {
                #[allow(
                    clippy::cast_possible_wrap,
                    reason = "FFT sizes are far below isize::MAX"
                )]
                let offset = i as isize - half as isize;
                ((offset as f64 * bin_hz) / 1e6) as f32
            })
            .collect();

        Self {
            fft,
            window,
            freq_axis_mhz,
            fft_size,
        }
    }

    /// Frequency axis in MHz relative to the tuned center frequency.
    ///
    /// Index-aligned with every spectrum returned by [`Self::compute`].
    pub fn freq_axis_mhz(&self) -> &[f32] {
        &self.freq_axis_mhz
    }

    /// Configured FFT size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute the dB power spectrum of one sample block.
    ///
    /// The block is windowed, transformed, converted to `10*log10(|X|² + ε)`
    /// and circularly shifted so DC lands at the center index. The caller must
    /// pass exactly `fft_size` samples.
    pub fn compute(&self, block: &[Complex<f32>]) -> Vec<f32> {
        debug_assert_eq!(block.len(), self.fft_size);

        let mut buf: Vec<Complex<f32>> = block
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| sample * w)
            .collect();
        self.fft.process(&mut buf);

        // Shift while converting: output index i reads unshifted bin (i + N/2) % N,
        // which moves DC from bin 0 to the middle of the spectrum.
        let half = self.fft_size / 2;
        (0..self.fft_size)
            .map(|i| {
                let k = (i + half) % self.fft_size;
                let power = buf[k].norm_sqr();
                10.0 * (power + DB_FLOOR_EPSILON).log10()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const FFT_SIZE: usize = 2048;
    const SAMPLE_RATE_HZ: f64 = 2.4e6;

    fn tone_block(freq_hz: f32, amplitude: f32) -> Vec<Complex<f32>> {
        (0..FFT_SIZE)
            .map(|n| {
                let phase = TAU * freq_hz * n as f32 / SAMPLE_RATE_HZ as f32;
                Complex::new(phase.cos(), phase.sin()) * amplitude
            })
            .collect()
    }

    #[test]
    fn compute_is_deterministic() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);
        let block = tone_block(100e3, 0.5);

        let a = est.compute(&block);
        let b = est.compute(&block);
        assert_eq!(a, b);
    }

    #[test]
    fn spectrum_and_axis_have_fft_size_bins() {
        for size in [256, 1024, 2048] {
            let est = SpectrumEstimator::new(size, SAMPLE_RATE_HZ);
            let block = vec![Complex::new(0.1f32, -0.1); size];
            assert_eq!(est.freq_axis_mhz().len(), size);
            assert_eq!(est.compute(&block).len(), size);
        }
    }

    #[test]
    fn freq_axis_is_strictly_increasing_and_centered() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);
        let axis = est.freq_axis_mhz();

        for pair in axis.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        // DC bin sits at the center index, edges at ±sample_rate/2 within one bin
        assert_eq!(axis[FFT_SIZE / 2], 0.0);
        let bin_mhz = (SAMPLE_RATE_HZ / FFT_SIZE as f64 / 1e6) as f32;
        assert!((axis[0] + 1.2).abs() < bin_mhz);
        assert!((axis[FFT_SIZE - 1] - 1.2).abs() < bin_mhz);
    }

    #[test]
    fn zero_block_hits_the_db_floor_not_negative_infinity() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);
        let block = vec![Complex::new(0.0f32, 0.0); FFT_SIZE];

        let floor_db = 10.0 * DB_FLOOR_EPSILON.log10();
        for &db in &est.compute(&block) {
            assert!(db.is_finite());
            assert_eq!(db, floor_db);
        }
    }

    #[test]
    fn parseval_energy_matches_linear_power_sum() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);
        let block = tone_block(237e3, 0.8);

        // Energy of the windowed time-domain block
        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|n| {
                let x = TAU * n as f32 / (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - x.cos())
            })
            .collect();
        let time_energy: f64 = block
            .iter()
            .zip(&window)
            .map(|(s, &w)| f64::from((s * w).norm_sqr()))
            .sum();

        // Undo the dB conversion; rustfft is unnormalized so the bin powers
        // sum to N times the time-domain energy.
        let freq_energy: f64 = est
            .compute(&block)
            .iter()
            .map(|&db| f64::from(10.0f32.powf(db / 10.0)))
            .sum();

        let expected = time_energy * FFT_SIZE as f64;
        let rel_err = (freq_energy - expected).abs() / expected;
        assert!(rel_err < 1e-2, "relative error {rel_err}");
    }

    #[test]
    fn tone_peak_lands_in_the_expected_bin() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);
        let block = tone_block(300e3, 1.0);
        let spectrum = est.compute(&block);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        let bin_hz = SAMPLE_RATE_HZ / FFT_SIZE as f64;
        let expected = (300e3 / bin_hz).round() as usize + FFT_SIZE / 2;
        assert!(
            peak.abs_diff(expected) <= 1,
            "peak at bin {peak}, expected {expected}"
        );
    }
}
