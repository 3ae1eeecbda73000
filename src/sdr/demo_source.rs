//! Synthetic sample source for running without RTL-SDR hardware.
//!
//! Generates a complex tone at a fixed baseband offset on top of a small
//! pseudo-noise floor. Gain scales the tone amplitude so the gain slider
//! visibly moves the peak, and the configure semantics match the hardware
//! source, which also makes them testable without a dongle.

use super::{SampleSource, SourceError};
use crate::config::{CENTER_FREQ_BOUNDS, CENTER_FREQ_INIT_HZ, GAIN_BOUNDS, GAIN_INIT_DB};
use num_complex::Complex;
use std::f64::consts::TAU;

/// Baseband offset of the synthetic tone.
pub const TONE_OFFSET_HZ: f64 = 300e3;

/// Demo sample source producing a deterministic tone plus noise floor.
#[derive(Debug)]
pub struct DemoSource {
    sample_rate_hz: f64,
    center_freq_hz: f64,
    gain_db: f64,
    /// Running sample index, so consecutive reads are phase-continuous.
    sample_index: u64,
    /// Linear congruential state for the noise floor.
    noise_state: u32,
}

impl DemoSource {
    pub fn new(sample_rate_hz: f64) -> Self {
        log::info!(
            "Demo source: {:.1} kHz tone at {:.1} MS/s",
            TONE_OFFSET_HZ / 1e3,
            sample_rate_hz / 1e6
        );
        Self {
            sample_rate_hz,
            center_freq_hz: CENTER_FREQ_INIT_HZ,
            gain_db: GAIN_INIT_DB,
            sample_index: 0,
            noise_state: 0x2545_f491,
        }
    }

    fn next_noise(&mut self) -> f32 {
        // Numerical Recipes LCG constants
        self.noise_state = self
            .noise_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        #[allow(
            clippy::cast_precision_loss,
            reason = "noise only needs a few bits of resolution"
        )]
        let unit = (self.noise_state >> 8) as f32 / 16_777_216.0; // top 24 bits -> [0, 1)
        (unit - 0.5) * 2e-3
    }
}

impl SampleSource for DemoSource {
    fn read(&mut self, count: usize) -> Result<Vec<Complex<f32>>, SourceError> {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            reason = "tone phase wraps long before the counts lose precision"
        )]
        let samples = (0..count)
            .map(|_| {
                let n = self.sample_index;
                self.sample_index += 1;

                // Reduce modulo one cycle in f64 before narrowing, so the
                // phase stays accurate over long runs.
                let cycles = TONE_OFFSET_HZ * n as f64 / self.sample_rate_hz;
                let phase = (TAU * cycles.fract()) as f32;
                let amplitude = 10.0f32.powf(self.gain_db as f32 / 20.0) * 0.01;
                let tone = Complex::new(phase.cos(), phase.sin()) * amplitude;
                let noise = Complex::new(self.next_noise(), self.next_noise());
                tone + noise
            })
            .collect();
        Ok(samples)
    }

    fn set_center_freq(&mut self, freq_hz: f64) -> Result<(), SourceError> {
        self.center_freq_hz = CENTER_FREQ_BOUNDS.clamp(freq_hz);
        Ok(())
    }

    fn set_gain(&mut self, gain_db: f64) -> Result<(), SourceError> {
        self.gain_db = GAIN_BOUNDS.clamp(gain_db);
        Ok(())
    }

    fn center_freq_hz(&self) -> f64 {
        self.center_freq_hz
    }

    fn gain_db(&self) -> f64 {
        self.gain_db
    }

    fn close(&mut self) {
        // Nothing to release
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FFT_SIZE, SAMPLE_RATE_HZ};
    use crate::spectrum::SpectrumEstimator;

    #[test]
    fn read_returns_the_requested_count() {
        let mut source = DemoSource::new(SAMPLE_RATE_HZ);
        assert_eq!(source.read(4096).unwrap().len(), 4096);
        assert_eq!(source.read(100).unwrap().len(), 100);
    }

    #[test]
    fn out_of_range_configuration_is_clamped() {
        let mut source = DemoSource::new(SAMPLE_RATE_HZ);

        source.set_center_freq(5.0e6).unwrap();
        assert_eq!(source.center_freq_hz(), CENTER_FREQ_BOUNDS.min);
        source.set_center_freq(9.9e9).unwrap();
        assert_eq!(source.center_freq_hz(), CENTER_FREQ_BOUNDS.max);

        source.set_gain(-10.0).unwrap();
        assert_eq!(source.gain_db(), GAIN_BOUNDS.min);
        source.set_gain(200.0).unwrap();
        assert_eq!(source.gain_db(), GAIN_BOUNDS.max);
    }

    #[test]
    fn in_range_configuration_sticks() {
        let mut source = DemoSource::new(SAMPLE_RATE_HZ);
        source.set_center_freq(433.92e6).unwrap();
        source.set_gain(30.0).unwrap();
        assert_eq!(source.center_freq_hz(), 433.92e6);
        assert_eq!(source.gain_db(), 30.0);
    }

    #[test]
    fn tone_shows_up_at_its_baseband_offset() {
        let mut source = DemoSource::new(SAMPLE_RATE_HZ);
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);

        let samples = source.read(FFT_SIZE).unwrap();
        let spectrum = est.compute(&samples);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        let bin_hz = SAMPLE_RATE_HZ / FFT_SIZE as f64;
        #[allow(clippy::cast_sign_loss, reason = "tone offset is positive")]
        let expected = (TONE_OFFSET_HZ / bin_hz).round() as usize + FFT_SIZE / 2;
        assert!(peak.abs_diff(expected) <= 1);
    }

    #[test]
    fn higher_gain_raises_the_tone_peak() {
        let est = SpectrumEstimator::new(FFT_SIZE, SAMPLE_RATE_HZ);

        let mut quiet = DemoSource::new(SAMPLE_RATE_HZ);
        quiet.set_gain(0.0).unwrap();
        let quiet_peak = est
            .compute(&quiet.read(FFT_SIZE).unwrap())
            .into_iter()
            .fold(f32::NEG_INFINITY, f32::max);

        let mut loud = DemoSource::new(SAMPLE_RATE_HZ);
        loud.set_gain(40.0).unwrap();
        let loud_peak = est
            .compute(&loud.read(FFT_SIZE).unwrap())
            .into_iter()
            .fold(f32::NEG_INFINITY, f32::max);

        assert!(loud_peak > quiet_peak + 30.0);
    }
}
