//! Startup constants for the spectrum viewer.
//!
//! Everything tunable lives here: sample rate, FFT size, slider bounds and
//! the capture tick period. There are no command-line arguments and nothing
//! is persisted; the demo is reconfigured by editing these constants.

use std::time::Duration;

/// IQ sample rate in Hz (2.4 MS/s, a reliable rate for RTL-SDR dongles).
pub const SAMPLE_RATE_HZ: f64 = 2.4e6;

/// FFT length; each capture tick transforms exactly this many samples.
pub const FFT_SIZE: usize = 2048;

/// Capture ticks are scheduled this far apart.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Each tick reads `READ_FACTOR * FFT_SIZE` samples and keeps the newest
/// `FFT_SIZE`. The discarded older samples absorb tuner settling artifacts
/// after a frequency or gain change; the factor is a margin, not a precise
/// requirement.
pub const READ_FACTOR: usize = 2;

/// Center frequency slider range (typical RTL-SDR tuning range).
pub const CENTER_FREQ_BOUNDS: TunerBounds = TunerBounds {
    min: 50.0e6,
    max: 1700.0e6,
};

/// Initial center frequency in Hz (FM broadcast band, always has signals).
pub const CENTER_FREQ_INIT_HZ: f64 = 100.0e6;

/// Tuner gain slider range in dB.
pub const GAIN_BOUNDS: TunerBounds = TunerBounds {
    min: 0.0,
    max: 50.0,
};

/// Initial tuner gain in dB.
pub const GAIN_INIT_DB: f64 = 20.0;

/// Fixed dB range of the spectrum plot's y axis.
pub const PLOT_DB_RANGE: (f64, f64) = (-60.0, 60.0);

/// Inclusive [min, max] range for one tuner control.
///
/// Out-of-range requests are clamped rather than rejected, so a slider value
/// and the value applied to the hardware never disagree.
#[derive(Debug, Clone, Copy)]
pub struct TunerBounds {
    pub min: f64,
    pub max: f64,
}

impl TunerBounds {
    /// Clamp `value` into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limits_out_of_range_values() {
        assert_eq!(CENTER_FREQ_BOUNDS.clamp(10.0e6), 50.0e6);
        assert_eq!(CENTER_FREQ_BOUNDS.clamp(2.0e9), 1700.0e6);
        assert_eq!(CENTER_FREQ_BOUNDS.clamp(100.0e6), 100.0e6);

        assert_eq!(GAIN_BOUNDS.clamp(-3.0), 0.0);
        assert_eq!(GAIN_BOUNDS.clamp(99.0), 50.0);
        assert_eq!(GAIN_BOUNDS.clamp(20.0), 20.0);
    }

    #[test]
    fn initial_values_are_inside_their_bounds() {
        assert_eq!(CENTER_FREQ_BOUNDS.clamp(CENTER_FREQ_INIT_HZ), CENTER_FREQ_INIT_HZ);
        assert_eq!(GAIN_BOUNDS.clamp(GAIN_INIT_DB), GAIN_INIT_DB);
    }
}
