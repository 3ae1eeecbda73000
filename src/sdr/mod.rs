//! Sample sources for the spectrum display.
//!
//! The capture loop talks to a [`SampleSource`] trait object so the same tick
//! logic drives RTL-SDR hardware (behind the `hardware` feature) and the
//! synthetic demo source used when no dongle is compiled in.

pub mod demo_source;
#[cfg(feature = "hardware")]
pub mod rtlsdr_source;

pub use demo_source::DemoSource;
#[cfg(feature = "hardware")]
pub use rtlsdr_source::RtlSdrSource;

use num_complex::Complex;
use thiserror::Error;

/// Errors from a sample source.
///
/// `Open` and `Configure` are fatal startup conditions: the device or its
/// native library is missing and the process cannot self-heal. `Read` is
/// transient; the capture loop skips the frame and tries again next tick.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open device: {0}")]
    Open(String),

    #[error("failed to configure tuner: {0}")]
    Configure(String),

    #[error("sample read failed: {0}")]
    Read(String),
}

/// A source of complex baseband sample blocks.
///
/// Configuration setters take effect on the next `read`; there is no queuing
/// and the last write per field wins. Implementations clamp requested values
/// into the bounds from [`crate::config`].
pub trait SampleSource {
    /// Read `count` IQ samples, blocking until they are available.
    fn read(&mut self, count: usize) -> Result<Vec<Complex<f32>>, SourceError>;

    /// Retune to `freq_hz`, clamped to the tuner range.
    fn set_center_freq(&mut self, freq_hz: f64) -> Result<(), SourceError>;

    /// Set tuner gain in dB, clamped to the gain range.
    fn set_gain(&mut self, gain_db: f64) -> Result<(), SourceError>;

    /// Currently applied center frequency in Hz.
    fn center_freq_hz(&self) -> f64;

    /// Currently applied gain in dB.
    fn gain_db(&self) -> f64;

    /// Release the underlying handle. Idempotent; implementations also call
    /// this from `Drop` so the handle is released exactly once on every exit
    /// path, including panics and window close.
    fn close(&mut self);
}
