//! RTL-SDR hardware sample source.
//!
//! Opens the first dongle, applies the startup tuner configuration and serves
//! blocking synchronous reads. RTL-SDR delivers interleaved unsigned 8-bit
//! I/Q centered at 127.5; reads convert to `Complex<f32>` in -1.0..1.0.

use super::{SampleSource, SourceError};
use crate::config::{
    CENTER_FREQ_BOUNDS, CENTER_FREQ_INIT_HZ, GAIN_BOUNDS, GAIN_INIT_DB, SAMPLE_RATE_HZ,
};
use num_complex::Complex;

/// RTL-SDR `read_sync` buffers must be a multiple of the USB packet size.
const USB_PACKET_BYTES: usize = 512;

/// Sample source backed by an RTL-SDR dongle.
pub struct RtlSdrSource {
    device: Option<rtlsdr::Device>,
    center_freq_hz: f64,
    gain_db: f64,
}

impl std::fmt::Debug for RtlSdrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtlSdrSource")
            .field("open", &self.device.is_some())
            .field("center_freq_hz", &self.center_freq_hz)
            .field("gain_db", &self.gain_db)
            .finish()
    }
}

impl RtlSdrSource {
    /// Open device `index` and apply the startup configuration.
    ///
    /// # Errors
    /// `SourceError::Open` if the device cannot be opened (missing dongle,
    /// librtlsdr not loadable, device claimed by another process) and
    /// `SourceError::Configure` if the initial tuner setup fails. Both are
    /// fatal at startup.
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "rtlsdr takes i32/u32 and the clamped values fit"
    )]
    pub fn open(index: u32) -> Result<Self, SourceError> {
        log::info!("Opening RTL-SDR device {index}...");
        let mut device =
            rtlsdr::open(index as i32).map_err(|e| SourceError::Open(format!("{e}")))?;

        device
            .set_sample_rate(SAMPLE_RATE_HZ as u32)
            .map_err(|e| SourceError::Configure(format!("sample rate: {e}")))?;
        device
            .set_center_freq(CENTER_FREQ_INIT_HZ as u32)
            .map_err(|e| SourceError::Configure(format!("center frequency: {e}")))?;
        // Manual gain mode; gain is given in tenths of dB
        device
            .set_tuner_gain_mode(true)
            .map_err(|e| SourceError::Configure(format!("gain mode: {e}")))?;
        device
            .set_tuner_gain((GAIN_INIT_DB * 10.0) as i32)
            .map_err(|e| SourceError::Configure(format!("gain: {e}")))?;
        device
            .reset_buffer()
            .map_err(|e| SourceError::Configure(format!("buffer reset: {e}")))?;

        log::info!(
            "RTL-SDR configured: {:.3} MHz center, {:.3} MS/s, {:.0} dB gain",
            CENTER_FREQ_INIT_HZ / 1e6,
            SAMPLE_RATE_HZ / 1e6,
            GAIN_INIT_DB
        );

        Ok(Self {
            device: Some(device),
            center_freq_hz: CENTER_FREQ_INIT_HZ,
            gain_db: GAIN_INIT_DB,
        })
    }

    fn device_mut(&mut self) -> Result<&mut rtlsdr::Device, SourceError> {
        self.device
            .as_mut()
            .ok_or_else(|| SourceError::Read(String::from("device is closed")))
    }
}

impl SampleSource for RtlSdrSource {
    fn read(&mut self, count: usize) -> Result<Vec<Complex<f32>>, SourceError> {
        // Two bytes per sample, rounded up to whole USB packets
        let wanted_bytes = count * 2;
        let read_bytes = wanted_bytes.div_ceil(USB_PACKET_BYTES) * USB_PACKET_BYTES;

        let buf = self
            .device_mut()?
            .read_sync(read_bytes)
            .map_err(|e| SourceError::Read(format!("{e}")))?;
        if buf.len() < wanted_bytes {
            return Err(SourceError::Read(format!(
                "short read: {} of {wanted_bytes} bytes",
                buf.len()
            )));
        }

        // Keep the newest `count` samples from the buffer
        let start = buf.len() - wanted_bytes;
        let samples = buf[start..]
            .chunks_exact(2)
            .map(|iq| {
                let i = (f32::from(iq[0]) - 127.5) / 127.5;
                let q = (f32::from(iq[1]) - 127.5) / 127.5;
                Complex::new(i, q)
            })
            .collect();
        Ok(samples)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "clamped frequency fits u32"
    )]
    fn set_center_freq(&mut self, freq_hz: f64) -> Result<(), SourceError> {
        let clamped = CENTER_FREQ_BOUNDS.clamp(freq_hz);
        self.device_mut()?
            .set_center_freq(clamped as u32)
            .map_err(|e| SourceError::Configure(format!("center frequency: {e}")))?;
        self.center_freq_hz = clamped;
        log::debug!("Retuned to {:.1} MHz", clamped / 1e6);
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "clamped gain in tenths of dB fits i32"
    )]
    fn set_gain(&mut self, gain_db: f64) -> Result<(), SourceError> {
        let clamped = GAIN_BOUNDS.clamp(gain_db);
        self.device_mut()?
            .set_tuner_gain((clamped * 10.0) as i32)
            .map_err(|e| SourceError::Configure(format!("gain: {e}")))?;
        self.gain_db = clamped;
        log::debug!("Gain set to {clamped:.0} dB");
        Ok(())
    }

    fn center_freq_hz(&self) -> f64 {
        self.center_freq_hz
    }

    fn gain_db(&self) -> f64 {
        self.gain_db
    }

    fn close(&mut self) {
        // Dropping the handle closes the USB connection; taking the Option
        // makes a second close a no-op.
        if self.device.take().is_some() {
            log::info!("RTL-SDR device closed");
        }
    }
}

impl Drop for RtlSdrSource {
    fn drop(&mut self) {
        self.close();
    }
}
