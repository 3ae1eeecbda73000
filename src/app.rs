//! Spectrum viewer application.
//!
//! Single-threaded, timer-driven: each due tick reads a block of IQ samples,
//! runs the spectrum estimator and keeps the result as the last-good frame.
//! Slider callbacks run between ticks on the same thread, so the tuner state
//! never needs locking.

use crate::config::{
    self, CENTER_FREQ_BOUNDS, FFT_SIZE, GAIN_BOUNDS, PLOT_DB_RANGE, READ_FACTOR, TICK_INTERVAL,
};
use crate::sdr::SampleSource;
use crate::spectrum::{SpectrumEstimator, DB_FLOOR_EPSILON};
use egui_plot::{Line, Plot};
use std::time::Instant;

/// Tuner values mirrored into the sliders (in display units).
#[derive(Debug, Clone, Copy)]
struct TunerState {
    center_freq_mhz: f64,
    gain_db: f64,
}

/// Top-level application state: the sample source, the estimator and the
/// last-good spectrum, owned explicitly rather than living in globals.
pub struct ScopeApp {
    source: Box<dyn SampleSource>,
    estimator: SpectrumEstimator,
    tuner: TunerState,
    /// Most recent successfully computed spectrum; kept on screen across
    /// failed reads.
    last_spectrum: Vec<f32>,
    last_tick: Instant,
}

impl std::fmt::Debug for ScopeApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeApp")
            .field("tuner", &self.tuner)
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}

impl ScopeApp {
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        let estimator = SpectrumEstimator::new(FFT_SIZE, config::SAMPLE_RATE_HZ);
        let tuner = TunerState {
            center_freq_mhz: source.center_freq_hz() / 1e6,
            gain_db: source.gain_db(),
        };
        Self {
            source,
            estimator,
            tuner,
            // Start at the dB floor so the plot is well-formed before the
            // first capture completes
            last_spectrum: vec![10.0 * DB_FLOOR_EPSILON.log10(); FFT_SIZE],
            last_tick: Instant::now() - TICK_INTERVAL,
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading(format!(
            "RTL-SDR Spectrum — center {:.1} MHz, gain {:.0} dB",
            self.tuner.center_freq_mhz, self.tuner.gain_db
        ));
        ui.separator();

        let freq_response = ui.add(
            egui::Slider::new(
                &mut self.tuner.center_freq_mhz,
                (CENTER_FREQ_BOUNDS.min / 1e6)..=(CENTER_FREQ_BOUNDS.max / 1e6),
            )
            .step_by(0.1)
            .suffix(" MHz")
            .text("Center frequency"),
        );
        if freq_response.changed() {
            if let Err(e) = self.source.set_center_freq(self.tuner.center_freq_mhz * 1e6) {
                log::warn!("Retune failed: {e}");
            }
            self.tuner.center_freq_mhz = self.source.center_freq_hz() / 1e6;
        }

        let gain_response = ui.add(
            egui::Slider::new(&mut self.tuner.gain_db, GAIN_BOUNDS.min..=GAIN_BOUNDS.max)
                .step_by(1.0)
                .suffix(" dB")
                .text("Gain"),
        );
        if gain_response.changed() {
            if let Err(e) = self.source.set_gain(self.tuner.gain_db) {
                log::warn!("Gain change failed: {e}");
            }
            self.tuner.gain_db = self.source.gain_db();
        }
    }

    fn render_plot(&self, ui: &mut egui::Ui) {
        let axis = self.estimator.freq_axis_mhz();
        let points: Vec<[f64; 2]> = axis
            .iter()
            .zip(&self.last_spectrum)
            .map(|(&freq, &db)| [f64::from(freq), f64::from(db)])
            .collect();

        Plot::new("spectrum_plot")
            .x_axis_label("Frequency relative to center (MHz)")
            .y_axis_label("Power (dB)")
            .include_x(f64::from(axis[0]))
            .include_x(f64::from(axis[axis.len() - 1]))
            .include_y(PLOT_DB_RANGE.0)
            .include_y(PLOT_DB_RANGE.1)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new("power", points));
            });
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // One capture per tick period; a slow frame just delays the next
        // tick, there is no queue to fall behind on.
        if self.last_tick.elapsed() >= TICK_INTERVAL {
            self.last_tick = Instant::now();
            capture_tick(
                self.source.as_mut(),
                &self.estimator,
                &mut self.last_spectrum,
            );
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_controls(ui);
            ui.separator();
            self.render_plot(ui);
        });

        ctx.request_repaint_after(TICK_INTERVAL);
    }
}

/// Run one capture: read a block with settling margin, transform the newest
/// `FFT_SIZE` samples and store the result. A failed or short read leaves
/// `last_spectrum` untouched so the previous frame stays on screen.
fn capture_tick(
    source: &mut dyn SampleSource,
    estimator: &SpectrumEstimator,
    last_spectrum: &mut Vec<f32>,
) {
    let wanted = estimator.fft_size() * READ_FACTOR;
    match source.read(wanted) {
        Ok(samples) if samples.len() >= estimator.fft_size() => {
            let block = &samples[samples.len() - estimator.fft_size()..];
            *last_spectrum = estimator.compute(block);
        }
        Ok(samples) => {
            log::debug!(
                "Short read ({} of {wanted} samples), keeping previous frame",
                samples.len()
            );
        }
        Err(e) => {
            log::debug!("Sample read failed, keeping previous frame: {e}");
        }
    }
}
