mod app;
mod config;
mod sdr;
mod spectrum;

use app::ScopeApp;
use sdr::{SampleSource, SourceError};

/// Build the sample source for this run.
///
/// With the `hardware` feature this opens the first RTL-SDR dongle; any
/// failure there is fatal. Without it the synthetic demo source runs so the
/// viewer works on machines with no dongle attached.
fn build_source() -> Result<Box<dyn SampleSource>, SourceError> {
    #[cfg(feature = "hardware")]
    {
        Ok(Box::new(sdr::RtlSdrSource::open(0)?))
    }
    #[cfg(not(feature = "hardware"))]
    {
        log::warn!("Built without RTL-SDR support (enable the 'hardware' feature); using demo source");
        Ok(Box::new(sdr::DemoSource::new(config::SAMPLE_RATE_HZ)))
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    log::info!("Starting iqscope...");

    let source = match build_source() {
        Ok(source) => source,
        Err(e) => {
            log::error!("Cannot open sample source: {e}");
            log::error!("Check that an RTL-SDR dongle is connected and librtlsdr is installed.");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 600.0])
            .with_title("iqscope"),
        ..Default::default()
    };

    eframe::run_native(
        "iqscope",
        options,
        Box::new(move |_cc| Ok(Box::new(ScopeApp::new(source)))),
    )
}
