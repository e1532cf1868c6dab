//! Application entry point for the pixel garden.
//!
//! This binary installs logging, loads the garden configuration and
//! delegates all interactive logic and rendering to [`Viewer`] from the
//! `viewer` module.

mod viewer;

use garden_core::GardenConfig;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging honours `RUST_LOG` and defaults to `info`. Configuration is
/// loaded for the `debug` or `release` profile matching the build; if it
/// cannot be loaded the built-in defaults are used.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    let cfg = GardenConfig::load(profile).unwrap_or_else(|err| {
        error!(%err, profile, "failed to load config, using defaults");
        GardenConfig::default()
    });
    info!(profile, seeds = cfg.admission.seeds, "starting pixel garden");

    let canvas = cfg.scene.canvas_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([canvas.x + 40.0, canvas.y + 100.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pixel Garden",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg)))),
    )
}
