mod app;
mod state;
mod ui;

use app::FretWranglerApp;
use eframe::egui;
use fret_wrangler::config::Settings;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::load();
    log::debug!("Settings: {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FRET Wrangler – TR-FRET Data Wrangler",
        options,
        Box::new(|cc| {
            // Markers and error bars are drawn in black.
            cc.egui_ctx.set_theme(egui::Theme::Light);
            Ok(Box::new(FretWranglerApp::new(settings)))
        }),
    )
}
