//! Top-level entry point for running the console as a native window.

use eframe::egui;

use super::HotWireApp;

/// Open the console window and block until it is closed.
pub fn run_console(app: HotWireApp) -> eframe::Result<()> {
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1200.0, 760.0))
            .with_min_inner_size(egui::vec2(640.0, 480.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Hot-wire bench: thermal conductivity",
        opts,
        Box::new(|cc| {
            // Install Phosphor icon font before creating the app.
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}
