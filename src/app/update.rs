//! Per-frame logic for [`HotWireApp`].
//!
//! Each frame drains the acquisition events into the buffer, renders the
//! control side panel, then draws the buffer snapshot (and the last fit) in
//! the central plot. Redraws always re-read the snapshot, so spurious or
//! repeated repaints change nothing.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use egui_phosphor::regular::{
    ARROWS_CLOCKWISE, CALCULATOR, FLOPPY_DISK, FOLDER_OPEN, PLAY, STOP, WAVE_SINE,
};
use egui_plot::{Legend, Line, LineStyle, Plot, VLine};

use crate::acquisition::SessionState;
use crate::config::{load_config_from_path, save_config_to_path};
use crate::data::export;
use crate::data::simulation::SimulationConfig;

use super::HotWireApp;

impl eframe::App for HotWireApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.notifier_installed {
            let repaint_ctx = ctx.clone();
            self.controller
                .set_repaint_notifier(Some(Arc::new(move || repaint_ctx.request_repaint())));
            self.notifier_installed = true;
        }

        self.update_data();

        egui::SidePanel::left("hotwire_controls")
            .resizable(false)
            .min_width(230.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.render_controls(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.render_plot(ui));

        self.render_result_window(ctx);

        if self.controller.is_running() {
            // Fallback tick in case a redraw request is coalesced away.
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl HotWireApp {
    /// Apply pending worker events to the buffer.
    pub(crate) fn update_data(&mut self) {
        match self.controller.poll() {
            Ok(outcome) => {
                if outcome.appended > 0 {
                    self.fit = None;
                }
            }
            Err(e) => self.set_error(format!("Acquisition stopped: {e}")),
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let running = self.controller.is_running();

        ui.heading("Physical parameters");
        egui::Grid::new("physical_grid").num_columns(2).show(ui, |ui| {
            ui.label("Current");
            ui.add(
                egui::DragValue::new(&mut self.config.physical.current)
                    .speed(0.01)
                    .suffix(" A"),
            );
            ui.end_row();
            ui.label("Wire resistance");
            ui.add(
                egui::DragValue::new(&mut self.config.physical.wire_resistance)
                    .speed(0.1)
                    .range(0.0..=f64::MAX)
                    .suffix(" Ω"),
            );
            ui.end_row();
            ui.label("Wire length");
            ui.add(
                egui::DragValue::new(&mut self.config.physical.wire_length)
                    .speed(0.001)
                    .range(1e-6..=f64::MAX)
                    .suffix(" m"),
            );
            ui.end_row();
        });

        ui.separator();
        ui.heading("Acquisition");
        ui.add_enabled_ui(!running, |ui| {
            ui.horizontal(|ui| {
                let port = &mut self.config.acquisition.port;
                let selected = if port.is_empty() { "none".to_string() } else { port.clone() };
                egui::ComboBox::from_id_salt("serial_port")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for p in &self.ports {
                            ui.selectable_value(port, p.clone(), p.as_str());
                        }
                    });
                if ui
                    .button(ARROWS_CLOCKWISE)
                    .on_hover_text("Rescan serial ports")
                    .clicked()
                {
                    self.refresh_ports();
                }
            });
            ui.horizontal(|ui| {
                ui.label("Baud rate");
                ui.add(egui::DragValue::new(&mut self.config.acquisition.baud_rate).speed(100));
            });
        });

        ui.horizontal(|ui| {
            if running {
                if ui.button(format!("{STOP} Stop")).clicked() {
                    self.stop_acquisition();
                }
            } else if ui.button(format!("{PLAY} Connect & acquire")).clicked() {
                self.start_acquisition();
            }
        });
        if ui
            .add_enabled(!running, egui::Button::new(format!("{WAVE_SINE} Simulate acquisition")))
            .clicked()
        {
            self.simulate();
        }

        let stats = self.controller.stats();
        ui.label(format!(
            "{} · {} samples · {} discarded lines",
            state_label(self.controller.state()),
            self.controller.series().len(),
            stats.discarded_lines
        ));

        ui.separator();
        ui.heading("ln(t) regression");
        egui::Grid::new("fit_grid").num_columns(2).show(ui, |ui| {
            ui.label("Fit start");
            ui.add(
                egui::DragValue::new(&mut self.config.fit_window.start)
                    .speed(0.01)
                    .suffix(" s"),
            );
            ui.end_row();
            ui.label("Fit end");
            ui.add(
                egui::DragValue::new(&mut self.config.fit_window.end)
                    .speed(0.01)
                    .suffix(" s"),
            );
            ui.end_row();
        });
        if ui.button(format!("{CALCULATOR} Calculate λ")).clicked() {
            self.calculate_lambda();
        }

        ui.separator();
        ui.heading("Data");
        if ui.button(format!("{FLOPPY_DISK} Export CSV")).clicked() {
            self.export_csv();
        }
        if ui
            .add_enabled(!running, egui::Button::new(format!("{FOLDER_OPEN} Load CSV")))
            .clicked()
        {
            self.import_csv();
        }
        ui.horizontal(|ui| {
            if ui.button("Load settings").clicked() {
                self.load_settings();
            }
            if ui.button("Save settings").clicked() {
                self.save_settings();
            }
        });

        if let Some(status) = &self.status {
            ui.separator();
            let text = egui::RichText::new(&status.text);
            if status.is_error {
                ui.label(text.color(ui.visuals().error_fg_color));
            } else {
                ui.label(text);
            }
        }
    }

    fn render_plot(&mut self, ui: &mut egui::Ui) {
        let snapshot = self.controller.snapshot();
        let window = self.config.fit_window;
        Plot::new("hotwire_plot")
            .legend(Legend::default())
            .x_axis_label("Temps (s)")
            .y_axis_label("Température (°C)")
            .show(ui, |plot_ui| {
                if !snapshot.is_empty() {
                    plot_ui.line(Line::new("T(t)", snapshot.points()));
                }
                if let Some(fit) = &self.fit {
                    plot_ui.line(
                        Line::new("Fit ln(t)", fit.predicted.clone())
                            .style(LineStyle::dashed_loose())
                            .width(2.0),
                    );
                }
                plot_ui.vline(
                    VLine::new("Fit window", window.start).style(LineStyle::dotted_dense()),
                );
                plot_ui.vline(
                    VLine::new("Fit window", window.end).style(LineStyle::dotted_dense()),
                );
            });
    }

    fn render_result_window(&mut self, ctx: &egui::Context) {
        let Some(fit) = &self.fit else {
            return;
        };
        let mut open = self.show_result;
        egui::Window::new("Result")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading(format!("λ = {:.4} W/(m·K)", fit.lambda));
                egui::Grid::new("result_grid").num_columns(2).show(ui, |ui| {
                    ui.label("P");
                    ui.label(format!("{:.4} W", fit.power));
                    ui.end_row();
                    ui.label("q");
                    ui.label(format!("{:.4} W/m", fit.linear_power));
                    ui.end_row();
                    ui.label("Slope");
                    ui.label(format!("{:.6} °C", fit.slope));
                    ui.end_row();
                    ui.label("Intercept");
                    ui.label(format!("{:.4} °C", fit.intercept));
                    ui.end_row();
                    ui.label("R²");
                    ui.label(format!("{:.5}", fit.r_squared));
                    ui.end_row();
                    ui.label("Samples");
                    ui.label(fit.samples_used.to_string());
                    ui.end_row();
                });
            });
        self.show_result = open;
    }

    // ── Actions ──────────────────────────────────────────────────────────────

    pub(crate) fn start_acquisition(&mut self) {
        self.controller.set_settings(self.config.acquisition.clone());
        let port = self.config.acquisition.port.clone();
        match self
            .controller
            .start(&port, self.config.acquisition.baud_rate)
        {
            Ok(()) => {
                self.fit = None;
                self.set_status(format!("Acquiring on {port}"));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub(crate) fn stop_acquisition(&mut self) {
        match self.controller.stop() {
            Ok(()) => self.set_status(format!(
                "Stopped, {} samples recorded",
                self.controller.series().len()
            )),
            Err(e) => self.set_error(format!("Acquisition failed: {e}")),
        }
    }

    pub(crate) fn simulate(&mut self) {
        let duration = SimulationConfig::duration_for(&self.config.fit_window);
        match self.controller.simulate(duration, &self.config.simulation) {
            Ok(()) => {
                self.fit = None;
                self.set_status(format!("Simulated {duration:.1} s of data"));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub(crate) fn calculate_lambda(&mut self) {
        if self.controller.series().is_empty() {
            self.set_error("No data");
            return;
        }
        match self
            .controller
            .calculate_lambda(self.config.fit_window, &self.config.physical)
        {
            Ok(fit) => {
                self.set_status(format!("λ = {:.4} W/(m·K)", fit.lambda));
                self.fit = Some(fit);
                self.show_result = true;
            }
            Err(e) => {
                self.fit = None;
                self.set_error(e.to_string());
            }
        }
    }

    fn export_csv(&mut self) {
        if self.controller.series().is_empty() {
            self.set_error("No data");
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(export::default_export_file_name())
            .add_filter("CSV", &["csv"])
            .save_file()
        else {
            return;
        };
        match self.controller.export_csv(&path) {
            Ok(()) => self.set_status(format!("Data saved to {}", path.display())),
            Err(e) => self.set_error(format!("Export failed: {e}")),
        }
    }

    fn import_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .pick_file()
        else {
            return;
        };
        let loaded = export::import_csv(&path)
            .map_err(|e| e.to_string())
            .and_then(|series| self.controller.load_series(series).map_err(|e| e.to_string()));
        match loaded {
            Ok(()) => {
                self.fit = None;
                self.set_status(format!("Loaded {}", path.display()));
            }
            Err(e) => self.set_error(format!("Import failed: {e}")),
        }
    }

    fn load_settings(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json", "yaml", "yml"])
            .pick_file()
        else {
            return;
        };
        match load_config_from_path(&path) {
            Ok(cfg) => {
                self.controller.set_settings(cfg.acquisition.clone());
                self.config = cfg;
                self.config_path = Some(path);
                self.set_status("Settings loaded");
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn save_settings(&mut self) {
        let mut dlg = rfd::FileDialog::new().add_filter("Settings", &["json", "yaml", "yml"]);
        dlg = match &self.config_path {
            Some(p) => dlg.set_file_name(p.file_name().map_or_else(
                || "hotwire.json".to_string(),
                |n| n.to_string_lossy().into_owned(),
            )),
            None => dlg.set_file_name("hotwire.json"),
        };
        let Some(path) = dlg.save_file() else {
            return;
        };
        match save_config_to_path(&self.config, &path) {
            Ok(()) => {
                self.config_path = Some(path);
                self.set_status("Settings saved");
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "Idle",
        SessionState::Running => "Running",
        SessionState::Stopped => "Stopped",
        SessionState::Errored => "Error",
    }
}
