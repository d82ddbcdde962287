//! Native hot-wire console built on egui/eframe.
//!
//! | Sub-module  | Responsibility |
//! | ----------- | -------------- |
//! | [`update`]  | Per-frame event draining, side panel controls, plot and result window |
//! | [`run`]     | Top-level [`run_console()`] entry point |
//!
//! The console only drives [`AcquisitionController`] and renders its buffer;
//! all acquisition and fitting logic lives in the library core.

mod run;
mod update;

pub use run::run_console;

use std::path::PathBuf;

use crate::acquisition::{available_ports, AcquisitionController};
use crate::config::HotWireConfig;
use crate::data::regression::FitResult;

/// One-line status shown under the controls.
#[derive(Debug, Clone)]
pub(crate) struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

pub struct HotWireApp {
    pub controller: AcquisitionController,
    pub config: HotWireConfig,
    /// Ports offered in the selector; refreshed on demand.
    pub ports: Vec<String>,
    /// Latest fit, overlaid on the plot until the data change.
    pub fit: Option<FitResult>,
    pub(crate) status: Option<StatusLine>,
    pub(crate) show_result: bool,
    pub(crate) config_path: Option<PathBuf>,
    notifier_installed: bool,
}

impl HotWireApp {
    pub fn new(config: HotWireConfig) -> Self {
        Self::with_controller(AcquisitionController::new(), config)
    }

    pub fn with_controller(mut controller: AcquisitionController, config: HotWireConfig) -> Self {
        controller.set_settings(config.acquisition.clone());
        let mut app = Self {
            controller,
            config,
            ports: Vec::new(),
            fit: None,
            status: None,
            show_result: false,
            config_path: None,
            notifier_installed: false,
        };
        app.refresh_ports();
        app
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub(crate) fn refresh_ports(&mut self) {
        self.ports = available_ports();
        if self.config.acquisition.port.is_empty() {
            if let Some(first) = self.ports.first() {
                self.config.acquisition.port = first.clone();
            }
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    pub(crate) fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::warn!("{text}");
        self.status = Some(StatusLine {
            text,
            is_error: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_requires_data_and_clears_on_new_run() {
        let mut app = HotWireApp::new(HotWireConfig::default());
        app.calculate_lambda();
        assert!(app.fit.is_none());
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));

        app.config.simulation.seed = Some(5);
        app.simulate();
        app.calculate_lambda();
        let fit = app.fit.as_ref().expect("fit after simulation");
        assert!((fit.slope - 5.0).abs() < 0.05);
        assert!(app.show_result);

        app.simulate();
        assert!(app.fit.is_none());
    }

    #[test]
    fn invalid_window_is_reported_in_status() {
        let mut app = HotWireApp::new(HotWireConfig::default());
        app.simulate();
        app.config.fit_window.start = 3.0;
        app.config.fit_window.end = 1.0;
        app.calculate_lambda();
        assert!(app.fit.is_none());
        let status = app.status.as_ref().expect("status");
        assert!(status.is_error);
        assert!(status.text.contains("invalid fit window"));
    }
}
