//! Hotwire crate root: re-exports and module wiring.
//!
//! A measurement console for the transient hot-wire method: samples stream in
//! from an instrument over a serial line, are plotted live, and a logarithmic
//! regression over a chosen time window yields the thermal conductivity λ.
//!
//! - `data`: samples, the append-only series, line parsing, regression, export, simulation
//! - `sink`: events from the acquisition worker to the coordinating context
//! - `acquisition`: instrument connections, per-run sessions and the controller
//! - `config`: console configuration and JSON/YAML persistence
//! - `error`: error types
//! - `app`: the egui/eframe console

pub mod acquisition;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod sink;

// Public re-exports for a compact external API
pub use acquisition::{AcquisitionController, AcquisitionSession, SessionState, SessionStats};
pub use config::{AcquisitionConfig, HotWireConfig};
pub use data::export::{export_csv, import_csv};
pub use data::reader::LineReader;
pub use data::regression::{calculate_lambda, FitResult, FitWindow, PhysicalParameters};
pub use data::series::{Sample, SampleSeries, SeriesSnapshot};
pub use data::simulation::{simulate_acquisition, SimulationConfig};
pub use error::{
    AcquisitionError, ConfigError, ConnectionError, ExportError, RegressionError, StreamReadError,
};
pub use sink::{channel_acquisition, AcquisitionEvent, AcquisitionSink};
