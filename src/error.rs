//! Error types for acquisition, regression, export and configuration.
//!
//! Per-line parse failures never show up here: the line reader absorbs them
//! and only counts them. Everything else is returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// The instrument port could not be opened or claimed.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no serial port selected")]
    NoPort,
    #[error("port {port} is already in use by another acquisition session")]
    Busy { port: String },
    #[error("failed to open port {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("failed to flush input on port {port}: {source}")]
    Flush {
        port: String,
        #[source]
        source: std::io::Error,
    },
}

/// Non-parse I/O failure on an open instrument channel.
#[derive(Debug, Error)]
pub enum StreamReadError {
    #[error("read from {port} failed: {source}")]
    Io {
        port: String,
        #[source]
        source: std::io::Error,
    },
    #[error("instrument stream {port} closed unexpectedly")]
    Closed { port: String },
}

/// Failures surfaced by the acquisition lifecycle.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("an acquisition session is already running")]
    AlreadyRunning,
    #[error(transparent)]
    StreamRead(#[from] StreamReadError),
    #[error("failed to spawn acquisition worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("read timeout ({read_ms} ms) must be shorter than the stop timeout ({stop_ms} ms)")]
    InvalidTimeouts { read_ms: u64, stop_ms: u64 },
}

/// Regression preconditions that were not met. No partial result exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    #[error("invalid fit window: start ({start} s) must be before end ({end} s)")]
    InvalidWindow { start: f64, end: f64 },
    #[error("fit window holds {found} usable samples, at least {required} are needed")]
    InsufficientData { found: usize, required: usize },
    #[error("all samples in the fit window share the same timestamp")]
    DegenerateWindow,
    #[error("fitted slope is zero, thermal conductivity is undefined")]
    DivisionByZero,
    #[error("invalid physical parameter: {0}")]
    InvalidParameters(&'static str),
}

/// Flat-file export and import failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finalize {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing or unexpected header, expected \"Temps,Température\"")]
    MissingHeader,
    #[error("row {row} is not a numeric (time, temperature) pair")]
    InvalidRow { row: usize },
}

/// Configuration load/save failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported configuration format: {0} (use .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}
