//! Acquisition lifecycle: connection, worker session, and the controller the
//! console drives.
//!
//! | Sub-module     | Responsibility |
//! | -------------- | -------------- |
//! | [`connection`] | Instrument channel trait, serial and generic implementations, port claims |
//! | [`session`]    | One acquisition run on a worker thread, event draining, cooperative stop |
//!
//! [`AcquisitionController`] owns the sample buffer and at most one running
//! session. It is `Idle → Running → {Stopped, Errored}` and can be restarted
//! from either terminal state.

pub mod connection;
pub mod session;

use std::path::Path;

pub use connection::{
    available_ports, Connector, LineRead, ReaderConnection, SerialConnector, StreamConnection,
};
pub use session::{AcquisitionSession, DrainOutcome, SessionState, SessionStats};

use crate::config::AcquisitionConfig;
use crate::data::export;
use crate::data::regression::{self, FitResult, FitWindow, PhysicalParameters};
use crate::data::series::{SampleSeries, SeriesSnapshot};
use crate::data::simulation::{self, SimulationConfig};
use crate::error::{AcquisitionError, ExportError, RegressionError};
use crate::sink::RepaintNotifier;

pub struct AcquisitionController {
    connector: Box<dyn Connector>,
    settings: AcquisitionConfig,
    session: Option<AcquisitionSession>,
    series: SampleSeries,
    notifier: Option<RepaintNotifier>,
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::new()
    }
}

impl AcquisitionController {
    /// Controller backed by real serial ports.
    pub fn new() -> Self {
        Self::with_connector(SerialConnector)
    }

    pub fn with_connector<C: Connector + 'static>(connector: C) -> Self {
        Self {
            connector: Box::new(connector),
            settings: AcquisitionConfig::default(),
            session: None,
            series: SampleSeries::new(),
            notifier: None,
        }
    }

    /// Called from the worker every `redraw_every` samples. Must not block.
    pub fn set_repaint_notifier(&mut self, notifier: Option<RepaintNotifier>) {
        self.notifier = notifier;
    }

    /// Timeouts and redraw cadence used by subsequent starts.
    pub fn set_settings(&mut self, settings: AcquisitionConfig) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &AcquisitionConfig {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, AcquisitionSession::state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn stats(&self) -> SessionStats {
        self.session
            .as_ref()
            .map(AcquisitionSession::stats)
            .unwrap_or_default()
    }

    /// Open `port` and start a new session. The buffer is cleared once the
    /// port is open; a failed start leaves the previous data in place and the
    /// controller `Idle`.
    pub fn start(&mut self, port: &str, baud_rate: u32) -> Result<(), AcquisitionError> {
        let cfg = AcquisitionConfig {
            port: port.to_string(),
            baud_rate,
            ..self.settings.clone()
        };
        self.ensure_not_running()?;
        // A finished session may still hold its port claim until dropped.
        self.session = None;
        let session = AcquisitionSession::start(self.connector.as_ref(), &cfg, self.notifier.clone())?;
        self.begin(session);
        Ok(())
    }

    /// Start a session on a connection opened elsewhere.
    pub fn start_with_connection(
        &mut self,
        conn: Box<dyn StreamConnection>,
    ) -> Result<(), AcquisitionError> {
        self.ensure_not_running()?;
        self.session = None;
        let session =
            AcquisitionSession::start_with_connection(conn, &self.settings, self.notifier.clone())?;
        self.begin(session);
        Ok(())
    }

    fn begin(&mut self, session: AcquisitionSession) {
        self.series.reset();
        self.session = Some(session);
    }

    fn ensure_not_running(&self) -> Result<(), AcquisitionError> {
        if self.is_running() {
            Err(AcquisitionError::AlreadyRunning)
        } else {
            Ok(())
        }
    }

    /// Drain pending worker events into the buffer. Call from the
    /// coordinating context (e.g. once per frame).
    pub fn poll(&mut self) -> Result<DrainOutcome, AcquisitionError> {
        match self.session.as_mut() {
            Some(session) => session.drain_into(&mut self.series),
            None => Ok(DrainOutcome::default()),
        }
    }

    /// Stop the running session (bounded wait) and apply its remaining events.
    /// A stream failure that happened before the stop is returned here.
    pub fn stop(&mut self) -> Result<(), AcquisitionError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.stop();
        session.drain_into(&mut self.series).map(|_| ())
    }

    /// Forget the finished session and return to `Idle`, keeping the data.
    pub fn reset(&mut self) -> Result<(), AcquisitionError> {
        self.ensure_not_running()?;
        self.session = None;
        Ok(())
    }

    /// Replace the buffer with a synthetic run. Not allowed while acquiring.
    pub fn simulate(&mut self, duration: f64, cfg: &SimulationConfig) -> Result<(), AcquisitionError> {
        self.load_series(simulation::simulate_with(duration, cfg))
    }

    /// Replace the buffer with previously recorded data.
    pub fn load_series(&mut self, series: SampleSeries) -> Result<(), AcquisitionError> {
        self.ensure_not_running()?;
        self.session = None;
        self.series = series;
        Ok(())
    }

    pub fn series(&self) -> &SampleSeries {
        &self.series
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        self.series.snapshot()
    }

    pub fn calculate_lambda(
        &self,
        window: FitWindow,
        params: &PhysicalParameters,
    ) -> Result<FitResult, RegressionError> {
        regression::calculate_lambda(&self.snapshot(), window, params)
    }

    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        export::export_csv(path, &self.snapshot())
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
    }
}
