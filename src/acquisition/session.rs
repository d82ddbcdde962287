//! One acquisition run: a worker thread reading an instrument channel.
//!
//! The worker owns the [`StreamConnection`], parses lines with a
//! [`LineReader`] and emits [`AcquisitionEvent`]s. The coordinating context
//! drains those events with [`AcquisitionSession::drain_into`]; the worker never
//! touches the sample buffer. The port claim stays with the session so that
//! [`AcquisitionSession::stop`] can always release it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::connection::{Connector, LineRead, PortClaim, StreamConnection};
use crate::config::AcquisitionConfig;
use crate::data::reader::LineReader;
use crate::data::series::SampleSeries;
use crate::error::{AcquisitionError, ConnectionError, StreamReadError};
use crate::sink::{channel_acquisition, AcquisitionEvent, AcquisitionSink, RepaintNotifier};

/// Lifecycle of an acquisition. `Idle` means no session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopped,
    Errored,
}

/// Counters exposed for display and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Samples drained into the buffer.
    pub samples: u64,
    /// Lines the parser rejected.
    pub discarded_lines: u64,
    /// Redraw requests drained.
    pub redraws: u64,
}

/// What a call to [`AcquisitionSession::drain_into`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    pub appended: usize,
    pub redraw: bool,
}

pub struct AcquisitionSession {
    port: String,
    state: SessionState,
    events: Receiver<AcquisitionEvent>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    // Disconnects once the worker has released the connection and exited.
    worker_done: Receiver<()>,
    claim: Option<PortClaim>,
    discarded: Arc<AtomicU64>,
    stats: SessionStats,
    stop_timeout: Duration,
}

impl AcquisitionSession {
    /// Claim and open `cfg.port`, flush stale input, and start reading.
    pub fn start(
        connector: &dyn Connector,
        cfg: &AcquisitionConfig,
        notifier: Option<RepaintNotifier>,
    ) -> Result<Self, AcquisitionError> {
        let port = cfg.port.trim();
        if port.is_empty() {
            return Err(ConnectionError::NoPort.into());
        }
        check_timeouts(cfg)?;
        let claim = PortClaim::acquire(port)?;
        let conn = connector.open(port, cfg.baud_rate, cfg.read_timeout())?;
        Self::spawn(conn, claim, cfg, notifier)
    }

    /// Start reading from an already opened connection.
    pub fn start_with_connection(
        conn: Box<dyn StreamConnection>,
        cfg: &AcquisitionConfig,
        notifier: Option<RepaintNotifier>,
    ) -> Result<Self, AcquisitionError> {
        check_timeouts(cfg)?;
        let claim = PortClaim::acquire(conn.port())?;
        Self::spawn(conn, claim, cfg, notifier)
    }

    fn spawn(
        mut conn: Box<dyn StreamConnection>,
        claim: PortClaim,
        cfg: &AcquisitionConfig,
        notifier: Option<RepaintNotifier>,
    ) -> Result<Self, AcquisitionError> {
        let port = conn.port().to_string();
        conn.discard_input().map_err(|source| ConnectionError::Flush {
            port: port.clone(),
            source,
        })?;

        let (sink, events) = channel_acquisition();
        let sink = sink.with_notifier(notifier);
        let (done_tx, worker_done) = std::sync::mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        // The clock for single-field lines starts once the stream is open.
        let reader = LineReader::new();
        let discarded = reader.discarded_counter();

        let worker = Worker {
            conn,
            reader,
            sink,
            cancel: Arc::clone(&cancel),
            redraw_every: cfg.redraw_every,
            done: done_tx,
        };
        let handle = std::thread::Builder::new()
            .name(format!("hotwire-acq {port}"))
            .spawn(move || worker.run())
            .map_err(AcquisitionError::Spawn)?;

        log::info!("acquisition started on {port}");
        Ok(Self {
            port,
            state: SessionState::Running,
            events,
            cancel,
            worker: Some(handle),
            worker_done,
            claim: Some(claim),
            discarded,
            stats: SessionStats::default(),
            stop_timeout: cfg.stop_timeout(),
        })
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            discarded_lines: self.discarded.load(Ordering::Relaxed),
            ..self.stats
        }
    }

    /// Apply every pending event to `series`.
    ///
    /// A stream failure moves the session to [`SessionState::Errored`] and is
    /// returned; samples received before it are still appended.
    pub fn drain_into(&mut self, series: &mut SampleSeries) -> Result<DrainOutcome, AcquisitionError> {
        let mut outcome = DrainOutcome::default();
        loop {
            match self.events.try_recv() {
                Ok(AcquisitionEvent::SampleAppended(sample)) => {
                    series.push(sample);
                    outcome.appended += 1;
                    self.stats.samples += 1;
                }
                Ok(AcquisitionEvent::Redraw) => {
                    outcome.redraw = true;
                    self.stats.redraws += 1;
                }
                Ok(AcquisitionEvent::Failed(err)) => {
                    self.state = SessionState::Errored;
                    self.join_worker();
                    self.claim = None;
                    return Err(err.into());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.state == SessionState::Running {
                        log::warn!("acquisition worker on {} exited without notice", self.port);
                        self.state = SessionState::Errored;
                    }
                    self.claim = None;
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Cancel the worker and wait up to the stop timeout for it to exit.
    ///
    /// The worker drops the connection as soon as its in-flight read returns,
    /// and the read timeout is shorter than the stop timeout, so a well-behaved
    /// connection is closed before this returns. The port claim is released in
    /// every case. No-op unless the session is running.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.cancel.store(true, Ordering::Release);
        match self.worker_done.recv_timeout(self.stop_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "acquisition worker on {} did not exit within {:?}, detaching it",
                    self.port,
                    self.stop_timeout
                );
                self.worker = None;
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self.join_worker(),
        }
        self.claim = None;
        self.state = SessionState::Stopped;
        log::info!("acquisition stopped on {}", self.port);
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("acquisition worker on {} panicked", self.port);
            }
        }
    }
}

impl Drop for AcquisitionSession {
    fn drop(&mut self) {
        // Let a still running worker wind down on its own.
        self.cancel.store(true, Ordering::Release);
    }
}

/// A read that may block longer than `stop()` waits would outlive the session.
fn check_timeouts(cfg: &AcquisitionConfig) -> Result<(), AcquisitionError> {
    if cfg.read_timeout_ms < cfg.stop_timeout_ms {
        Ok(())
    } else {
        Err(AcquisitionError::InvalidTimeouts {
            read_ms: cfg.read_timeout_ms,
            stop_ms: cfg.stop_timeout_ms,
        })
    }
}

struct Worker {
    conn: Box<dyn StreamConnection>,
    reader: LineReader,
    sink: AcquisitionSink,
    cancel: Arc<AtomicBool>,
    redraw_every: usize,
    done: Sender<()>,
}

impl Worker {
    fn run(self) {
        let Worker {
            mut conn,
            reader,
            sink,
            cancel,
            redraw_every,
            done,
        } = self;
        let port = conn.port().to_string();
        let mut appended: usize = 0;

        let failure = loop {
            if cancel.load(Ordering::Acquire) {
                break None;
            }
            match conn.read_line() {
                Ok(LineRead::Line(line)) => {
                    let Some(sample) = reader.parse_line(&line) else {
                        continue;
                    };
                    if sink.send_sample(sample).is_err() {
                        log::warn!("event receiver for {port} dropped, stopping worker");
                        break None;
                    }
                    appended += 1;
                    if redraw_every > 0 && appended % redraw_every == 0 {
                        sink.request_redraw();
                    }
                }
                Ok(LineRead::Overflow) => reader.record_discarded(),
                Ok(LineRead::Idle) => {}
                Ok(LineRead::Eof) => break Some(StreamReadError::Closed { port: port.clone() }),
                Err(source) => {
                    break Some(StreamReadError::Io {
                        port: port.clone(),
                        source,
                    })
                }
            }
        };

        // Release the channel before reporting anything.
        drop(conn);

        match failure {
            Some(err) => {
                log::error!("acquisition on {port} failed: {err}");
                sink.send_failure(err);
            }
            None => {
                log::debug!("acquisition worker on {port} exiting after {appended} samples");
                sink.request_redraw();
            }
        }
        drop(done);
    }
}
