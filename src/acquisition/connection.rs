//! Instrument channel abstraction: line-oriented reads with a bounded timeout.
//!
//! [`StreamConnection`] is the seam between the acquisition worker and the
//! hardware. [`SerialConnection`] talks to a real serial port; [`ReaderConnection`]
//! wraps any byte source (recorded captures, pipes, test doubles).

use std::collections::HashSet;
use std::io::{self, Read};
use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::error::ConnectionError;

/// Result of one bounded line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// One complete line, without its terminator.
    Line(String),
    /// No complete line arrived within the timeout. Not an error.
    Idle,
    /// A line grew past [`MAX_LINE_LEN`] without a terminator and was dropped.
    Overflow,
    /// The byte stream ended.
    Eof,
}

/// An open, exclusively owned instrument channel. Dropping it closes it.
pub trait StreamConnection: Send {
    /// Port identifier, for logging and error messages.
    fn port(&self) -> &str;

    /// Drop any bytes buffered before the session started.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Block for at most the read timeout and return the next line if one completed.
    fn read_line(&mut self) -> io::Result<LineRead>;
}

/// Opens [`StreamConnection`]s by port name.
pub trait Connector: Send + Sync {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn StreamConnection>, ConnectionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Line assembly
// ─────────────────────────────────────────────────────────────────────────────

/// Longest line kept while waiting for its terminator. Instrument lines are a
/// few dozen bytes; anything longer is noise (e.g. a wrong baud rate).
pub const MAX_LINE_LEN: usize = 4096;

/// Reassembles newline-terminated lines from arbitrary read chunks.
/// Bytes of a partial line are kept until its terminator arrives, up to
/// [`MAX_LINE_LEN`]; the rest of an overlong line is skipped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // Inside an overlong line, dropping bytes up to the next terminator.
    skipping: bool,
    eof: bool,
}

impl LineBuffer {
    const CHUNK: usize = 256;

    pub fn clear(&mut self) {
        self.pending.clear();
        self.skipping = false;
    }

    fn take_line(&mut self) -> Option<String> {
        loop {
            let pos = self.pending.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if std::mem::take(&mut self.skipping) {
                continue;
            }
            return Some(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
    }

    /// Read once from `src` and return the next complete line, if any.
    pub fn read_line_from<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<LineRead> {
        if let Some(line) = self.take_line() {
            return Ok(LineRead::Line(line));
        }
        if self.eof {
            return Ok(LineRead::Eof);
        }
        let mut chunk = [0u8; Self::CHUNK];
        match src.read(&mut chunk) {
            Ok(0) => {
                self.eof = true;
                if self.pending.is_empty() || self.skipping {
                    self.clear();
                    Ok(LineRead::Eof)
                } else {
                    // Unterminated last line.
                    let rest = std::mem::take(&mut self.pending);
                    Ok(LineRead::Line(String::from_utf8_lossy(&rest).into_owned()))
                }
            }
            Ok(n) => {
                self.pending.extend_from_slice(&chunk[..n]);
                if let Some(line) = self.take_line() {
                    return Ok(LineRead::Line(line));
                }
                if self.pending.len() > MAX_LINE_LEN {
                    self.pending.clear();
                    if !self.skipping {
                        self.skipping = true;
                        return Ok(LineRead::Overflow);
                    }
                }
                Ok(LineRead::Idle)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(LineRead::Idle)
            }
            Err(e) => Err(e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Port claims
// ─────────────────────────────────────────────────────────────────────────────

static CLAIMED_PORTS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Process-wide exclusive claim on a port name, released on drop.
#[derive(Debug)]
pub struct PortClaim {
    port: String,
}

impl PortClaim {
    pub fn acquire(port: &str) -> Result<Self, ConnectionError> {
        let mut claimed = CLAIMED_PORTS.lock().unwrap_or_else(|e| e.into_inner());
        if !claimed.insert(port.to_string()) {
            return Err(ConnectionError::Busy {
                port: port.to_string(),
            });
        }
        Ok(Self {
            port: port.to_string(),
        })
    }

    pub fn is_claimed(port: &str) -> bool {
        CLAIMED_PORTS
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(port)
    }
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        let mut claimed = CLAIMED_PORTS.lock().unwrap_or_else(|e| e.into_inner());
        claimed.remove(&self.port);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serial port
// ─────────────────────────────────────────────────────────────────────────────

/// Names of the serial ports currently present on the system.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            log::warn!("failed to enumerate serial ports: {e}");
            Vec::new()
        }
    }
}

pub struct SerialConnection {
    name: String,
    port: Box<dyn serialport::SerialPort>,
    lines: LineBuffer,
}

impl StreamConnection for SerialConnection {
    fn port(&self) -> &str {
        &self.name
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.lines.clear();
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn read_line(&mut self) -> io::Result<LineRead> {
        self.lines.read_line_from(&mut self.port)
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        log::info!("closed serial port {}", self.name);
    }
}

/// Opens real serial ports (8N1, no flow control).
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn StreamConnection>, ConnectionError> {
        let handle = serialport::new(port, baud_rate)
            .timeout(read_timeout)
            .open()
            .map_err(|e| ConnectionError::Open {
                port: port.to_string(),
                reason: e.to_string(),
            })?;
        log::info!("opened serial port {port} at {baud_rate} baud");
        Ok(Box::new(SerialConnection {
            name: port.to_string(),
            port: handle,
            lines: LineBuffer::default(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generic byte source
// ─────────────────────────────────────────────────────────────────────────────

/// [`StreamConnection`] over any `Read` source.
///
/// The source is expected to bound its own blocking (a timed-out read should
/// return `ErrorKind::TimedOut` or `WouldBlock`). Input discarding is a no-op
/// beyond dropping partially assembled lines.
pub struct ReaderConnection<R> {
    name: String,
    inner: R,
    lines: LineBuffer,
}

impl<R: Read + Send> ReaderConnection<R> {
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        Self {
            name: name.into(),
            inner,
            lines: LineBuffer::default(),
        }
    }
}

impl<R: Read + Send> StreamConnection for ReaderConnection<R> {
    fn port(&self) -> &str {
        &self.name
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.lines.clear();
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<LineRead> {
        self.lines.read_line_from(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunks(std::collections::VecDeque<io::Result<Vec<u8>>>);

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn partial_line_survives_timeout() {
        let mut src = Chunks(
            vec![
                Ok(b"1.0,2".to_vec()),
                Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
                Ok(b"0.5\n3.0".to_vec()),
            ]
            .into(),
        );
        let mut lines = LineBuffer::default();
        assert_eq!(lines.read_line_from(&mut src).unwrap(), LineRead::Idle);
        assert_eq!(lines.read_line_from(&mut src).unwrap(), LineRead::Idle);
        assert_eq!(
            lines.read_line_from(&mut src).unwrap(),
            LineRead::Line("1.0,20.5".into())
        );
        assert_eq!(
            lines.read_line_from(&mut src).unwrap(),
            LineRead::Line("3.0".into())
        );
        assert_eq!(lines.read_line_from(&mut src).unwrap(), LineRead::Eof);
    }

    #[test]
    fn overlong_line_is_dropped_once_and_reading_resumes() {
        let mut chunks: std::collections::VecDeque<io::Result<Vec<u8>>> =
            std::iter::repeat_with(|| Ok(vec![b'0'; 256])).take(24).collect();
        chunks.push_back(Ok(b"0000\n1.0,20.5\n".to_vec()));
        let mut src = Chunks(chunks);
        let mut lines = LineBuffer::default();

        let mut seen = Vec::new();
        loop {
            match lines.read_line_from(&mut src).unwrap() {
                LineRead::Idle => {}
                LineRead::Eof => break,
                other => seen.push(other),
            }
        }
        assert_eq!(seen, vec![LineRead::Overflow, LineRead::Line("1.0,20.5".into())]);
        assert!(lines.pending.is_empty());
    }

    #[test]
    fn port_claim_is_exclusive_until_dropped() {
        let claim = PortClaim::acquire("/dev/test-claim").unwrap();
        assert!(matches!(
            PortClaim::acquire("/dev/test-claim"),
            Err(ConnectionError::Busy { .. })
        ));
        drop(claim);
        assert!(!PortClaim::is_claimed("/dev/test-claim"));
    }
}
