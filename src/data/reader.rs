//! Tolerant line parser for the instrument stream.
//!
//! Accepted line formats:
//!   `<time>,<temp>` or `<time>;<temp>`  explicit timestamp in seconds
//!   `<temp>`                            timestamp = elapsed time since the stream opened
//!
//! - Empty lines are discarded.
//! - Lines with any other field count are discarded.
//! - Non-numeric (or non-finite) fields discard the whole line.
//!
//! Discarded lines are counted, never reported as errors: instrument noise on
//! the line is expected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::series::Sample;

/// Per-stream line parser.
///
/// Holds the instant the stream was opened (used for single-field lines) and
/// a shared discarded-line counter.
#[derive(Debug, Clone)]
pub struct LineReader {
    opened_at: Instant,
    discarded: Arc<AtomicU64>,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    /// Start timing from now.
    pub fn new() -> Self {
        Self::opened_at(Instant::now())
    }

    pub fn opened_at(opened_at: Instant) -> Self {
        Self {
            opened_at,
            discarded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle on the discarded-line counter, shareable across threads.
    pub fn discarded_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.discarded)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Parse one line. Returns `None` (and bumps the counter) when the line is
    /// not a sample.
    pub fn parse_line(&self, line: &str) -> Option<Sample> {
        let parsed = parse_fields(line).map(|fields| match fields {
            Fields::Timed(t, temp) => Sample::new(t, temp),
            Fields::Untimed(temp) => {
                Sample::new(self.opened_at.elapsed().as_secs_f64(), temp)
            }
        });
        if parsed.is_none() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            log::trace!("discarded instrument line {:?}", line);
        }
        parsed
    }

    /// Count a line that was dropped before it could be parsed.
    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        log::trace!("discarded overlong instrument line");
    }
}

enum Fields {
    Timed(f64, f64),
    Untimed(f64),
}

fn parse_fields(line: &str) -> Option<Fields> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let normalized = line.replace(';', ",");
    let cols: Vec<&str> = normalized.split(',').map(|s| s.trim()).collect();
    match cols.as_slice() {
        [temp] => Some(Fields::Untimed(parse_number(temp)?)),
        [t, temp] => Some(Fields::Timed(parse_number(t)?, parse_number(temp)?)),
        _ => None,
    }
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
