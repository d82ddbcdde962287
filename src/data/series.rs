//! Sample buffer: the append-only time/temperature series shared between
//! acquisition, plotting, regression and export.

use std::sync::Arc;

/// One instrument reading: `timestamp` in seconds, `temperature` in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub temperature: f64,
}

impl Sample {
    pub fn new(timestamp: f64, temperature: f64) -> Self {
        Self {
            timestamp,
            temperature,
        }
    }

    /// Plot representation `[t, T]`.
    #[inline]
    pub fn as_point(&self) -> [f64; 2] {
        [self.timestamp, self.temperature]
    }
}

/// Ordered, append-only sequence of samples.
///
/// Storage is an `Arc<Vec<Sample>>`: [`snapshot`](Self::snapshot) is a cheap
/// reference-count bump, and the next [`push`](Self::push) copies the vector
/// only if a snapshot is still alive. A snapshot therefore never changes under
/// its holder, and always contains whole samples.
#[derive(Debug, Clone, Default)]
pub struct SampleSeries {
    samples: Arc<Vec<Sample>>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        Arc::make_mut(&mut self.samples).push(sample);
    }

    pub fn extend<I: IntoIterator<Item = Sample>>(&mut self, samples: I) {
        Arc::make_mut(&mut self.samples).extend(samples);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Immutable view of the current contents.
    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            samples: Arc::clone(&self.samples),
        }
    }

    /// Drop all samples. Only called between sessions; existing snapshots keep
    /// their data.
    pub fn reset(&mut self) {
        self.samples = Arc::new(Vec::new());
    }
}

impl FromIterator<Sample> for SampleSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl From<Vec<Sample>> for SampleSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self {
            samples: Arc::new(samples),
        }
    }
}

/// Read-only view of a [`SampleSeries`] at one point in time.
#[derive(Debug, Clone, Default)]
pub struct SeriesSnapshot {
    samples: Arc<Vec<Sample>>,
}

impl SeriesSnapshot {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Points as `[t, T]` pairs for plotting.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(Sample::as_point).collect()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }

    pub fn temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.temperature)
    }
}

impl std::ops::Deref for SeriesSnapshot {
    type Target = [Sample];

    fn deref(&self) -> &[Sample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_unaffected_by_later_appends() {
        let mut series = SampleSeries::new();
        series.push(Sample::new(0.1, 20.0));
        let snap = series.snapshot();
        series.push(Sample::new(0.2, 21.0));
        assert_eq!(snap.len(), 1);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn reset_keeps_outstanding_snapshots() {
        let mut series: SampleSeries = vec![Sample::new(1.0, 2.0)].into();
        let snap = series.snapshot();
        series.reset();
        assert!(series.is_empty());
        assert_eq!(snap.samples(), &[Sample::new(1.0, 2.0)]);
    }
}
