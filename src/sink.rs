//! Event channel between an acquisition worker and the coordinating context.
//!
//! The worker never touches the sample buffer. It sends [`AcquisitionEvent`]s
//! through an [`AcquisitionSink`]; the owner of the [`Receiver`] drains them and
//! applies them to its [`SampleSeries`](crate::data::series::SampleSeries).

use std::sync::mpsc::{Receiver, SendError, Sender};
use std::sync::Arc;

use crate::data::series::Sample;
use crate::error::StreamReadError;

/// Wakes the coordinating context (e.g. `egui::Context::request_repaint`).
/// Must not block.
pub type RepaintNotifier = Arc<dyn Fn() + Send + Sync + 'static>;

/// Messages sent by the acquisition worker.
#[derive(Debug)]
pub enum AcquisitionEvent {
    /// A parsed sample to append to the buffer.
    SampleAppended(Sample),
    /// Re-read the buffer and redraw. Carries no payload; duplicates are harmless.
    Redraw,
    /// The stream failed; the worker has exited and released the connection.
    Failed(StreamReadError),
}

/// Sender half handed to the worker thread.
#[derive(Clone)]
pub struct AcquisitionSink {
    tx: Sender<AcquisitionEvent>,
    notifier: Option<RepaintNotifier>,
}

impl AcquisitionSink {
    pub fn with_notifier(mut self, notifier: Option<RepaintNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn send_sample(&self, sample: Sample) -> Result<(), SendError<AcquisitionEvent>> {
        self.tx.send(AcquisitionEvent::SampleAppended(sample))
    }

    /// Fire-and-forget redraw request.
    pub fn request_redraw(&self) {
        let _ = self.tx.send(AcquisitionEvent::Redraw);
        self.wake();
    }

    pub fn send_failure(&self, err: StreamReadError) {
        let _ = self.tx.send(AcquisitionEvent::Failed(err));
        self.wake();
    }

    fn wake(&self) {
        if let Some(notify) = &self.notifier {
            notify();
        }
    }
}

/// Create a new channel pair: `(AcquisitionSink, Receiver<AcquisitionEvent>)`.
pub fn channel_acquisition() -> (AcquisitionSink, Receiver<AcquisitionEvent>) {
    let (tx, rx) = std::sync::mpsc::channel();
    (AcquisitionSink { tx, notifier: None }, rx)
}
