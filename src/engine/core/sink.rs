use super::types::{JobOutcome, ProgressEvent};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use uuid::Uuid;

/// Receiver of everything a running job reports.
///
/// Called synchronously from the job's worker thread. Implementations must
/// tolerate non-monotonic progress: a collaborator's own progress signal can
/// move backwards (e.g. a downloader switching from the video to the audio
/// stream).
pub trait EventSink: Send + Sync {
    fn on_log(&self, line: &str);
    fn on_progress(&self, event: ProgressEvent);
    fn on_outcome(&self, outcome: JobOutcome);
}

/// Message sent by [`ChannelSink`] for each sink call
#[derive(Debug, Clone)]
pub enum JobEvent {
    Log { job_id: Uuid, line: String },
    Progress { job_id: Uuid, event: ProgressEvent },
    Outcome { job_id: Uuid, outcome: JobOutcome },
}

/// Forwards sink calls over an mpsc channel so a UI thread can drain them
/// at its own pace.
pub struct ChannelSink {
    job_id: Uuid,
    tx: Mutex<Sender<JobEvent>>,
}

impl ChannelSink {
    pub fn new(job_id: Uuid, tx: Sender<JobEvent>) -> Self {
        Self {
            job_id,
            tx: Mutex::new(tx),
        }
    }

    fn send(&self, event: JobEvent) {
        // A dropped receiver only means nobody is watching anymore.
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(event);
        }
    }
}

impl EventSink for ChannelSink {
    fn on_log(&self, line: &str) {
        self.send(JobEvent::Log {
            job_id: self.job_id,
            line: line.to_string(),
        });
    }

    fn on_progress(&self, event: ProgressEvent) {
        self.send(JobEvent::Progress {
            job_id: self.job_id,
            event,
        });
    }

    fn on_outcome(&self, outcome: JobOutcome) {
        self.send(JobEvent::Outcome {
            job_id: self.job_id,
            outcome,
        });
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_log(&self, _line: &str) {}
    fn on_progress(&self, _event: ProgressEvent) {}
    fn on_outcome(&self, _outcome: JobOutcome) {}
}
