use super::runner::{CancelToken, ProcessRunner, SystemRunner};
use super::sink::EventSink;
use super::tools::ToolPaths;
use super::types::{JobOutcome, ProgressEvent};
use std::sync::Arc;
use tracing::info;

/// Everything one job invocation needs from its surroundings.
///
/// Built per job; nothing in here is shared mutably between jobs.
#[derive(Clone)]
pub struct JobContext {
    pub tools: ToolPaths,
    pub runner: Arc<dyn ProcessRunner>,
    pub sink: Arc<dyn EventSink>,
    pub cancel: CancelToken,
}

impl JobContext {
    pub fn new(tools: ToolPaths, sink: Arc<dyn EventSink>) -> Self {
        Self {
            tools,
            runner: Arc::new(SystemRunner),
            sink,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn log(&self, line: impl AsRef<str>) {
        self.sink.on_log(line.as_ref());
    }

    pub(crate) fn progress(&self, fraction: f64, message: impl Into<String>) {
        self.sink.on_progress(ProgressEvent::new(fraction, message));
    }

    pub(crate) fn outcome(&self, outcome: JobOutcome) {
        info!(
            item = %outcome.item,
            status = ?outcome.status,
            detail = %outcome.detail,
            "item finished"
        );
        self.sink.on_outcome(outcome);
    }
}
