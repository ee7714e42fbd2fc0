// Job engine: one worker thread per submitted job

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    CancelToken, EngineError, EventSink, JobContext, JobKind, JobReport, JobRequest,
    ProcessRunner, Result, SystemRunner, ToolPaths, run_job,
};

/// Entry point for callers: owns the tool configuration and launches jobs.
///
/// Jobs never share mutable state with each other; the tool paths are cloned
/// into every job at submit time, so later configuration changes don't affect
/// jobs already running.
pub struct JobEngine {
    tools: ToolPaths,
    runner: Arc<dyn ProcessRunner>,
    active_jobs: Arc<AtomicUsize>,
}

impl JobEngine {
    pub fn new(tools: ToolPaths) -> Self {
        Self::with_runner(tools, Arc::new(SystemRunner))
    }

    pub fn with_runner(tools: ToolPaths, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            tools,
            runner,
            active_jobs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Number of jobs whose worker thread has not finished yet
    pub fn active_count(&self) -> usize {
        self.active_jobs.load(Ordering::SeqCst)
    }

    /// Start `request` on its own worker thread and return immediately.
    ///
    /// A job-level failure is logged once through `sink` and returned from
    /// [`JobHandle::wait`].
    pub fn submit(&self, request: JobRequest, sink: Arc<dyn EventSink>) -> JobHandle {
        let id = Uuid::new_v4();
        let kind = request.kind();
        let cancel = CancelToken::new();
        let ctx = JobContext::new(self.tools.clone(), sink)
            .with_runner(self.runner.clone())
            .with_cancel(cancel.clone());
        let active = self.active_jobs.clone();

        active.fetch_add(1, Ordering::SeqCst);
        info!(job_id = %id, %kind, "job submitted");

        let join = thread::spawn(move || {
            let result = run_job(&ctx, &request);
            active.fetch_sub(1, Ordering::SeqCst);

            match result {
                Ok(outcomes) => {
                    let report = JobReport {
                        job_id: id,
                        kind,
                        outcomes,
                    };
                    info!(
                        job_id = %id,
                        succeeded = report.succeeded(),
                        failed = report.failed(),
                        "job finished"
                    );
                    Ok(report)
                }
                Err(e) => {
                    if e.is_job_level() {
                        warn!(job_id = %id, %kind, error = %e, "job rejected");
                    } else {
                        error!(job_id = %id, %kind, error = %e, "job aborted");
                    }
                    ctx.log(format!("{} job aborted: {}", kind, e));
                    Err(e)
                }
            }
        });

        JobHandle {
            id,
            kind,
            cancel,
            join,
        }
    }
}

/// Handle to a running job
pub struct JobHandle {
    id: Uuid,
    kind: JobKind,
    cancel: CancelToken,
    join: JoinHandle<Result<JobReport>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Ask the job to stop. The running tool is terminated and items not yet
    /// started are reported as cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the job is done
    pub fn wait(self) -> Result<JobReport> {
        let id = self.id;
        self.join.join().unwrap_or_else(|_| {
            Err(EngineError::Io(io::Error::other(format!(
                "worker thread for job {} panicked",
                id
            ))))
        })
    }
}
