use std::path::PathBuf;
use thiserror::Error;

/// Everything a job can fail with.
///
/// Job-level errors (configuration, validation, no compatible input) abort a
/// job before any item runs. Item-level errors (spawn, probe, process) are
/// caught at the item boundary and turned into a failed `JobOutcome`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read duration of {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("{tool} exited with {}{}", code_label(.code), tail_label(.tail))]
    Process {
        tool: String,
        code: Option<i32>,
        tail: Vec<String>,
    },

    #[error("no compatible files found in {0}")]
    NoCompatibleInput(PathBuf),

    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors that abort a whole job rather than a single item.
    pub fn is_job_level(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_)
                | EngineError::Validation(_)
                | EngineError::NoCompatibleInput(_)
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }
}

fn code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn tail_label(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n{}", tail.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
