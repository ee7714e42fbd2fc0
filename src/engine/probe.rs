// Container duration probing using the ffprobe sibling of the configured ffmpeg

use crate::engine::core::{EngineError, ProcessRunner, Result, ToolLocation, is_executable};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Result of a successful probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbedDuration {
    /// Duration in seconds, always > 0
    Known(f64),
    /// The container carries no usable duration (ffprobe printed `N/A` or 0)
    Unknown,
}

impl ProbedDuration {
    pub fn seconds(self) -> Option<f64> {
        match self {
            ProbedDuration::Known(s) => Some(s),
            ProbedDuration::Unknown => None,
        }
    }
}

/// Build the ffprobe invocation that prints only the container duration
pub fn build_probe_cmd(probe: &Path, input: &Path) -> Command {
    let mut cmd = Command::new(probe);
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]);
    cmd.arg(input);
    cmd
}

/// Probe `input` and return its duration.
///
/// A missing probe executable, a non-zero exit, or output that is not a
/// non-negative number all fail with [`EngineError::Probe`].
pub fn probe_duration(
    runner: &dyn ProcessRunner,
    tools: &ToolLocation,
    input: &Path,
) -> Result<ProbedDuration> {
    if !is_executable(&tools.probe) {
        return Err(probe_error(
            input,
            format!("probe executable not found: {}", tools.probe.display()),
        ));
    }

    let output = runner
        .capture(build_probe_cmd(&tools.probe, input))
        .map_err(|e| match e {
            EngineError::Spawn { source, .. } => {
                probe_error(input, format!("failed to run probe: {}", source))
            }
            other => other,
        })?;

    if !output.success() {
        let stderr = output.stderr.trim();
        return Err(probe_error(
            input,
            format!(
                "probe exited with {:?}{}",
                output.code,
                if stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {}", stderr)
                }
            ),
        ));
    }

    let duration = parse_probe_output(input, &output.stdout)?;
    debug!(file = %input.display(), ?duration, "probed duration");
    Ok(duration)
}

/// Parse the single duration token ffprobe prints.
pub fn parse_probe_output(input: &Path, stdout: &str) -> Result<ProbedDuration> {
    let token = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| probe_error(input, "probe printed nothing"))?;

    if token.eq_ignore_ascii_case("n/a") {
        return Ok(ProbedDuration::Unknown);
    }

    let seconds: f64 = token
        .parse()
        .map_err(|_| probe_error(input, format!("unparseable duration '{}'", token)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(probe_error(
            input,
            format!("invalid duration '{}'", token),
        ));
    }

    if seconds == 0.0 {
        Ok(ProbedDuration::Unknown)
    } else {
        Ok(ProbedDuration::Known(seconds))
    }
}

fn probe_error(input: &Path, reason: impl Into<String>) -> EngineError {
    EngineError::Probe {
        path: input.to_path_buf(),
        reason: reason.into(),
    }
}
