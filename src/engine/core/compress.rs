use super::context::JobContext;
use super::error::{EngineError, Result};
use super::planner::plan_bitrate;
use super::runner::tool_name;
use super::tools::ToolLocation;
use super::types::{CompressionRequest, DerivedBitrate, JobOutcome};
use crate::engine::probe::{ProbedDuration, probe_duration};
use crate::engine::validate::validate_compression;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

const COMPRESSED_SUFFIX: &str = "_compressed";
const COMPRESSED_EXTENSION: &str = "mp4";

/// `<dest>/<stem>_compressed.mp4`
pub fn compressed_output_path(input: &Path, destination_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    destination_dir.join(format!(
        "{}{}.{}",
        stem, COMPRESSED_SUFFIX, COMPRESSED_EXTENSION
    ))
}

/// Constant-bitrate re-encode: average, buffer and ceiling all pinned to the
/// same rate.
pub fn build_compress_cmd(
    transcoder: &Path,
    input: &Path,
    output: &Path,
    bitrate: DerivedBitrate,
) -> Command {
    let rate = bitrate.as_ffmpeg_arg();
    let mut cmd = Command::new(transcoder);
    cmd.arg("-i").arg(input);
    cmd.args(["-b:v", &rate, "-bufsize", &rate, "-maxrate", &rate]);
    cmd.arg("-y").arg(output);
    cmd
}

/// Known duration in seconds, or a probe error
fn probed_seconds(ctx: &JobContext, tools: &ToolLocation, input: &Path) -> Result<f64> {
    match probe_duration(ctx.runner.as_ref(), tools, input)? {
        ProbedDuration::Known(seconds) => Ok(seconds),
        ProbedDuration::Unknown => Err(EngineError::Probe {
            path: input.to_path_buf(),
            reason: "duration is zero or unknown".to_string(),
        }),
    }
}

/// Validate → Probe → Plan → Transcode → Report, for a single file.
///
/// Request and tool problems are job-level and return `Err` before the file
/// is touched. Once probing starts the file gets exactly one outcome: a
/// failed probe or transcode becomes a failure outcome, and a failed probe
/// never falls back to a default bitrate.
pub fn run_compression_job(
    ctx: &JobContext,
    request: &CompressionRequest,
) -> Result<Vec<JobOutcome>> {
    validate_compression(request)?;
    let tools = ctx.tools.transcoder()?;
    let input = &request.input_file;
    let item = input.display().to_string();

    ctx.log(format!("Probing duration of {}", item));
    let duration = match probed_seconds(ctx, &tools, input) {
        Ok(seconds) => seconds,
        Err(e) => {
            warn!(file = %item, error = %e, "probe failed, not compressing");
            ctx.progress(0.0, "Compression failed");
            ctx.log(format!("Compression failed: {}", e));
            let outcome = JobOutcome::failure(item, e.to_string());
            ctx.outcome(outcome.clone());
            return Ok(vec![outcome]);
        }
    };

    let bitrate = plan_bitrate(request.target_size_mb, duration);
    let output = compressed_output_path(input, &request.destination_dir);
    info!(
        file = %item,
        duration_s = duration,
        target_mb = request.target_size_mb,
        kbps = bitrate.kbps,
        "planned compression"
    );
    ctx.log(format!(
        "Duration {:.2}s, target {} MB, bitrate {}",
        duration, request.target_size_mb, bitrate
    ));

    if ctx.cancel.is_cancelled() {
        let outcome = JobOutcome::failure(item, "cancelled");
        ctx.outcome(outcome.clone());
        return Ok(vec![outcome]);
    }

    let cmd = build_compress_cmd(&tools.transcoder, input, &output, bitrate);
    let tool = tool_name(&cmd);
    ctx.progress(0.0, format!("Compressing {}", item));

    let result = ctx
        .runner
        .run(cmd, &ctx.cancel, &mut |line| ctx.log(line))
        .and_then(|exit| exit.into_result(&tool));

    let outcome = match result {
        Ok(()) => {
            ctx.progress(1.0, "Compression finished");
            ctx.log(format!("Compressed file written to {}", output.display()));
            JobOutcome::success(item, format!("compressed at {}", bitrate), Some(output))
        }
        Err(e) => {
            ctx.progress(0.0, "Compression failed");
            ctx.log(format!("Compression failed: {}", e));
            JobOutcome::failure(item, e.to_string())
        }
    };
    ctx.outcome(outcome.clone());
    Ok(vec![outcome])
}
