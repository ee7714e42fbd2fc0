use super::batch::run_items;
use super::context::JobContext;
use super::error::{EngineError, Result};
use super::runner::tool_name;
use super::scan::scan_folder;
use super::types::{ConversionMode, ConversionRequest, JobOutcome};
use crate::engine::validate::validate_conversion;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

const CONVERTED_SUFFIX: &str = "_converted";

/// `<dest>/<stem>_converted.<format>`
pub fn converted_output_path(input: &Path, destination_dir: &Path, format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    destination_dir.join(format!("{}{}.{}", stem, CONVERTED_SUFFIX, format))
}

/// The transcoder picks codecs from the output extension; existing outputs
/// are overwritten.
pub fn build_convert_cmd(transcoder: &Path, input: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(transcoder);
    cmd.arg("-y").arg("-i").arg(input).arg(output);
    cmd
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn convert_one(
    ctx: &JobContext,
    transcoder: &Path,
    input: &Path,
    destination_dir: &Path,
    format: &str,
) -> Result<JobOutcome> {
    let output = converted_output_path(input, destination_dir, format);
    let cmd = build_convert_cmd(transcoder, input, &output);
    let tool = tool_name(&cmd);

    ctx.log(format!("Converting {} -> {}", display_name(input), display_name(&output)));
    ctx.runner
        .run(cmd, &ctx.cancel, &mut |line| ctx.log(line))?
        .into_result(&tool)?;

    ctx.log(format!("Converted: {}", output.display()));
    Ok(JobOutcome::success(
        display_name(input),
        format!("converted to {}", format),
        Some(output),
    ))
}

/// Convert one file, or every compatible file directly inside a folder.
///
/// A folder with no compatible file fails with
/// [`EngineError::NoCompatibleInput`] before any process is started.
pub fn run_conversion_job(
    ctx: &JobContext,
    request: &ConversionRequest,
) -> Result<Vec<JobOutcome>> {
    let format = validate_conversion(request)?;
    let transcoder = ctx.tools.transcoder()?.transcoder;

    let inputs = match request.mode {
        ConversionMode::SingleFile => vec![request.source.clone()],
        ConversionMode::Folder => {
            let files = scan_folder(&request.source);
            if files.is_empty() {
                return Err(EngineError::NoCompatibleInput(request.source.clone()));
            }
            ctx.log(format!(
                "{} compatible file(s) found in {}",
                files.len(),
                request.source.display()
            ));
            files
        }
    };
    info!(
        count = inputs.len(),
        format = %format,
        mode = ?request.mode,
        "starting conversion job"
    );

    let outcomes = run_items(
        ctx,
        &inputs,
        |path| display_name(path),
        |_, input| convert_one(ctx, &transcoder, input, &request.destination_dir, &format),
        |done, total, outcome| match request.mode {
            ConversionMode::SingleFile if outcome.is_success() => {
                ctx.progress(1.0, "Conversion finished")
            }
            ConversionMode::SingleFile => ctx.progress(0.0, "Conversion failed"),
            ConversionMode::Folder => ctx.progress(
                done as f64 / total as f64,
                format!("{}/{} file(s) processed", done, total),
            ),
        },
    );

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    ctx.log(format!(
        "Conversion finished: {} succeeded, {} failed",
        succeeded,
        outcomes.len() - succeeded
    ));
    Ok(outcomes)
}
