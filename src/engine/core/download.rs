use super::batch::run_items;
use super::context::JobContext;
use super::error::Result;
use super::runner::tool_name;
use super::types::{DownloadRequest, JobOutcome, MediaType};
use crate::engine::validate::validate_download;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Cookie file looked up next to the config when none is configured
pub const DEFAULT_COOKIE_FILE: &str = "cookieyt.txt";

pub const AUDIO_FORMAT: &str = "mp3";
pub const AUDIO_QUALITY: &str = "192K";
pub const MERGE_FORMAT: &str = "mp4";
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

const PROGRESS_MARKER: &str = "[vidtool-progress]";
const FILE_MARKER: &str = "[vidtool-file]";

/// Every field comes out as `NA` when the downloader doesn't know it
const PROGRESS_TEMPLATE: &str = "download:[vidtool-progress] %(progress.status)s \
     %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";
const FILE_TEMPLATE: &str = "after_move:[vidtool-file] %(filepath)s";

/// Pull every `http://` / `https://` link out of pasted text.
///
/// A link runs from its scheme to the next whitespace. Order is preserved and
/// duplicates are kept.
pub fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| find_scheme(token).map(|start| token[start..].to_string()))
        .collect()
}

fn find_scheme(s: &str) -> Option<usize> {
    match (s.find("http://"), s.find("https://")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Format selector for a media type / resolution pair
pub fn format_selector(request: &DownloadRequest) -> String {
    match request.media_type {
        MediaType::Audio => "bestaudio/best".to_string(),
        MediaType::Both => "bestvideo+bestaudio/best".to_string(),
        MediaType::Video => match request.resolution.max_height() {
            Some(h) => format!("bestvideo[height<={}]+bestaudio/best", h),
            None => "bestvideo+bestaudio/best".to_string(),
        },
    }
}

/// Build the downloader invocation for a single URL
pub fn build_download_cmd(
    downloader: &Path,
    transcoder: &Path,
    request: &DownloadRequest,
    url: &str,
    cookie_file: Option<&Path>,
) -> Command {
    let mut cmd = Command::new(downloader);
    cmd.args(["--newline", "--no-playlist", "--progress"]);
    cmd.arg("--progress-template").arg(PROGRESS_TEMPLATE);
    cmd.arg("--print").arg(FILE_TEMPLATE);
    cmd.arg("-o").arg(request.destination_dir.join(OUTPUT_TEMPLATE));
    cmd.arg("--ffmpeg-location").arg(transcoder);

    if let Some(cookies) = cookie_file {
        cmd.arg("--cookies").arg(cookies);
    }

    cmd.arg("-f").arg(format_selector(request));
    match request.media_type {
        MediaType::Audio => {
            cmd.args(["-x", "--audio-format", AUDIO_FORMAT]);
            cmd.args(["--audio-quality", AUDIO_QUALITY]);
        }
        MediaType::Video | MediaType::Both => {
            cmd.args(["--merge-output-format", MERGE_FORMAT]);
        }
    }

    cmd.arg("--").arg(url);
    cmd
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloading,
    Finished,
    Error,
    Other(String),
}

/// One parsed progress report from the downloader
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub status: DownloadStatus,
    pub downloaded_bytes: Option<u64>,
    /// Exact total if known, otherwise the estimate, otherwise None
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Fraction in `[0, 1]`, or None while the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.status == DownloadStatus::Finished {
            return Some(1.0);
        }
        match (self.downloaded_bytes, self.total_bytes) {
            (Some(done), Some(total)) if total > 0 => {
                Some((done as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Parse a progress line emitted through the progress template.
/// Any other output line yields None.
pub fn parse_progress_line(line: &str) -> Option<DownloadProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split_whitespace();

    let status = match fields.next()? {
        "downloading" => DownloadStatus::Downloading,
        "finished" => DownloadStatus::Finished,
        "error" => DownloadStatus::Error,
        other => DownloadStatus::Other(other.to_string()),
    };
    let downloaded_bytes = fields.next().and_then(parse_bytes);
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(DownloadProgress {
        status,
        downloaded_bytes,
        total_bytes: total.or(estimate),
    })
}

// Sizes may come out as floats ("1048576.0") or "NA"
fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

/// Final file path announced by the downloader after post-processing
pub fn parse_output_line(line: &str) -> Option<PathBuf> {
    let path = line.trim().strip_prefix(FILE_MARKER)?.trim();
    (!path.is_empty() && path != "NA").then(|| PathBuf::from(path))
}

/// Run a download job: every URL in order, one at a time.
///
/// Progress events carry only fractions the downloader reported; a URL whose
/// total size stays unknown produces log lines alone.
///
/// Request and tool problems abort before any URL is attempted. A failing
/// URL is recorded and the next one still runs.
pub fn run_download_job(ctx: &JobContext, request: &DownloadRequest) -> Result<Vec<JobOutcome>> {
    validate_download(request)?;
    let downloader = ctx.tools.downloader()?;
    let transcoder = ctx.tools.transcoder()?.transcoder;

    let cookie_file = match &request.cookie_file {
        Some(path) if path.is_file() => Some(path.clone()),
        Some(path) => {
            warn!(path = %path.display(), "cookie file not found, continuing without it");
            ctx.log(format!(
                "Cookie file not found, continuing without it: {}",
                path.display()
            ));
            None
        }
        None => None,
    };

    let urls: Vec<&str> = request
        .urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();
    info!(
        count = urls.len(),
        media = ?request.media_type,
        resolution = %request.resolution,
        "starting download job"
    );

    let outcomes = run_items(
        ctx,
        &urls,
        |url| url.to_string(),
        |idx, url| {
            ctx.log(format!("Downloading ({}/{}): {}", idx + 1, urls.len(), url));

            let cmd = build_download_cmd(
                &downloader,
                &transcoder,
                request,
                url,
                cookie_file.as_deref(),
            );
            let tool = tool_name(&cmd);
            let mut output_path = None;
            let mut last_percent = None;

            let exit = ctx.runner.run(cmd, &ctx.cancel, &mut |line| {
                if let Some(progress) = parse_progress_line(line) {
                    if let Some(fraction) = progress.fraction() {
                        let percent = (fraction * 100.0).floor() as u32;
                        if last_percent != Some(percent) {
                            last_percent = Some(percent);
                            ctx.progress(fraction, format!("{}: {}%", url, percent));
                        }
                    }
                    if progress.status == DownloadStatus::Finished {
                        ctx.log("Download finished, post-processing");
                    }
                } else if let Some(path) = parse_output_line(line) {
                    debug!(path = %path.display(), "downloader reported output");
                    output_path = Some(path);
                } else {
                    ctx.log(line);
                }
            })?;
            exit.into_result(&tool)?;

            ctx.log(format!("Downloaded: {}", url));
            Ok(JobOutcome::success(*url, "downloaded", output_path))
        },
        |_, _, _| {},
    );

    Ok(outcomes)
}
