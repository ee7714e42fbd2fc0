mod batch;
mod compress;
mod context;
mod convert;
mod download;
mod error;
mod planner;
mod runner;
mod scan;
mod sink;
mod tools;
mod types;

pub use compress::{build_compress_cmd, compressed_output_path, run_compression_job};
pub use context::JobContext;
pub use convert::{build_convert_cmd, converted_output_path, run_conversion_job};
pub use download::{
    DEFAULT_COOKIE_FILE, DownloadProgress, DownloadStatus, build_download_cmd, extract_urls,
    format_selector, parse_output_line, parse_progress_line, run_download_job,
};
pub use error::{EngineError, Result};
pub use planner::{MAX_COMPRESSION_KBPS, plan_bitrate};
pub use runner::{
    CancelToken, CapturedOutput, ProcessExit, ProcessRunner, SystemRunner, TAIL_LINES,
    format_command, tool_name,
};
pub use scan::{
    FALLBACK_FORMATS, MediaCategory, category_for_extension, folder_extensions,
    is_convertible_input, offered_formats, scan_folder,
};
pub use sink::{ChannelSink, EventSink, JobEvent, NullSink};
pub use tools::{
    DEFAULT_DOWNLOADER, ToolLocation, ToolPaths, derive_probe_path, is_executable,
    resolve_executable,
};
pub use types::{
    CompressionRequest, ConversionMode, ConversionRequest, DerivedBitrate, DownloadRequest,
    ItemState, JobKind, JobOutcome, JobReport, JobRequest, MediaType, OutcomeStatus,
    ProgressEvent, Resolution,
};

/// Run one job to completion on the calling thread
pub fn run_job(ctx: &JobContext, request: &JobRequest) -> Result<Vec<JobOutcome>> {
    match request {
        JobRequest::Download(r) => run_download_job(ctx, r),
        JobRequest::Compression(r) => run_compression_job(ctx, r),
        JobRequest::Conversion(r) => run_conversion_job(ctx, r),
    }
}
