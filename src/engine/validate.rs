//! Request validation, run before any external process is spawned.

use crate::engine::core::{
    CompressionRequest, ConversionMode, ConversionRequest, DownloadRequest, EngineError,
    JobRequest, Result,
};
use std::path::Path;

/// Check every path and field of a request.
///
/// A request that fails here never reaches the process runner.
pub fn validate_request(request: &JobRequest) -> Result<()> {
    match request {
        JobRequest::Download(r) => validate_download(r),
        JobRequest::Compression(r) => validate_compression(r),
        JobRequest::Conversion(r) => validate_conversion(r).map(|_| ()),
    }
}

pub fn validate_download(request: &DownloadRequest) -> Result<()> {
    if request.urls.iter().all(|u| u.trim().is_empty()) {
        return Err(EngineError::validation("no URL to download"));
    }
    validate_destination(&request.destination_dir)
}

pub fn validate_compression(request: &CompressionRequest) -> Result<()> {
    validate_input_file(&request.input_file)?;
    validate_destination(&request.destination_dir)
}

/// Validate a conversion request and return its normalized output format
pub fn validate_conversion(request: &ConversionRequest) -> Result<String> {
    match request.mode {
        ConversionMode::SingleFile => validate_input_file(&request.source)?,
        ConversionMode::Folder => {
            if !request.source.is_dir() {
                return Err(EngineError::validation(format!(
                    "source folder does not exist: {}",
                    request.source.display()
                )));
            }
        }
    }
    let format = normalize_output_format(&request.output_format)?;
    validate_destination(&request.destination_dir)?;
    Ok(format)
}

pub fn validate_input_file(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::validation("no input file given"));
    }
    if !path.is_file() {
        return Err(EngineError::validation(format!(
            "input file does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

pub fn validate_destination(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(EngineError::validation("no destination folder given"));
    }
    if !dir.is_dir() {
        return Err(EngineError::validation(format!(
            "destination folder does not exist: {}",
            dir.display()
        )));
    }
    Ok(())
}

/// Trim, drop a leading dot and lowercase: " .MP4 " -> "mp4"
pub fn normalize_output_format(format: &str) -> Result<String> {
    let format = format.trim().trim_start_matches('.').to_ascii_lowercase();
    if format.is_empty() {
        return Err(EngineError::validation("no output format chosen"));
    }
    if !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::validation(format!(
            "output format must be a plain extension, got '{}'",
            format
        )));
    }
    Ok(format)
}
