use super::error::{EngineError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name fragment the transcoder binary must contain for the probe to be derivable
const TRANSCODER_STEM: &str = "ffmpeg";
const PROBE_STEM: &str = "ffprobe";

/// Default downloader executable, looked up on PATH
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";

/// Resolved transcoder and its sibling probe executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLocation {
    pub transcoder: PathBuf,
    pub probe: PathBuf,
}

impl ToolLocation {
    /// Validate a configured transcoder path and derive the probe next to it.
    ///
    /// The probe itself is not checked here: a missing probe only matters to
    /// jobs that probe, and surfaces there as a probe error.
    pub fn from_transcoder(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(EngineError::configuration(
                "transcoder path is not configured (run `vidtool set-ffmpeg <path>`)",
            ));
        }
        let transcoder = resolve_executable(path).ok_or_else(|| {
            EngineError::configuration(format!(
                "transcoder not found or not executable: {}",
                path.display()
            ))
        })?;
        let probe = derive_probe_path(&transcoder)?;
        Ok(Self { transcoder, probe })
    }
}

/// Derive the probe executable from the transcoder path.
///
/// `.../ffmpeg.exe` becomes `.../ffprobe.exe`, `/usr/bin/ffmpeg-6` becomes
/// `/usr/bin/ffprobe-6`. Fails when the file name does not contain `ffmpeg`
/// (case-insensitive), since there is then no sibling to guess.
pub fn derive_probe_path(transcoder: &Path) -> Result<PathBuf> {
    let file_name = transcoder
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            EngineError::configuration(format!(
                "transcoder path has no usable file name: {}",
                transcoder.display()
            ))
        })?;

    let lower = file_name.to_ascii_lowercase();
    let idx = lower.find(TRANSCODER_STEM).ok_or_else(|| {
        EngineError::configuration(format!(
            "cannot derive probe location from '{}': file name does not contain '{}'",
            file_name, TRANSCODER_STEM
        ))
    })?;

    let probe_name = format!(
        "{}{}{}",
        &file_name[..idx],
        PROBE_STEM,
        &file_name[idx + TRANSCODER_STEM.len()..]
    );
    Ok(transcoder.with_file_name(probe_name))
}

/// A regular file the current user may run. On unix at least one execute
/// bit must be set.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Resolve an executable: paths with a directory component must exist as
/// executable files, bare names are searched on PATH.
pub fn resolve_executable(path: &Path) -> Option<PathBuf> {
    let has_dir = path
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());

    if has_dir || path.is_absolute() {
        return is_executable(path).then(|| path.to_path_buf());
    }
    if is_executable(path) {
        return Some(path.to_path_buf());
    }

    let search = env::var_os("PATH")?;
    env::split_paths(&search).find_map(|dir| {
        let candidate = dir.join(path);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if is_executable(&exe) {
                return Some(exe);
            }
        }
        None
    })
}

/// Configured tool paths, as read from the persisted configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPaths {
    pub transcoder: Option<PathBuf>,
    pub downloader: Option<PathBuf>,
}

impl ToolPaths {
    pub fn new(transcoder: Option<PathBuf>, downloader: Option<PathBuf>) -> Self {
        Self {
            transcoder,
            downloader,
        }
    }

    pub fn transcoder(&self) -> Result<ToolLocation> {
        match &self.transcoder {
            Some(path) => ToolLocation::from_transcoder(path),
            None => Err(EngineError::configuration(
                "transcoder path is not configured (run `vidtool set-ffmpeg <path>`)",
            )),
        }
    }

    pub fn downloader(&self) -> Result<PathBuf> {
        let wanted = self
            .downloader
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADER));
        resolve_executable(&wanted).ok_or_else(|| {
            EngineError::configuration(format!(
                "downloader not found: {}",
                wanted.display()
            ))
        })
    }
}
