use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Height cap requested for a video download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "144p")]
    P144,
}

impl Resolution {
    pub const ALL: [Resolution; 7] = [
        Resolution::Best,
        Resolution::P1080,
        Resolution::P720,
        Resolution::P480,
        Resolution::P360,
        Resolution::P240,
        Resolution::P144,
    ];

    /// Maximum video height, or None for "best" (no cap)
    pub fn max_height(self) -> Option<u32> {
        match self {
            Resolution::Best => None,
            Resolution::P1080 => Some(1080),
            Resolution::P720 => Some(720),
            Resolution::P480 => Some(480),
            Resolution::P360 => Some(360),
            Resolution::P240 => Some(240),
            Resolution::P144 => Some(144),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resolution::Best => "best",
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
            Resolution::P360 => "360p",
            Resolution::P240 => "240p",
            Resolution::P144 => "144p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Resolution::ALL
            .into_iter()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| format!("unknown resolution '{}'", s))
    }
}

/// What to keep from a remote item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
    Both,
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            "both" => Ok(MediaType::Both),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
    pub resolution: Resolution,
    pub media_type: MediaType,
    pub destination_dir: PathBuf,
    pub cookie_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionRequest {
    pub input_file: PathBuf,
    /// Target output size in MiB; 0 means "maximum compression" with no size target
    pub target_size_mb: u32,
    pub destination_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    SingleFile,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub mode: ConversionMode,
    pub source: PathBuf,
    /// Target extension without the leading dot
    pub output_format: String,
    pub destination_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobRequest {
    Download(DownloadRequest),
    Compression(CompressionRequest),
    Conversion(ConversionRequest),
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::Download(_) => JobKind::Download,
            JobRequest::Compression(_) => JobKind::Compression,
            JobRequest::Conversion(_) => JobKind::Conversion,
        }
    }

    pub fn destination_dir(&self) -> &PathBuf {
        match self {
            JobRequest::Download(r) => &r.destination_dir,
            JobRequest::Compression(r) => &r.destination_dir,
            JobRequest::Conversion(r) => &r.destination_dir,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Download,
    Compression,
    Conversion,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Download => f.write_str("download"),
            JobKind::Compression => f.write_str("compression"),
            JobKind::Conversion => f.write_str("conversion"),
        }
    }
}

/// Lifecycle of one item (one URL, one file) inside a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Succeeded | ItemState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub fraction: f64,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(fraction: f64, message: impl Into<String>) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Terminal record for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// URL or file name
    pub item: String,
    pub status: OutcomeStatus,
    pub detail: String,
    pub output_path: Option<PathBuf>,
}

impl JobOutcome {
    pub fn success(item: impl Into<String>, detail: impl Into<String>, output: Option<PathBuf>) -> Self {
        Self {
            item: item.into(),
            status: OutcomeStatus::Success,
            detail: detail.into(),
            output_path: output,
        }
    }

    pub fn failure(item: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            status: OutcomeStatus::Failure,
            detail: detail.into(),
            output_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Bitrate computed for a single compression run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedBitrate {
    pub kbps: u64,
}

impl DerivedBitrate {
    /// ffmpeg rate argument, e.g. "500k"
    pub fn as_ffmpeg_arg(&self) -> String {
        format!("{}k", self.kbps)
    }
}

impl fmt::Display for DerivedBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.kbps)
    }
}

/// What a finished job hands back to its caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub outcomes: Vec<JobOutcome>,
}

impl JobReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}
