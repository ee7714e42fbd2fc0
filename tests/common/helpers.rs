use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use vidtool::engine::{EventSink, JobOutcome, ProgressEvent, ToolPaths};

/// Program followed by its arguments, for assertions
pub fn args_of(cmd: &Command) -> Vec<String> {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"fake media").unwrap();
    path
}

/// Like [`touch`], with the execute bits set so tool resolution accepts it
pub fn touch_tool(dir: &Path, name: &str) -> PathBuf {
    let path = touch(dir, name);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// Placeholder ffmpeg, ffprobe and yt-dlp files inside `dir`. They only
/// need to be executable files; a `FakeRunner` never runs them.
pub fn fake_tools(dir: &Path) -> ToolPaths {
    let ffmpeg = touch_tool(dir, "ffmpeg");
    touch_tool(dir, "ffprobe");
    let downloader = touch_tool(dir, "yt-dlp");
    ToolPaths::new(Some(ffmpeg), Some(downloader))
}

/// Keeps every event for later inspection
#[derive(Default)]
pub struct RecordingSink {
    pub logs: Mutex<Vec<String>>,
    pub progress: Mutex<Vec<ProgressEvent>>,
    pub outcomes: Mutex<Vec<JobOutcome>>,
}

impl RecordingSink {
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.fraction)
            .collect()
    }

    pub fn outcomes(&self) -> Vec<JobOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_log(&self, line: &str) {
        self.logs.lock().unwrap().push(line.to_string());
    }

    fn on_progress(&self, event: ProgressEvent) {
        self.progress.lock().unwrap().push(event);
    }

    fn on_outcome(&self, outcome: JobOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }
}
