// JobEngine: submit on a worker thread, wait, report

use crate::common::{FakeRunner, RecordingSink, ScriptedRun, fake_tools, touch};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use vidtool::engine::{
    ChannelSink, CompressionRequest, ConversionMode, ConversionRequest, DownloadRequest,
    EngineError, JobEngine, JobEvent, JobKind, JobRequest, MediaType, Resolution, ToolPaths,
};

fn conversion(dir: &TempDir) -> JobRequest {
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    touch(&src, "a.mp4");
    touch(&src, "b.mkv");
    JobRequest::Conversion(ConversionRequest {
        mode: ConversionMode::Folder,
        source: src,
        output_format: "webm".to_string(),
        destination_dir: dir.path().to_path_buf(),
    })
}

#[test]
fn submitted_job_reports_its_outcomes() {
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("bin");
    fs::create_dir(&bin).unwrap();
    let runner = Arc::new(FakeRunner::new());
    let engine = JobEngine::with_runner(fake_tools(&bin), runner.clone());
    let sink = Arc::new(RecordingSink::default());

    let handle = engine.submit(conversion(&dir), sink.clone());
    let id = handle.id();
    let report = handle.wait().unwrap();

    assert_eq!(report.job_id, id);
    assert_eq!(report.kind, JobKind::Conversion);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(sink.outcomes(), report.outcomes);
    assert_eq!(runner.run_count(), 2);
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn job_level_error_is_logged_once_and_returned() {
    let dir = TempDir::new().unwrap();
    let input = touch(dir.path(), "clip.mp4");
    let engine = JobEngine::with_runner(ToolPaths::default(), Arc::new(FakeRunner::new()));
    let sink = Arc::new(RecordingSink::default());

    let handle = engine.submit(
        JobRequest::Compression(CompressionRequest {
            input_file: input,
            target_size_mb: 8,
            destination_dir: dir.path().to_path_buf(),
        }),
        sink.clone(),
    );
    let err = handle.wait().unwrap_err();

    assert!(matches!(err, EngineError::Configuration(_)));
    let aborted: Vec<String> = sink
        .logs()
        .into_iter()
        .filter(|l| l.contains("aborted"))
        .collect();
    assert_eq!(aborted.len(), 1);
    assert!(aborted[0].starts_with("compression job aborted"));
    assert!(sink.outcomes().is_empty());
}

#[test]
fn cancelled_download_still_reports_every_url() {
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("bin");
    fs::create_dir(&bin).unwrap();
    let runner = Arc::new(FakeRunner::new().script([ScriptedRun::ok(), ScriptedRun::cancelled()]));
    let engine = JobEngine::with_runner(fake_tools(&bin), runner.clone());

    let handle = engine.submit(
        JobRequest::Download(DownloadRequest {
            urls: vec![
                "https://a.example/1".to_string(),
                "https://b.example/2".to_string(),
                "https://c.example/3".to_string(),
            ],
            resolution: Resolution::Best,
            media_type: MediaType::Both,
            destination_dir: dir.path().to_path_buf(),
            cookie_file: None,
        }),
        Arc::new(RecordingSink::default()),
    );
    let report = handle.wait().unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].is_success());
    assert_eq!(report.outcomes[1].detail, "cancelled");
    assert_eq!(report.outcomes[2].detail, "cancelled");
    assert_eq!(runner.run_count(), 2);
}

#[test]
fn concurrent_jobs_stay_independent() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let bin = TempDir::new().unwrap();
    let engine = JobEngine::with_runner(fake_tools(bin.path()), Arc::new(FakeRunner::new()));

    let (tx, rx) = std::sync::mpsc::channel();
    let a = engine.submit(
        conversion(&first),
        Arc::new(ChannelSink::new(uuid::Uuid::nil(), tx.clone())),
    );
    let b = engine.submit(conversion(&second), Arc::new(ChannelSink::new(uuid::Uuid::nil(), tx)));
    assert_ne!(a.id(), b.id());

    let ra = a.wait().unwrap();
    let rb = b.wait().unwrap();
    assert_eq!(ra.succeeded(), 2);
    assert_eq!(rb.succeeded(), 2);

    let outcome_events = rx
        .try_iter()
        .filter(|e| matches!(e, JobEvent::Outcome { .. }))
        .count();
    assert_eq!(outcome_events, 4);
}
