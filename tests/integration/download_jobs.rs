// Download batches driven through a scripted runner

use crate::common::{FakeRunner, RecordingSink, ScriptedRun, fake_tools, touch};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use vidtool::engine::{
    DownloadRequest, EngineError, JobContext, MediaType, Resolution, ToolPaths, run_download_job,
};

fn request(dest: &TempDir, urls: &[&str]) -> DownloadRequest {
    DownloadRequest {
        urls: urls.iter().map(|u| u.to_string()).collect(),
        resolution: Resolution::P720,
        media_type: MediaType::Video,
        destination_dir: dest.path().to_path_buf(),
        cookie_file: None,
    }
}

fn setup(runner: FakeRunner) -> (TempDir, Arc<FakeRunner>, Arc<RecordingSink>, JobContext) {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(runner);
    let sink = Arc::new(RecordingSink::default());
    let ctx = JobContext::new(fake_tools(dir.path()), sink.clone()).with_runner(runner.clone());
    (dir, runner, sink, ctx)
}

#[test]
fn failing_url_does_not_stop_the_batch() {
    let (dir, runner, sink, ctx) = setup(FakeRunner::new().script([
        ScriptedRun::ok(),
        ScriptedRun::exit(1).with_lines(&["ERROR: [generic] Unsupported URL"]),
        ScriptedRun::ok(),
    ]));
    let urls = ["https://a.example/1", "https://b.example/2", "https://c.example/3"];

    let outcomes = run_download_job(&ctx, &request(&dir, &urls)).unwrap();

    assert_eq!(runner.run_count(), 3);
    let attempted: Vec<String> = runner
        .runs()
        .iter()
        .map(|args| args.last().unwrap().clone())
        .collect();
    assert_eq!(attempted, urls);

    let items: Vec<&str> = outcomes.iter().map(|o| o.item.as_str()).collect();
    assert_eq!(items, urls);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[1].detail.contains("Unsupported URL"));
    assert!(outcomes[2].is_success());

    // Outcomes reach the sink as items finish, in the same order
    assert_eq!(sink.outcomes(), outcomes);
}

#[test]
fn spawn_failure_is_an_item_failure() {
    let (dir, runner, _sink, ctx) = setup(
        FakeRunner::new().script([ScriptedRun::spawn_failure(), ScriptedRun::ok()]),
    );

    let outcomes =
        run_download_job(&ctx, &request(&dir, &["https://a.example/1", "https://b.example/2"]))
            .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].detail.contains("failed to launch"));
    assert!(outcomes[1].is_success());
    assert_eq!(runner.run_count(), 1);
}

#[test]
fn progress_lines_become_fractions_and_output_path_is_kept() {
    let (dir, _runner, sink, ctx) = setup(FakeRunner::new().script([ScriptedRun::ok()
        .with_lines(&[
            "[youtube] abc: Downloading webpage",
            "[vidtool-progress] downloading 0 NA NA",
            "[vidtool-progress] downloading 250 1000 NA",
            "[vidtool-progress] downloading 500 NA 1000.0",
            "[vidtool-progress] finished 1000 1000 NA",
            "[vidtool-file] /downloads/Some Title.mp4",
        ])]));

    let outcomes = run_download_job(&ctx, &request(&dir, &["https://a.example/1"])).unwrap();

    assert_eq!(sink.fractions(), vec![0.25, 0.5, 1.0]);

    // Marker lines are consumed, everything else is logged verbatim
    let logs = sink.logs();
    assert!(logs.iter().any(|l| l == "[youtube] abc: Downloading webpage"));
    assert!(!logs.iter().any(|l| l.starts_with("[vidtool-")));

    assert_eq!(
        outcomes[0].output_path,
        Some(PathBuf::from("/downloads/Some Title.mp4"))
    );
}

#[test]
fn missing_downloader_aborts_before_any_url() {
    let dir = TempDir::new().unwrap();
    let tools = fake_tools(dir.path());
    let tools = ToolPaths::new(tools.transcoder, Some(dir.path().join("missing-yt-dlp")));
    let runner = Arc::new(FakeRunner::new());
    let ctx = JobContext::new(tools, Arc::new(RecordingSink::default())).with_runner(runner.clone());

    let err = run_download_job(&ctx, &request(&dir, &["https://a.example/1"])).unwrap_err();

    assert!(matches!(err, EngineError::Configuration(_)));
    assert_eq!(runner.run_count(), 0);
}

#[test]
fn missing_destination_is_a_validation_error() {
    let (dir, runner, _sink, ctx) = setup(FakeRunner::new());
    let mut req = request(&dir, &["https://a.example/1"]);
    req.destination_dir = dir.path().join("not-there");

    let err = run_download_job(&ctx, &req).unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(runner.run_count(), 0);
}

#[test]
fn cookie_file_is_only_passed_when_present() {
    let (dir, runner, sink, ctx) = setup(FakeRunner::new());
    let cookies = touch(dir.path(), "cookieyt.txt");

    let mut req = request(&dir, &["https://a.example/1"]);
    req.cookie_file = Some(cookies.clone());
    run_download_job(&ctx, &req).unwrap();

    req.cookie_file = Some(dir.path().join("absent.txt"));
    run_download_job(&ctx, &req).unwrap();

    let runs = runner.runs();
    let cookie_arg = cookies.to_string_lossy().into_owned();
    assert!(runs[0].windows(2).any(|w| w[0] == "--cookies" && w[1] == cookie_arg));
    assert!(!runs[1].contains(&"--cookies".to_string()));
    assert!(sink.logs().iter().any(|l| l.contains("Cookie file not found")));
}

#[test]
fn cancellation_fails_the_running_and_remaining_urls() {
    let (dir, runner, _sink, ctx) = setup(FakeRunner::new().script([ScriptedRun::cancelled()]));
    let urls = ["https://a.example/1", "https://b.example/2", "https://c.example/3"];

    let outcomes = run_download_job(&ctx, &request(&dir, &urls)).unwrap();

    assert_eq!(runner.run_count(), 1);
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.is_success() && o.detail == "cancelled"));
}

#[test]
fn audio_profile_requests_mp3_extraction() {
    let (dir, runner, _sink, ctx) = setup(FakeRunner::new());
    let mut req = request(&dir, &["https://a.example/1"]);
    req.media_type = MediaType::Audio;

    run_download_job(&ctx, &req).unwrap();

    let args = &runner.runs()[0];
    assert!(args.windows(2).any(|w| w == ["-f", "bestaudio/best"]));
    assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
}

#[test]
fn unknown_total_reports_no_fractions() {
    let (dir, _runner, sink, ctx) = setup(FakeRunner::new().script([ScriptedRun::ok()
        .with_lines(&[
            "[vidtool-progress] downloading 1024 NA NA",
            "[vidtool-progress] downloading 4096 NA NA",
            "[generic] live stream, size unknown",
        ])]));

    let outcomes = run_download_job(&ctx, &request(&dir, &["https://a.example/live"])).unwrap();

    assert!(outcomes[0].is_success());
    assert!(sink.fractions().is_empty());
    assert!(sink.logs().iter().any(|l| l == "[generic] live stream, size unknown"));
}
