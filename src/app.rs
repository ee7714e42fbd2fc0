use crate::cli::{Cli, Commands};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{self, Command};
use std::sync::{Arc, Mutex};
use vidtool::config::Config;
use vidtool::engine::{
    self, CompressionRequest, ConversionMode, ConversionRequest, DownloadRequest, EventSink,
    JobEngine, JobOutcome, JobReport, JobRequest, MediaType, ProcessRunner, ProgressEvent,
    Resolution, SystemRunner, ToolLocation,
};

pub fn run(cli: Cli) {
    let json = cli.json;
    match cli.command {
        Commands::Download {
            urls,
            from_file,
            resolution,
            media,
            dest,
            cookies,
        } => handle_download(urls, from_file, resolution, media, dest, cookies, json),
        Commands::Compress {
            file,
            target_mb,
            dest,
        } => handle_compress(file, target_mb, dest, json),
        Commands::Convert {
            source,
            format,
            folder,
            dest,
        } => handle_convert(source, format, folder, dest, json),
        Commands::Formats { path } => handle_formats(&path, json),
        Commands::Probe { file } => handle_probe(&file),
        Commands::CheckTools => handle_check_tools(),
        Commands::SetFfmpeg { path } => handle_set_ffmpeg(path),
        Commands::InitConfig => handle_init_config(),
    }
}

/// Prints engine events to the terminal. With `--json` everything goes to
/// stderr so stdout carries only the report.
struct TerminalSink {
    to_stderr: bool,
    last_percent: Mutex<Option<u32>>,
}

impl TerminalSink {
    fn new(to_stderr: bool) -> Self {
        Self {
            to_stderr,
            last_percent: Mutex::new(None),
        }
    }

    fn emit(&self, line: &str) {
        if self.to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

impl EventSink for TerminalSink {
    fn on_log(&self, line: &str) {
        self.emit(line);
    }

    fn on_progress(&self, event: ProgressEvent) {
        let percent = (event.fraction * 100.0).round() as u32;
        if let Ok(mut last) = self.last_percent.lock() {
            if *last == Some(percent) {
                return;
            }
            *last = Some(percent);
        }
        self.emit(&format!("[{:>3}%] {}", percent, event.message));
    }

    fn on_outcome(&self, outcome: JobOutcome) {
        let mark = if outcome.is_success() { "OK  " } else { "FAIL" };
        self.emit(&format!("{} {}: {}", mark, outcome.item, outcome.detail));
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            eprintln!("Using built-in defaults. Run 'vidtool init-config' to inspect the config.");
            Config::default()
        }
    }
}

fn resolve_destination(config: &Config, given: Option<PathBuf>, kind: engine::JobKind) -> PathBuf {
    match given.or_else(|| config.destination(kind).map(Path::to_path_buf)) {
        Some(dir) => dir,
        None => {
            eprintln!("Error: no destination folder given (use --dest)");
            process::exit(2);
        }
    }
}

fn handle_download(
    urls: Vec<String>,
    from_file: Option<PathBuf>,
    resolution: Resolution,
    media: MediaType,
    dest: Option<PathBuf>,
    cookies: Option<PathBuf>,
    json: bool,
) {
    let config = load_config();

    let mut text = urls.join("\n");
    if let Some(path) = from_file {
        match fs::read_to_string(&path) {
            Ok(contents) => {
                text.push('\n');
                text.push_str(&contents);
            }
            Err(e) => {
                eprintln!("Error: failed to read {}: {}", path.display(), e);
                process::exit(2);
            }
        }
    }

    let cookie_file = cookies.or_else(|| {
        Config::config_dir()
            .ok()
            .map(|dir| config.cookie_file_in(&dir))
    });

    let request = DownloadRequest {
        urls: engine::extract_urls(&text),
        resolution,
        media_type: media,
        destination_dir: resolve_destination(&config, dest, engine::JobKind::Download),
        cookie_file,
    };
    run_and_report(config, JobRequest::Download(request), json);
}

fn handle_compress(file: PathBuf, target_mb: u32, dest: Option<PathBuf>, json: bool) {
    let config = load_config();
    let request = CompressionRequest {
        input_file: file,
        target_size_mb: target_mb,
        destination_dir: resolve_destination(&config, dest, engine::JobKind::Compression),
    };
    run_and_report(config, JobRequest::Compression(request), json);
}

fn handle_convert(source: PathBuf, format: String, folder: bool, dest: Option<PathBuf>, json: bool) {
    let config = load_config();
    let request = ConversionRequest {
        mode: if folder {
            ConversionMode::Folder
        } else {
            ConversionMode::SingleFile
        },
        source,
        output_format: format,
        destination_dir: resolve_destination(&config, dest, engine::JobKind::Conversion),
    };
    run_and_report(config, JobRequest::Conversion(request), json);
}

/// Submit one job, wait for it, print the report and exit non-zero when
/// anything failed.
fn run_and_report(mut config: Config, request: JobRequest, json: bool) {
    let kind = request.kind();
    let destination = request.destination_dir().clone();
    let engine = JobEngine::new(config.tool_paths());
    let handle = engine.submit(request, Arc::new(TerminalSink::new(json)));

    let report = match handle.wait() {
        Ok(report) => report,
        // The worker already logged the error through the sink
        Err(_) => process::exit(1),
    };

    if report.succeeded() > 0 && config.remember_destination(kind, &destination) {
        if let Err(e) = config.save() {
            eprintln!("Warning: could not save config: {:#}", e);
        }
    }

    print_report(&report, json);
    if report.failed() > 0 {
        process::exit(1);
    }
}

fn print_report(report: &JobReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!();
    println!(
        "{} job finished: {} succeeded, {} failed",
        report.kind,
        report.succeeded(),
        report.failed()
    );
    for path in report.outcomes.iter().filter_map(|o| o.output_path.as_ref()) {
        println!("  {}", path.display());
    }
}

fn handle_formats(path: &Path, json: bool) {
    let extensions: Vec<String> = if path.is_dir() {
        engine::folder_extensions(path)
    } else {
        path.extension()
            .map(|e| vec![e.to_string_lossy().to_ascii_lowercase()])
            .unwrap_or_default()
    };
    let formats = engine::offered_formats(&extensions);

    if json {
        match serde_json::to_string(&formats) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", formats.join(" "));
    }
}

fn handle_probe(file: &Path) {
    let config = load_config();
    let tools = match config.tool_paths().transcoder() {
        Ok(tools) => tools,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    match engine::probe_duration(&SystemRunner, &tools, file) {
        Ok(engine::ProbedDuration::Known(seconds)) => {
            println!("Duration: {:.2} seconds", seconds);
        }
        Ok(engine::ProbedDuration::Unknown) => {
            println!("Duration: unknown");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn first_output_line(program: &Path, arg: &str) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.arg(arg);
    let output = SystemRunner.capture(cmd).ok()?;
    if !output.success() {
        return None;
    }
    output.stdout.lines().next().map(|l| l.trim().to_string())
}

fn handle_check_tools() {
    let config = load_config();
    let tools = config.tool_paths();
    let mut ok = true;

    match tools.transcoder() {
        Ok(location) => {
            match first_output_line(&location.transcoder, "-version") {
                Some(version) => println!("ffmpeg found: {}", version),
                None => println!("ffmpeg at {} did not report a version", location.transcoder.display()),
            }
            match first_output_line(&location.probe, "-version") {
                Some(version) => println!("ffprobe found: {}", version),
                None => {
                    ok = false;
                    println!("ffprobe not usable at {}", location.probe.display());
                }
            }
        }
        Err(e) => {
            ok = false;
            println!("ffmpeg: {}", e);
        }
    }

    match tools.downloader() {
        Ok(path) => match first_output_line(&path, "--version") {
            Some(version) => println!("downloader found: {} ({})", path.display(), version),
            None => println!("downloader at {} did not report a version", path.display()),
        },
        Err(e) => {
            ok = false;
            println!("downloader: {}", e);
        }
    }

    let _ = io::stdout().flush();
    if !ok {
        process::exit(1);
    }
}

fn handle_set_ffmpeg(path: PathBuf) {
    let location = match ToolLocation::from_transcoder(&path) {
        Ok(location) => location,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if !engine::is_executable(&location.probe) {
        eprintln!(
            "Warning: ffprobe not found at {}; compression will not work until it is",
            location.probe.display()
        );
    }

    let mut config = load_config();
    config.tools.ffmpeg_path = Some(location.transcoder.clone());
    if let Err(e) = config.save() {
        eprintln!("Failed to save config: {:#}", e);
        process::exit(1);
    }
    println!("ffmpeg path saved: {}", location.transcoder.display());
}

fn handle_init_config() {
    let path = match Config::config_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    if !path.exists() {
        println!("No config file yet, creating default config...");
        if let Err(e) = Config::ensure_default() {
            eprintln!("Failed to save default config: {:#}", e);
            process::exit(1);
        }
        println!("Default config saved to {}", path.display());
        return;
    }

    match Config::load_from(&path) {
        Ok(cfg) => {
            println!("Config loaded successfully from {}", path.display());
            println!("{:#?}", cfg);
        }
        Err(e) => {
            eprintln!("Config invalid: {:#}", e);
            process::exit(1);
        }
    }
}
