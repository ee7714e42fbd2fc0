use super::error::{EngineError, Result};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Lines of output kept for diagnostics when a process fails
pub const TAIL_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
#[cfg(unix)]
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Shared cancellation flag, checked between items and while a process runs
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal state of a streamed process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code; None when the process was terminated by a signal
    pub code: Option<i32>,
    /// Last [`TAIL_LINES`] output lines, oldest first
    pub tail: Vec<String>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a [`EngineError::Process`]
    pub fn into_result(self, tool: &str) -> Result<()> {
        if self.success() {
            Ok(())
        } else {
            Err(EngineError::Process {
                tool: tool.to_string(),
                code: self.code,
                tail: self.tail,
            })
        }
    }
}

/// Output of a process run to completion without streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Launches external tools on behalf of jobs.
///
/// Jobs only talk to collaborators through this trait, so a scripted
/// implementation can stand in for ffmpeg/yt-dlp in tests.
pub trait ProcessRunner: Send + Sync {
    /// Run `cmd`, forwarding every stdout/stderr line to `on_line` as it
    /// arrives. Fails with [`EngineError::Spawn`] before any line when the
    /// program cannot be launched, and with [`EngineError::Cancelled`] when
    /// `cancel` fires while the process runs.
    fn run(
        &self,
        cmd: Command,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessExit>;

    /// Run `cmd` to completion and collect its output.
    fn capture(&self, cmd: Command) -> Result<CapturedOutput>;
}

/// Runs real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        mut cmd: Command,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessExit> {
        let tool = tool_name(&cmd);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        configure_for_background(&mut cmd);

        debug!(command = %format_command(&cmd), "spawning");
        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            tool: tool.clone(),
            source,
        })?;

        // Both pipes feed one channel so lines reach the caller on this thread
        let (tx, rx) = mpsc::channel::<String>();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || pump_lines(stdout, tx)));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || pump_lines(stderr, tx)));
        }
        drop(tx);

        let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
        let mut cancelled = false;

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    on_line(&line);
                    if tail.len() == TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if !cancelled && cancel.is_cancelled() {
                warn!(tool = %tool, pid = child.id(), "cancel requested, terminating");
                terminate(&mut child);
                cancelled = true;
            }
        }

        let status = child.wait()?;
        for reader in readers {
            let _ = reader.join();
        }

        if cancelled {
            return Err(EngineError::Cancelled);
        }

        debug!(tool = %tool, code = ?status.code(), "process exited");
        Ok(ProcessExit {
            code: status.code(),
            tail: tail.into_iter().collect(),
        })
    }

    fn capture(&self, mut cmd: Command) -> Result<CapturedOutput> {
        let tool = tool_name(&cmd);
        cmd.stdin(Stdio::null());
        configure_for_background(&mut cmd);

        debug!(command = %format_command(&cmd), "capturing");
        let output = cmd
            .output()
            .map_err(|source| EngineError::Spawn { tool, source })?;

        Ok(CapturedOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Short tool name for messages ("ffmpeg", "yt-dlp")
pub fn tool_name(cmd: &Command) -> String {
    Path::new(cmd.get_program())
        .file_stem()
        .unwrap_or_else(|| OsStr::new("tool"))
        .to_string_lossy()
        .into_owned()
}

/// Shell-quoted rendering of a command for logs
pub fn format_command(cmd: &Command) -> String {
    let parts: Vec<String> = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Split a byte stream into lines on `\n` or `\r`.
///
/// ffmpeg redraws its status line with bare carriage returns, so splitting on
/// newlines alone would hold back every progress update until exit.
fn pump_lines<R: Read>(source: R, tx: Sender<String>) {
    let mut reader = BufReader::new(source);
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        };
        if buf.is_empty() {
            break;
        }
        let len = buf.len();
        for &byte in buf {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &tx);
            } else {
                pending.push(byte);
            }
        }
        reader.consume(len);
    }
    flush_line(&mut pending, &tx);
}

fn flush_line(pending: &mut Vec<u8>, tx: &Sender<String>) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).trim_end().to_string();
    pending.clear();
    if !line.is_empty() {
        let _ = tx.send(line);
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use std::time::Instant;

    // SIGTERM first so ffmpeg can finalize the container it is writing
    let pid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    let deadline = Instant::now() + TERMINATE_GRACE;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(_) => break,
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    #[cfg(windows)]
    {
        let pid = child.id().to_string();
        let mut taskkill = Command::new("taskkill");
        taskkill.args(["/PID", &pid, "/T", "/F"]);
        configure_for_background(&mut taskkill);
        let _ = taskkill.status();
    }
    let _ = child.kill();
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    // Keep console windows from flashing up for every tool run
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}
