// Scripted stand-in for ffmpeg / ffprobe / yt-dlp

use std::collections::VecDeque;
use std::io;
use std::process::Command;
use std::sync::Mutex;
use vidtool::engine::{
    CancelToken, CapturedOutput, EngineError, ProcessExit, ProcessRunner, Result, TAIL_LINES,
    tool_name,
};

use super::helpers::args_of;

/// What one streamed run should do
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub lines: Vec<String>,
    pub code: Option<i32>,
    pub spawn_fails: bool,
    /// Trip the cancel token mid-run, like a user pressing stop
    pub cancels: bool,
}

impl ScriptedRun {
    pub fn ok() -> Self {
        Self {
            lines: Vec::new(),
            code: Some(0),
            spawn_fails: false,
            cancels: false,
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::ok()
        }
    }

    pub fn spawn_failure() -> Self {
        Self {
            spawn_fails: true,
            ..Self::ok()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancels: true,
            ..Self::ok()
        }
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }
}

/// Records every command and plays back scripted results in call order.
/// Runs beyond the script succeed silently.
pub struct FakeRunner {
    script: Mutex<VecDeque<ScriptedRun>>,
    probe: Mutex<CapturedOutput>,
    runs: Mutex<Vec<Vec<String>>>,
    captures: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            probe: Mutex::new(CapturedOutput {
                code: Some(0),
                stdout: "60.000000\n".to_string(),
                stderr: String::new(),
            }),
            runs: Mutex::new(Vec::new()),
            captures: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, runs: impl IntoIterator<Item = ScriptedRun>) -> Self {
        self.script.lock().unwrap().extend(runs);
        self
    }

    /// What every `capture` call (the duration probe) returns
    pub fn probe_output(self, code: i32, stdout: &str) -> Self {
        *self.probe.lock().unwrap() = CapturedOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self
    }

    /// Program + args of every streamed run, in order
    pub fn runs(&self) -> Vec<Vec<String>> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn capture_count(&self) -> usize {
        self.captures.lock().unwrap().len()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(
        &self,
        cmd: Command,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessExit> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(ScriptedRun::ok);

        if step.spawn_fails {
            return Err(EngineError::Spawn {
                tool: tool_name(&cmd),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        self.runs.lock().unwrap().push(args_of(&cmd));

        for line in &step.lines {
            on_line(line);
        }
        if step.cancels {
            cancel.cancel();
            return Err(EngineError::Cancelled);
        }

        let skip = step.lines.len().saturating_sub(TAIL_LINES);
        Ok(ProcessExit {
            code: step.code,
            tail: step.lines[skip..].to_vec(),
        })
    }

    fn capture(&self, cmd: Command) -> Result<CapturedOutput> {
        self.captures.lock().unwrap().push(args_of(&cmd));
        Ok(self.probe.lock().unwrap().clone())
    }
}
