//! Running the external Pacemaker tools.
//!
//! Everything in this crate talks to the cluster stack through the
//! [`CommandRunner`] trait, so tests and embedding callers can swap the real
//! process runner for a scripted one.

use crate::error::{PcmkError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// A single external command: argv, optional stdin and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub stdin: Option<String>,
    pub env_extend: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_extend.insert(key.into(), value.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.env_extend {
            write!(f, "{}={} ", key, quote(value))?;
        }
        for arg in &self.argv {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(&quote(arg))?;
        }
        Ok(())
    }
}

/// Single-quote an argument for log output when it would not survive a shell.
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Synchronous process execution. A non-zero exit code is not an error at
/// this level; only a failure to run the process at all is.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`. Without it a hung tool
    /// hangs the caller.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command_line = invocation.to_string();
        let spawn_error = |reason: String| PcmkError::CommandSpawn {
            command: command_line.clone(),
            reason,
        };

        let Some((program, args)) = invocation.argv.split_first() else {
            return Err(spawn_error("empty command".to_string()));
        };

        debug!(command = %command_line, "Running external command");

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&invocation.env_extend)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| spawn_error(e.to_string()))?;

        // Drain both pipes on their own threads so a chatty tool cannot block
        // on a full pipe while we wait for it.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        if let (Some(input), Some(mut pipe)) = (&invocation.stdin, child.stdin.take()) {
            match pipe.write_all(input.as_bytes()) {
                Ok(()) => {}
                // The tool stopped reading; its exit status tells what happened.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!(command = %command_line, "Command closed its stdin early");
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    join_reader(stdout_reader);
                    join_reader(stderr_reader);
                    return Err(spawn_error(format!("unable to write stdin: {}", e)));
                }
            }
        }

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    child.kill()?;
                    child.wait()?;
                    return Err(PcmkError::CommandTimeout {
                        command: command_line,
                        seconds: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let output = CommandOutput {
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
            exit_code: status.code().unwrap_or(-1),
        };

        debug!(
            command = %command_line,
            exit_code = output.exit_code,
            stdout = %output.stdout,
            stderr = %output.stderr,
            "Finished running external command"
        );

        Ok(output)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_reader(reader: Option<thread::JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Check whether a tool is present, either as a path or on `PATH`.
pub fn is_installed(tool: &Path) -> bool {
    which::which(tool).is_ok()
}

/// Replays queued outputs in order and records every invocation it receives.
///
/// Used by tests and by callers who want to exercise agent resolution
/// without a cluster stack installed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<CommandOutput>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next command.
    pub fn respond(self, stdout: &str, stderr: &str, exit_code: i32) -> Self {
        self.outputs
            .borrow_mut()
            .push_back(CommandOutput::new(stdout, stderr, exit_code));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.outputs.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        self.outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PcmkError::CommandSpawn {
                command: invocation.to_string(),
                reason: "no scripted output left".to_string(),
            })
    }
}
