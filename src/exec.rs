//! Narrow command-execution boundary
//!
//! Every shell-level side effect in this agent (supervisor CLI, hook tools,
//! database client tools) goes through [`CommandRunner`] so tests can swap in
//! a scripted fake without spawning real processes. Commands are argv
//! vectors, never shell strings, and every invocation carries a
//! caller-supplied timeout.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{program}: timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: BTreeMap<String, String>,
    /// File fed to the child's stdin, if any
    pub stdin: Option<PathBuf>,
    pub timeout: Duration,
}

impl Exec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: BTreeMap::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }
}

/// Captured output of a completed command
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// The tool's diagnostic text: stderr if present, otherwise stdout.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, exec: &Exec) -> Result<ExecOutput, ExecError>;
}

/// Production runner backed by `tokio::process`
pub struct TokioRunner;

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, exec: &Exec) -> Result<ExecOutput, ExecError> {
        debug!(program = %exec.program, args = ?exec.args, "running command");

        let mut cmd = tokio::process::Command::new(&exec.program);
        cmd.args(&exec.args)
            .envs(&exec.envs)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &exec.stdin {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| ExecError::Io {
                    program: exec.program.clone(),
                    source,
                })?;
                cmd.stdin(Stdio::from(file));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        let child = cmd.output();
        let output = tokio::time::timeout(exec.timeout, child)
            .await
            .map_err(|_| ExecError::TimedOut {
                program: exec.program.clone(),
                timeout: exec.timeout,
            })?
            .map_err(|source| ExecError::Io {
                program: exec.program.clone(),
                source,
            })?;

        Ok(ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
