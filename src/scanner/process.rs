//! External command execution for fetch and scan tasks
//!
//! Every child is spawned with `kill_on_drop`, so dropping the owning future
//! (task timeout or `cancel_all`) terminates the process.

use crate::pool::api::{TaskError, TaskResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 10;

/// A command to run plus the exit codes that count as success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    success_codes: Vec<i32>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            success_codes: vec![0],
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

    /// Append `-v host:container` to the argument list
    pub fn mount(self, host: &Path, container: &str) -> Self {
        self.arg("-v")
            .arg(format!("{}:{}", host.display(), container))
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Environment variable for the child; values are never logged
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn success_codes(mut self, codes: &[i32]) -> Self {
        self.success_codes = codes.to_vec();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> impl Iterator<Item = &str> {
        self.envs.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_success_code(&self, code: i32) -> bool {
        self.success_codes.contains(&code)
    }

    /// Command line for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, capturing stderr for the failure message
    pub async fn run(&self) -> TaskResult<()> {
        log::debug!("Running: {}", self.display());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| TaskError::Launch {
            program: self.program.clone(),
            cause: e.to_string(),
        })?;

        match output.status.code() {
            Some(code) if self.is_success_code(code) => Ok(()),
            _ => Err(TaskError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr, STDERR_TAIL_LINES),
            }),
        }
    }
}

/// Last `lines` non-empty lines of a stderr capture, joined with "; "
fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    kept[kept.len().saturating_sub(lines)..].join("; ")
}
