//! Command construction and subprocess execution.
//!
//! `CommandLine` is an explicit argument vector: nothing here goes through a
//! shell, so caller-supplied values are never interpreted. `Display` renders a
//! shell-quoted form for logs and failure messages only.

mod runner;

pub use runner::{ProcessRunner, RunnerLimits};

use std::fmt;

use crate::tools::ToolError;

/// A program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Start a command for `program`. The program name must be non-empty.
    pub fn new(program: impl Into<String>) -> Result<Self, ToolError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(ToolError::missing("program"));
        }
        Ok(Self {
            program,
            args: Vec::new(),
        })
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

    /// Append `value` as its own argument when present and non-empty.
    pub fn opt_arg(self, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.arg(v),
            None => self,
        }
    }

    /// Append `flag` when `enabled`.
    pub fn flag(self, flag: &str, enabled: bool) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    /// Append `flag=value` (single token) when `value` is present and non-empty.
    pub fn opt_assign(self, flag: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.arg(format!("{flag}={v}")),
            None => self,
        }
    }

    /// Append `flag` followed by `value` as two tokens.
    pub fn pair(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the tokio command (no stdio configuration applied).
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = std::iter::once(&self.program).chain(self.args.iter());
        f.write_str(&shell_words::join(tokens))
    }
}
