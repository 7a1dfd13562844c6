//! Tool-level failure type shared by every handler.
//!
//! A `ToolError` is never a protocol fault: the MCP adapter turns it into an
//! error-flagged `CallToolResult`, the `call` subcommand prints it.

use serde::Serialize;

/// Failure category of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    MissingArgument,
    InvalidArgument,
    UnknownTool,
    NotAllowed,
    LaunchFailed,
    ProcessFailed,
    DeadlineExceeded,
    Busy,
    Network,
    Transform,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::MissingArgument => "missing_argument",
            ToolErrorKind::InvalidArgument => "invalid_argument",
            ToolErrorKind::UnknownTool => "unknown_tool",
            ToolErrorKind::NotAllowed => "not_allowed",
            ToolErrorKind::LaunchFailed => "launch_failed",
            ToolErrorKind::ProcessFailed => "process_failed",
            ToolErrorKind::DeadlineExceeded => "deadline_exceeded",
            ToolErrorKind::Busy => "busy",
            ToolErrorKind::Network => "network",
            ToolErrorKind::Transform => "transform",
        }
    }
}

/// Error returned by tool handlers. `Display` renders the message, followed by
/// the attempted command line when one is attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{}", .message, command_suffix(.command.as_deref()))]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub command: Option<String>,
}

fn command_suffix(command: Option<&str>) -> String {
    match command {
        Some(c) => format!("\nCommand: {c}"),
        None => String::new(),
    }
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            command: None,
        }
    }

    /// Attach the command line that was (or would have been) executed.
    pub fn with_command(mut self, command: impl ToString) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn missing(param: &str) -> Self {
        Self::new(
            ToolErrorKind::MissingArgument,
            format!("Missing required parameter: {param}"),
        )
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotAllowed, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ToolErrorKind::UnknownTool, format!("Unknown tool: {name}"))
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transform, message)
    }

    /// JSON shape used by `call --json`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "kind": self.kind,
            "error": self.message,
            "command": self.command,
        })
    }
}

/// Value of a required string parameter; absent or blank is `MissingArgument`.
pub fn require<'a>(value: &'a Option<String>, param: &str) -> Result<&'a str, ToolError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ToolError::missing(param)),
    }
}

/// Like [`require`], but an empty string is a legitimate value.
pub fn require_present<'a>(value: &'a Option<String>, param: &str) -> Result<&'a str, ToolError> {
    value.as_deref().ok_or_else(|| ToolError::missing(param))
}
