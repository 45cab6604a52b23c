//! Structured errors for hosts driving a recording session

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("[{code:?}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A host API call arrived while no session was recording
    NotRecording,
    AlreadyRecording,
    InvalidEvent,
    Io,
    Capture,
    Format,
    Unknown,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: Vec::new(),
            context: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn not_recording(call: &str) -> Self {
        Self::new(
            ErrorCode::NotRecording,
            format!("{} called while no session is recording", call),
        )
        .with_suggestions(vec!["Call start() before using the recording API".to_string()])
    }

    pub fn already_recording(script: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyRecording,
            format!("A session is already recording to {}", script),
        )
    }

    pub fn invalid_event(line: usize, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidEvent,
            format!("Invalid event on line {}: {}", line, reason),
        )
        .with_context(serde_json::json!({ "line": line }))
    }

    pub fn capture_failed(target: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::Capture,
            format!("Screenshot of {} failed: {}", target, reason),
        )
        .with_context(serde_json::json!({ "target": target }))
    }

    pub fn format_failed(command: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::Format,
            format!("Formatter '{}' failed: {}", command, reason),
        )
        .with_context(serde_json::json!({ "command": command }))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::NotRecording | ErrorCode::AlreadyRecording)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::Unknown, format!("{:#}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorCode::InvalidEvent, e.to_string())
    }
}
