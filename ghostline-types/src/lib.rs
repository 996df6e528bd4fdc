use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ghostline specific error types
#[derive(Error, Debug)]
pub enum GhostError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Predictor is not configured: {0}")]
    PredictorNotConfigured(String),

    #[error("Session {0} is not attached")]
    SessionDetached(SessionId),
}

/// Identifies the terminal pane an engine instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// Everything the generative predictor is told about the line being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorContext {
    pub shell: String,
    pub working_directory: String,
    pub last_command: Option<String>,
    pub partial_input: String,
    /// Most recent commands, oldest first.
    pub history_excerpt: Vec<String>,
}
