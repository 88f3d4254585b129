//! Error types shared across RepCount crates.
//!
//! Only conditions that originate outside the counting core surface here.
//! A frame that fails the validity gate or a joint with degenerate geometry
//! is handled in place and never becomes an error.

use std::path::PathBuf;

/// Top-level error type for RepCount operations.
#[derive(Debug, thiserror::Error)]
pub enum RepcountError {
    /// A control call was made in a state that does not allow it.
    #[error("Session error: {message}")]
    Session { message: String },

    /// The upstream frame source (camera, pose model, replay file) failed.
    #[error("Frame source error: {message}")]
    Source { message: String },

    /// Landmark data handed to the core was malformed.
    #[error("Invalid frame: {message}")]
    Frame { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using RepcountError.
pub type RepcountResult<T> = Result<T, RepcountError>;

impl RepcountError {
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error ends the running session.
    ///
    /// Source failures and I/O on the frame stream are fatal; precondition
    /// violations on control calls leave the session as it was.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Self::Source { .. } | Self::Io(_) | Self::FileNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RepcountError::session("Session not running");
        assert_eq!(err.to_string(), "Session error: Session not running");

        let err = RepcountError::source("camera unavailable");
        assert_eq!(err.to_string(), "Frame source error: camera unavailable");
    }

    #[test]
    fn test_json_errors_convert() {
        fn parse(text: &str) -> RepcountResult<serde_json::Value> {
            Ok(serde_json::from_str(text)?)
        }
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, RepcountError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON: "));
        assert!(!err.is_fatal_to_session());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RepcountError::source("model crashed").is_fatal_to_session());
        assert!(!RepcountError::session("reset before start").is_fatal_to_session());
        assert!(!RepcountError::frame("bad length").is_fatal_to_session());
    }
}
