// Error taxonomy for task list operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the presentation layer
///
/// None of these are fatal: the in-memory collection is left consistent
/// whichever variant is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Required input was missing or empty (e.g. task text)
    #[error("validation failed: {0}")]
    Validation(String),

    /// An import source was structurally wrong; nothing was replaced
    #[error("invalid format in {path:?}: {message}")]
    Format { path: PathBuf, message: String },

    /// Reading or writing a file failed
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the collection as JSON failed
    #[error("failed to encode tasks: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(Error::Validation("empty".to_string()).is_validation());
        assert!(Error::format("a.json", "not an array").is_format());

        let io = Error::io("a.json", std::io::Error::other("disk"));
        assert!(io.is_io());
        assert!(!io.is_format());
    }

    #[test]
    fn test_error_display() {
        let err = Error::format("tasks.json", "top-level value is not an array");
        assert_eq!(
            err.to_string(),
            "invalid format in \"tasks.json\": top-level value is not an array"
        );
        assert_eq!(
            Error::Validation("task text cannot be empty".to_string()).to_string(),
            "validation failed: task text cannot be empty"
        );
    }
}
