use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tabq learner
#[derive(Error, Debug)]
pub enum LearnerError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("IO error: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Failed to acquire lock: {message}")]
    LockError { message: String },

    #[error("{0}")]
    Other(String),
}

impl LearnerError {
    /// Create a new invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a new invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a new IO error with path context
    pub fn io_error(err: std::io::Error, path: Option<impl Into<PathBuf>>) -> Self {
        Self::Io {
            source: err,
            path: path.map(|p| p.into()),
        }
    }

    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new lock error
    pub fn lock_error(message: impl Into<String>) -> Self {
        Self::LockError {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LearnerError::InvalidConfiguration { .. } => "invalid_configuration",
            LearnerError::InvalidState { .. } => "invalid_state",
            LearnerError::Io { .. } => "io_error",
            LearnerError::ParseError { .. } => "parse_error",
            LearnerError::LockError { .. } => "lock_error",
            LearnerError::Other(_) => "other_error",
        }
    }
}

impl From<std::io::Error> for LearnerError {
    fn from(error: std::io::Error) -> Self {
        LearnerError::io_error(error, None::<PathBuf>)
    }
}

impl From<serde_json::Error> for LearnerError {
    fn from(error: serde_json::Error) -> Self {
        LearnerError::parse_error(error.to_string())
    }
}

impl From<toml::de::Error> for LearnerError {
    fn from(error: toml::de::Error) -> Self {
        LearnerError::parse_error(error.to_string())
    }
}

impl From<toml::ser::Error> for LearnerError {
    fn from(error: toml::ser::Error) -> Self {
        LearnerError::parse_error(error.to_string())
    }
}

/// Result type alias using LearnerError
pub type LearnerResult<T> = Result<T, LearnerError>;

/// Extension trait for converting foreign errors to LearnerError
pub trait ErrorExt<T> {
    /// Convert to LearnerResult with added context
    fn with_context(self, message: impl AsRef<str>) -> LearnerResult<T>;
}

impl<T, E: fmt::Display> ErrorExt<T> for Result<T, E> {
    fn with_context(self, message: impl AsRef<str>) -> LearnerResult<T> {
        self.map_err(|e| LearnerError::other(format!("{}: {}", message.as_ref(), e)))
    }
}

/// Contextual error mapping function
pub fn map_io_err<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> LearnerError {
    let path = path.into();
    move |err| LearnerError::io_error(err, Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LearnerError::invalid_configuration("bad alpha").kind(),
            "invalid_configuration"
        );
        assert_eq!(LearnerError::invalid_state("x").kind(), "invalid_state");
        assert_eq!(LearnerError::lock_error("poisoned").kind(), "lock_error");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = map_io_err("/tmp/missing.json")(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        match err {
            LearnerError::Io { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/missing.json")))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_context_prefixes_message() {
        let result: Result<(), &str> = Err("boom");
        let err = result.with_context("loading table").unwrap_err();
        assert_eq!(err.to_string(), "loading table: boom");
    }
}
