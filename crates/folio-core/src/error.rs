//! Error types for the folio core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for folio.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or parsing error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Typed field parsing error (bad `written` or `topics` value, missing field).
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Malformed frontmatter block.
    #[error("Frontmatter error in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    /// A `$$include_*` directive could not be resolved.
    #[error("Include error for {path}: {message}")]
    Include { path: String, message: String },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new frontmatter error.
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new include error.
    pub fn include(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Include {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short name of the error kind, used when reporting per-file failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "ConfigError",
            Self::Parse { .. } | Self::Frontmatter { .. } => "ParseError",
            Self::Include { .. } => "IncludeError",
            Self::Io(_) => "IOError",
            Self::Toml(_) | Self::Yaml(_) | Self::Json(_) => "ParseError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("missing field");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_parse_error() {
        let err = CoreError::parse("publish/post.md", "invalid topics");
        assert!(err.to_string().contains("Parse error"));
        assert!(err.to_string().contains("publish/post.md"));
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_include_error() {
        let err = CoreError::include("data/menu.yaml", "data file not found");
        assert!(err.to_string().contains("data/menu.yaml"));
        assert_eq!(err.kind(), "IncludeError");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.kind(), "IOError");
    }
}
