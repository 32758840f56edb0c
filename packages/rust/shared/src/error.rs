//! Error types for grafana-build.
//!
//! Library crates use [`GrafanaBuildError`] via `thiserror`.
//! The CLI binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all grafana-build operations.
///
/// Every variant is fatal for the invocation that produced it: errors
/// propagate to the top level unmodified and terminate the process with a
/// non-zero exit. The only designed fallback in the system (version
/// inspection replacing an absent `--version` flag) is not an error path.
#[derive(Debug, thiserror::Error)]
pub enum GrafanaBuildError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// No GitHub access token could be found in any configured source.
    #[error("could not find a GitHub access token: {message}")]
    TokenMissing { message: String },

    /// Stat on the source path failed for a reason other than non-existence.
    #[error("failed to stat source path {path:?}: {source}")]
    SourceStat {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The supplied source path exists but is not a directory.
    #[error("path provided is not a directory: {path:?}")]
    NotADirectory { path: PathBuf },

    /// A base or enterprise clone failed (network, auth, missing ref).
    #[error("failed to clone {url} at {reference}: {message}")]
    Clone {
        url: String,
        reference: String,
        message: String,
    },

    /// The enterprise overlay initialization step failed.
    #[error("failed to initialize enterprise overlay: {0}")]
    EnterpriseInit(String),

    /// Version inspection failed while no explicit version was supplied.
    #[error("failed to resolve version: {message}")]
    VersionResolution { message: String },

    /// The execution-engine connection could not be established.
    #[error("failed to connect to the execution engine: {0}")]
    EngineConnection(String),

    /// The invoked pipeline function failed; propagated verbatim.
    #[error("pipeline failed: {0}")]
    Pipeline(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The invocation was cancelled before the operation completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GrafanaBuildError>;

impl GrafanaBuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a token-missing error from any displayable message.
    pub fn token_missing(msg: impl Into<String>) -> Self {
        Self::TokenMissing {
            message: msg.into(),
        }
    }

    /// Create a clone error for the given repository and ref.
    pub fn clone_failed(
        url: impl Into<String>,
        reference: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Clone {
            url: url.into(),
            reference: reference.into(),
            message: msg.into(),
        }
    }

    /// Create a version-resolution error from any displayable message.
    pub fn version(msg: impl Into<String>) -> Self {
        Self::VersionResolution {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = GrafanaBuildError::token_missing("no flag, env, or config value set");
        assert_eq!(
            err.to_string(),
            "could not find a GitHub access token: no flag, env, or config value set"
        );

        let err = GrafanaBuildError::clone_failed(
            "https://github.com/grafana/grafana.git",
            "main",
            "exit status 128",
        );
        assert!(err.to_string().contains("grafana.git at main"));

        let err = GrafanaBuildError::NotADirectory {
            path: PathBuf::from("/tmp/somefile"),
        };
        assert!(err.to_string().contains("not a directory"));
    }
}
