//! Error types for specgen Core
//!
//! Provides error handling for:
//! - Output regeneration (deletion, synthesis fan-out, persisting)
//! - Configuration loading and validation
//! - The host entry point, which wraps both plus engine failures

use specgen_protocol::ClientError;
use specgen_synth::SynthesisError;
use std::fmt;
use std::path::PathBuf;

/// One failed specification in a synthesis fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFailure {
    /// Position in the fetched list
    pub index: usize,
    /// Specification name as received
    pub specification: String,
    /// Why synthesis failed
    pub error: SynthesisError,
}

impl fmt::Display for SpecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {:?}: {}", self.index, self.specification, self.error)
    }
}

/// Errors from writing specifications to disk
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Required input missing or blank
    #[error("invalid argument `{parameter}`: {reason}")]
    Argument {
        /// Offending parameter
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// At least one specification failed to synthesize; nothing was saved
    #[error("synthesis failed for {} specification(s): {}", .failures.len(), summarize(.failures))]
    Synthesis {
        /// Every failing specification, in fetched order
        failures: Vec<SpecFailure>,
    },

    /// Two units would be saved under the same file name
    #[error("specifications {first:?} and {second:?} both generate `{file_name}`")]
    DuplicateUnit {
        /// Contested file name
        file_name: String,
        /// Lexically smaller specification name
        first: String,
        /// Lexically larger specification name
        second: String,
    },

    /// Filesystem operation failed
    #[error("{operation} {}: {source}", .path.display())]
    Io {
        /// `remove`, `create`, `write`, `retire` or `promote`
        operation: &'static str,
        /// Path the operation acted on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Synthesis task panicked or was aborted
    #[error("synthesis task failed: {0}")]
    TaskFailed(String),

    /// Cancelled by the caller
    #[error("write cancelled")]
    Cancelled,
}

impl WriteError {
    /// Create argument error
    #[inline]
    pub fn argument(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            parameter,
            reason: reason.into(),
        }
    }

    /// Create I/O error bound to a path
    #[inline]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Per-specification failures, ordered by position
    #[must_use]
    pub fn failures(&self) -> &[SpecFailure] {
        match self {
            Self::Synthesis { failures } => failures,
            _ => &[],
        }
    }
}

fn summarize(failures: &[SpecFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be printed
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Value out of range
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted key, e.g. `engine.address`
        field: &'static str,
        /// Accepted range
        reason: String,
    },
}

impl ConfigError {
    /// Create validation error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level error for one regeneration
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Fetching from the engine failed; nothing was deleted
    #[error("fetch failed: {0}")]
    Fetch(#[from] ClientError),

    /// Writing output failed
    #[error("write failed: {0}")]
    Write(#[from] WriteError),

    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GeneratorError {
    /// Check if a fresh attempt could succeed
    ///
    /// Regeneration never retries on its own; this only informs the caller.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_connection_error(),
            Self::Write(WriteError::Io { .. }) => true,
            _ => false,
        }
    }

    /// Check if the run was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Fetch(ClientError::Cancelled) | Self::Write(WriteError::Cancelled)
        )
    }
}
