//! Error types for code synthesis

use specgen_model::InvalidNameError;

/// Errors from synthesizing one specification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// Required input missing or blank
    #[error("invalid argument `{parameter}`: {reason}")]
    Argument {
        /// Offending parameter
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A name sanitized to an empty identifier
    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// Two scenarios of one specification map to the same method name
    #[error(
        "scenarios {first:?} and {second:?} of {specification:?} both sanitize to `{identifier}`"
    )]
    DuplicateIdentifier {
        /// Owning specification
        specification: String,
        /// Shared method name
        identifier: String,
        /// Earlier scenario name
        first: String,
        /// Later scenario name
        second: String,
    },
}

impl SynthesisError {
    /// Create argument error
    #[inline]
    pub fn argument(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            parameter,
            reason: reason.into(),
        }
    }

    /// Parameter name for argument errors
    #[inline]
    #[must_use]
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Self::Argument { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}
