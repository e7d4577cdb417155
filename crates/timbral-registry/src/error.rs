//! Error types for feature resolution and extraction.

use thiserror::Error;
use timbral_analysis::AnalysisError;

/// Errors raised while resolving or running an extraction plan.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// Feature name or id not present in the registry.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// A feature needs an argument that neither the context nor the plan supplies.
    #[error("feature '{feature}' is missing argument '{argument}'")]
    MissingArgument {
        /// Feature being computed.
        feature: &'static str,
        /// Argument that was not available.
        argument: &'static str,
    },

    /// An upstream feature produced a value of the wrong shape.
    #[error("feature '{feature}' got an unexpected value for '{argument}'")]
    UnexpectedValue {
        /// Feature being computed.
        feature: &'static str,
        /// Argument with the wrong shape.
        argument: &'static str,
    },

    /// Feature inputs form a cycle; the payload is the offending path.
    #[error("dependency cycle: {0}")]
    DependencyCycle(String),

    /// Analysis primitive rejected its arguments.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
