//! Engine error types.
//!
//! Content problems are never errors; they become
//! [`Diagnostic`](crate::Diagnostic)s. An `EngineError` means the engine
//! itself was misconfigured or a builder could not complete a step.

/// Engine error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A configured selector failed to compile.
    #[error("invalid selector in {field}: '{selector}'")]
    InvalidSelector {
        /// Configuration field holding the selector.
        field: &'static str,
        /// The selector text.
        selector: String,
    },
    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A located span could not be mapped back onto the tree.
    #[error("malformed {{{{{keyword}}}}} span: {message}")]
    MalformedSpan {
        keyword: &'static str,
        message: String,
    },
}
