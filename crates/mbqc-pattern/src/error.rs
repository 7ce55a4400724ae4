//! Pattern compilation error types.

use mbqc_core::CoreError;

/// Errors that can occur while compiling or executing a pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Graph, flow or signal failure from the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The execution backend rejected or failed to run the pattern.
    #[error("backend error: {0}")]
    Backend(String),
}
