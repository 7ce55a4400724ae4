//! Pattern compilation for MBQC graph states.
//!
//! This crate linearizes a [`GraphState`](mbqc_core::GraphState) and its
//! [`FlowStructure`](mbqc_core::FlowStructure) into a [`Pattern`] and
//! defines the seam to execution engines.
//!
//! # Modules
//!
//! - [`pattern`] -- Command vocabulary and the `Pattern` container
//! - [`compiler`] -- Deterministic graph-to-pattern compilation
//! - [`backend`] -- Execution-engine contract
//! - [`error`] -- Error types for compilation and execution

pub mod backend;
pub mod compiler;
pub mod error;
pub mod pattern;

pub use backend::{simulate, Backend};
pub use compiler::{compile, compile_with_oracle};
pub use error::PatternError;
pub use pattern::{Command, CommandKind, Pattern};

use serde::{Deserialize, Serialize};

/// Options passed to an execution backend alongside a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Ask the backend to reorder commands to reduce the number of
    /// simultaneously live qubits before running.
    pub minimize_space: bool,
}
