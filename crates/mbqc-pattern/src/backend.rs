//! Execution-engine contract.
//!
//! Backends interpret a [`Pattern`] against some quantum-state
//! representation. None is implemented here; [`simulate`] compiles a graph
//! and hands the pattern to whichever backend the caller supplies.

use std::fmt;

use mbqc_core::{FlowStructure, GraphState};

use crate::compiler::compile;
use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::ExecutionConfig;

/// An engine that runs patterns.
pub trait Backend {
    /// Resulting state representation.
    type State;
    /// Backend-specific failure.
    type Error: fmt::Display;

    fn run(&self, pattern: &Pattern, config: &ExecutionConfig) -> Result<Self::State, Self::Error>;
}

/// Compile `graph` with `flow` and run the pattern on `backend`.
pub fn simulate<B>(
    graph: &GraphState,
    flow: &FlowStructure,
    backend: &B,
    config: &ExecutionConfig,
) -> Result<B::State, PatternError>
where
    B: Backend + ?Sized,
{
    let pattern = compile(graph, flow)?;
    tracing::debug!(
        commands = pattern.len(),
        minimize_space = config.minimize_space,
        "handing pattern to backend"
    );
    backend
        .run(&pattern, config)
        .map_err(|e| PatternError::Backend(e.to_string()))
}
