//! Core error types for mbqc-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of graph construction, rewriting and signal
//! propagation.

use crate::id::NodeId;
use thiserror::Error;

/// Core errors produced by the mbqc-core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// An operation referenced a node absent from the graph.
    #[error("unknown node: NodeId({id})", id = id.0)]
    UnknownNode { id: NodeId },

    /// A measured node has no entry in the flow map.
    #[error("no flow entry for measured node: NodeId({id})", id = id.0)]
    MissingFlow { id: NodeId },

    /// Neither flow nor generalized flow exists for the graph.
    #[error("no flow or generalized flow exists for this graph")]
    NoFlow,

    /// A plane name outside {XY, XZ, YZ}.
    #[error("invalid measurement plane: '{value}'")]
    InvalidPlane { value: String },

    /// The layering does not partition the measured nodes.
    #[error("invalid layering: {reason}")]
    InvalidLayering { reason: String },

    /// A relabeling is not a bijection over the graph's nodes.
    #[error("invalid relabel: {reason}")]
    InvalidRelabel { reason: String },

    /// A node listed in the output sequence carries a measurement.
    #[error("NodeId({id}) is measured and cannot be an output", id = id.0)]
    MeasuredOutput { id: NodeId },

    /// An edge from a node to itself; graph states are simple graphs.
    #[error("self-loop on NodeId({id}) is not allowed", id = id.0)]
    SelfLoop { id: NodeId },

    /// Pivot on a node with itself.
    #[error("cannot pivot NodeId({id}) with itself", id = id.0)]
    InvalidPivot { id: NodeId },

    /// The flow was invalidated by a pivot and must be rediscovered.
    #[error("flow structure is stale; rediscover it after a pivot")]
    StaleFlow,
}
