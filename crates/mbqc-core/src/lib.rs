//! Graph-state data model and rewrites for measurement-based quantum
//! computation.
//!
//! - [`graph`] -- [`GraphState`], the annotated entanglement graph
//! - [`flow`] -- [`FlowStructure`] and the [`FlowOracle`] contract
//! - [`signals`] -- X/Z dependency sets derived from graph plus flow
//! - [`rewrite`] -- local complementation and pivot
//! - [`document`] -- JSON interchange format

pub mod document;
pub mod error;
pub mod flow;
pub mod graph;
pub mod id;
pub mod plane;
pub mod rewrite;
pub mod signals;

// Re-export commonly used types
pub use document::GraphDocument;
pub use error::CoreError;
pub use flow::{FlowOracle, FlowQuery, FlowStructure};
pub use graph::GraphState;
pub use id::NodeId;
pub use plane::{Measurement, Plane};
pub use rewrite::{local_complement, pivot};
pub use signals::{collect_signals, Signals};
