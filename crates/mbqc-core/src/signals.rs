//! Signal propagation: deriving byproduct-correction dependencies from flow.
//!
//! For each node, the X-signal is the set of measured nodes whose outcome
//! flips an X correction on it, and the Z-signal the set whose outcome
//! flips a Z correction. Both are pure functions of the graph and flow.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::flow::FlowStructure;
use crate::graph::GraphState;
use crate::id::NodeId;

/// Per-node X and Z dependency sets, keyed in graph node order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub x: IndexMap<NodeId, BTreeSet<NodeId>>,
    pub z: IndexMap<NodeId, BTreeSet<NodeId>>,
}

impl Signals {
    /// X-signal of a node; empty for unknown nodes.
    pub fn x_of(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.x.get(&node).cloned().unwrap_or_default()
    }

    /// Z-signal of a node; empty for unknown nodes.
    pub fn z_of(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.z.get(&node).cloned().unwrap_or_default()
    }
}

/// Collects X and Z signals for every node of `graph`.
///
/// Each measured node `n` is added to the X-signal of every member of its
/// correction set, and toggled into the Z-signal of every member of the
/// odd neighborhood of that set other than `n` itself.
pub fn collect_signals(graph: &GraphState, flow: &FlowStructure) -> Result<Signals, CoreError> {
    flow.ensure_fresh()?;

    let mut x: IndexMap<NodeId, BTreeSet<NodeId>> =
        graph.nodes().map(|id| (id, BTreeSet::new())).collect();
    let mut z = x.clone();

    for node in graph.non_output_nodes() {
        let corrections = flow
            .corrections(node)
            .ok_or(CoreError::MissingFlow { id: node })?;

        for &target in corrections {
            x.get_mut(&target)
                .ok_or(CoreError::UnknownNode { id: target })?
                .insert(node);
        }

        for target in graph.odd_neighborhood(corrections.iter().copied())? {
            if target == node {
                continue;
            }
            // Odd-neighborhood members are graph nodes, so the entry exists.
            let domain = z.entry(target).or_default();
            if !domain.remove(&node) {
                domain.insert(node);
            }
        }

        tracing::trace!(%node, corrections = corrections.len(), "propagated signals");
    }

    Ok(Signals { x, z })
}
