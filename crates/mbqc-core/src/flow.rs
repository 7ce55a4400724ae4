//! Correction structure ("flow") over a graph state.
//!
//! A [`FlowStructure`] maps every measured node to the set of nodes whose
//! later corrections compensate for its random outcome, and stratifies the
//! measured nodes into layers. It is produced by an external
//! [`FlowOracle`]; this crate only consumes, validates and rewrites it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::GraphState;
use crate::id::NodeId;
use crate::plane::Plane;

/// Correction map plus measurement layering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowStructure {
    flow: IndexMap<NodeId, BTreeSet<NodeId>>,
    layers: BTreeMap<usize, BTreeSet<NodeId>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    stale: bool,
}

impl FlowStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a flow from its parts.
    pub fn from_parts<F, L>(flow: F, layers: L) -> Self
    where
        F: IntoIterator<Item = (NodeId, BTreeSet<NodeId>)>,
        L: IntoIterator<Item = (usize, BTreeSet<NodeId>)>,
    {
        FlowStructure {
            flow: flow.into_iter().collect(),
            layers: layers.into_iter().collect(),
            stale: false,
        }
    }

    /// Asks the oracle for a flow, falling back to a generalized flow.
    pub fn discover<O>(graph: &GraphState, oracle: &O) -> Result<FlowStructure, CoreError>
    where
        O: FlowOracle + ?Sized,
    {
        let query = graph.flow_query();
        if let Some(flow) = oracle.find_flow(&query) {
            tracing::debug!(depth = flow.depth(), "found flow");
            return Ok(flow);
        }
        if let Some(flow) = oracle.find_generalized_flow(&query) {
            tracing::debug!(depth = flow.depth(), "found generalized flow");
            return Ok(flow);
        }
        Err(CoreError::NoFlow)
    }

    // -----------------------------------------------------------------------
    // Correction map
    // -----------------------------------------------------------------------

    /// Sets the correction set of a node, replacing any previous one.
    pub fn set_corrections<I>(&mut self, node: NodeId, corrections: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.flow.insert(node, corrections.into_iter().collect());
    }

    /// Returns the correction set of a node, if it has one.
    pub fn corrections(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.flow.get(&node)
    }

    pub(crate) fn corrections_mut(&mut self, node: NodeId) -> &mut BTreeSet<NodeId> {
        self.flow.entry(node).or_default()
    }

    /// The full correction map.
    pub fn flow(&self) -> &IndexMap<NodeId, BTreeSet<NodeId>> {
        &self.flow
    }

    // -----------------------------------------------------------------------
    // Layering
    // -----------------------------------------------------------------------

    /// Sets the members of layer `k`.
    pub fn set_layer<I>(&mut self, k: usize, nodes: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.layers.insert(k, nodes.into_iter().collect());
    }

    pub fn layers(&self) -> &BTreeMap<usize, BTreeSet<NodeId>> {
        &self.layers
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Checks that the layers partition exactly the measured nodes of `graph`.
    pub fn validate_layers(&self, graph: &GraphState) -> Result<(), CoreError> {
        let mut seen: HashMap<NodeId, usize> = HashMap::new();
        for (&k, layer) in &self.layers {
            for &node in layer {
                if let Some(prev) = seen.insert(node, k) {
                    return Err(CoreError::InvalidLayering {
                        reason: format!("NodeId({}) appears in layers {} and {}", node, prev, k),
                    });
                }
                if !graph.contains(node) {
                    return Err(CoreError::UnknownNode { id: node });
                }
                if graph.is_output(node) {
                    return Err(CoreError::InvalidLayering {
                        reason: format!("output NodeId({}) is layered in layer {}", node, k),
                    });
                }
            }
        }
        if let Some(missing) = graph.non_output_nodes().find(|n| !seen.contains_key(n)) {
            return Err(CoreError::InvalidLayering {
                reason: format!("measured NodeId({}) is in no layer", missing),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Applies a node relabeling to every key and member.
    pub fn relabel(&mut self, mapping: &HashMap<NodeId, NodeId>) {
        let image = |id: &NodeId| mapping.get(id).copied().unwrap_or(*id);
        self.flow = self
            .flow
            .iter()
            .map(|(k, set)| (image(k), set.iter().map(image).collect()))
            .collect();
        for layer in self.layers.values_mut() {
            *layer = layer.iter().map(image).collect();
        }
    }

    /// Marks this flow as no longer describing its graph.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Fails with `StaleFlow` if the flow was invalidated.
    pub fn ensure_fresh(&self) -> Result<(), CoreError> {
        if self.stale {
            Err(CoreError::StaleFlow)
        } else {
            Ok(())
        }
    }
}

/// Read-only view of a graph state handed to a [`FlowOracle`].
#[derive(Debug, Clone)]
pub struct FlowQuery<'a> {
    pub graph: &'a UnGraphMap<NodeId, ()>,
    pub inputs: &'a [NodeId],
    pub outputs: Vec<NodeId>,
    pub planes: IndexMap<NodeId, Plane>,
}

/// External flow-finding algorithm.
///
/// Implementations return `None` when no flow of the requested kind exists.
pub trait FlowOracle {
    /// Finds a causal flow.
    fn find_flow(&self, query: &FlowQuery<'_>) -> Option<FlowStructure>;

    /// Finds a generalized flow; tried only when [`find_flow`](Self::find_flow) fails.
    fn find_generalized_flow(&self, query: &FlowQuery<'_>) -> Option<FlowStructure>;
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn n(raw: u32) -> NodeId {
        NodeId(raw)
    }

    fn two_node_graph() -> GraphState {
        let mut graph = GraphState::new();
        graph.add_measured_node(n(0), Plane::XY, 0.0);
        graph.add_output_node(n(1));
        graph.add_edge(n(0), n(1)).unwrap();
        graph
    }

    fn two_node_flow() -> FlowStructure {
        FlowStructure::from_parts(
            [(n(0), BTreeSet::from([n(1)]))],
            [(0, BTreeSet::from([n(0)]))],
        )
    }

    struct ScriptedOracle {
        flow: Option<FlowStructure>,
        gflow: Option<FlowStructure>,
        gflow_calls: Cell<u32>,
    }

    impl FlowOracle for ScriptedOracle {
        fn find_flow(&self, _query: &FlowQuery<'_>) -> Option<FlowStructure> {
            self.flow.clone()
        }

        fn find_generalized_flow(&self, _query: &FlowQuery<'_>) -> Option<FlowStructure> {
            self.gflow_calls.set(self.gflow_calls.get() + 1);
            self.gflow.clone()
        }
    }

    #[test]
    fn valid_layering_passes() {
        two_node_flow().validate_layers(&two_node_graph()).unwrap();
    }

    #[test]
    fn layering_missing_measured_node_fails() {
        let mut graph = two_node_graph();
        graph.add_measured_node(n(2), Plane::XY, 0.0);
        let err = two_node_flow().validate_layers(&graph).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLayering { .. }));
    }

    #[test]
    fn layering_with_duplicate_node_fails() {
        let mut flow = two_node_flow();
        flow.set_layer(1, [n(0)]);
        let err = flow.validate_layers(&two_node_graph()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLayering { .. }));
    }

    #[test]
    fn layering_containing_output_fails() {
        let mut flow = two_node_flow();
        flow.set_layer(1, [n(1)]);
        let err = flow.validate_layers(&two_node_graph()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLayering { .. }));
    }

    #[test]
    fn discover_prefers_flow() {
        let oracle = ScriptedOracle {
            flow: Some(two_node_flow()),
            gflow: None,
            gflow_calls: Cell::new(0),
        };
        let flow = FlowStructure::discover(&two_node_graph(), &oracle).unwrap();
        assert_eq!(flow, two_node_flow());
        assert_eq!(oracle.gflow_calls.get(), 0);
    }

    #[test]
    fn discover_falls_back_to_generalized_flow() {
        let oracle = ScriptedOracle {
            flow: None,
            gflow: Some(two_node_flow()),
            gflow_calls: Cell::new(0),
        };
        let flow = FlowStructure::discover(&two_node_graph(), &oracle).unwrap();
        assert_eq!(flow.depth(), 1);
        assert_eq!(oracle.gflow_calls.get(), 1);
    }

    #[test]
    fn discover_without_any_flow_fails() {
        let oracle = ScriptedOracle {
            flow: None,
            gflow: None,
            gflow_calls: Cell::new(0),
        };
        assert_eq!(
            FlowStructure::discover(&two_node_graph(), &oracle),
            Err(CoreError::NoFlow)
        );
    }

    #[test]
    fn relabel_maps_keys_values_and_layers() {
        let mut flow = two_node_flow();
        flow.relabel(&HashMap::from([(n(0), n(1)), (n(1), n(0))]));
        assert_eq!(flow.corrections(n(1)), Some(&BTreeSet::from([n(0)])));
        assert_eq!(flow.layers()[&0], BTreeSet::from([n(1)]));
    }

    #[test]
    fn invalidate_marks_stale() {
        let mut flow = two_node_flow();
        flow.ensure_fresh().unwrap();
        flow.invalidate();
        assert!(flow.is_stale());
        assert_eq!(flow.ensure_fresh(), Err(CoreError::StaleFlow));
    }

    #[test]
    fn serde_roundtrip() {
        let flow = two_node_flow();
        let json = serde_json::to_string(&flow).unwrap();
        assert!(!json.contains("stale"));
        let back: FlowStructure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flow);
    }
}
