//! GraphState: the entanglement graph annotated with measurement bases.
//!
//! [`GraphState`] is the single owner of a graph state's structure.
//! Adjacency lives in a petgraph `UnGraphMap`; the edge sequence is tracked
//! separately so that edges keep their insertion order across removals.
//! Per-node measurement metadata lives alongside, keyed by [`NodeId`].
//!
//! # Node roles
//!
//! A node is measured iff it carries `Some(Measurement)`. A node without a
//! measurement is an output. The output sequence holds exactly the
//! unmeasured nodes; [`add_output_nodes`](GraphState::add_output_nodes)
//! appends in the caller's order, moving a node that is already an output
//! to the end.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use petgraph::graphmap::UnGraphMap;

use crate::error::CoreError;
use crate::flow::FlowQuery;
use crate::id::NodeId;
use crate::plane::{Measurement, Plane};

/// An MBQC graph state.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    /// Entanglement structure. Edge weights carry no information.
    graph: UnGraphMap<NodeId, ()>,
    /// Edges as `(min, max)` pairs, in insertion order.
    edges: IndexSet<(NodeId, NodeId)>,
    /// Measurement basis per node; `None` marks an output.
    measurements: IndexMap<NodeId, Option<Measurement>>,
    /// Input nodes, in caller order.
    inputs: Vec<NodeId>,
    /// Unmeasured nodes, in output order.
    outputs: IndexSet<NodeId>,
}

impl GraphState {
    /// Creates an empty graph state.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Node methods
    // -----------------------------------------------------------------------

    /// Inserts a node, or overwrites the metadata of an existing one.
    ///
    /// `None` makes the node an output; `Some` makes it a measured node.
    pub fn add_node(&mut self, id: NodeId, measurement: Option<Measurement>) {
        self.graph.add_node(id);
        self.measurements.insert(id, measurement);
        match measurement {
            Some(_) => {
                self.outputs.shift_remove(&id);
            }
            None => {
                self.outputs.insert(id);
            }
        }
    }

    /// Convenience: adds a node measured in `plane` at `angle`.
    pub fn add_measured_node(&mut self, id: NodeId, plane: Plane, angle: f64) {
        self.add_node(id, Some(Measurement::new(plane, angle)));
    }

    /// Appends an unmeasured output node, creating it when absent.
    ///
    /// A node that already is an output moves to the end of the sequence.
    pub fn add_output_node(&mut self, id: NodeId) {
        self.add_node(id, None);
        self.outputs.shift_remove(&id);
        self.outputs.insert(id);
    }

    /// Appends output nodes in the given order, creating them when absent.
    pub fn add_output_nodes<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        for id in ids {
            self.add_output_node(id);
        }
    }

    /// Replaces the input sequence.
    ///
    /// Every input becomes an unmeasured node. An input that should be
    /// measured must be given a basis afterwards with
    /// [`assign_measurement`](Self::assign_measurement).
    pub fn set_input_nodes<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.inputs = ids.into_iter().collect();
        for id in self.inputs.clone() {
            self.add_node(id, None);
        }
    }

    /// Sets the measurement basis of an existing node, clearing its output role.
    pub fn assign_measurement(
        &mut self,
        id: NodeId,
        plane: Plane,
        angle: f64,
    ) -> Result<(), CoreError> {
        self.require(id)?;
        self.add_measured_node(id, plane, angle);
        Ok(())
    }

    /// Overwrites the plane of a measured node. Output nodes are left alone.
    pub(crate) fn set_plane(&mut self, id: NodeId, plane: Plane) {
        if let Some(Some(m)) = self.measurements.get_mut(&id) {
            m.plane = plane;
        }
    }

    // -----------------------------------------------------------------------
    // Edge methods
    // -----------------------------------------------------------------------

    /// Adds an undirected edge. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<(), CoreError> {
        self.check_edge(a, b)?;
        self.graph.add_edge(a, b, ());
        self.edges.insert(edge_key(a, b));
        Ok(())
    }

    /// Removes an edge, returning whether it was present.
    ///
    /// Later edges keep their relative order.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool, CoreError> {
        self.check_edge(a, b)?;
        self.graph.remove_edge(a, b);
        Ok(self.edges.shift_remove(&edge_key(a, b)))
    }

    /// XORs a single edge into the edge set. Returns whether it is now present.
    ///
    /// A re-added edge goes to the end of the edge sequence.
    pub fn toggle_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool, CoreError> {
        if self.remove_edge(a, b)? {
            Ok(false)
        } else {
            self.add_edge(a, b)?;
            Ok(true)
        }
    }

    /// Replaces the whole edge set. Nothing changes if any edge is invalid.
    pub fn set_edges<I>(&mut self, edges: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let edges: Vec<(NodeId, NodeId)> = edges.into_iter().collect();
        for &(a, b) in &edges {
            self.check_edge(a, b)?;
        }
        let edges: IndexSet<(NodeId, NodeId)> =
            edges.into_iter().map(|(a, b)| edge_key(a, b)).collect();
        let nodes = self.measurements.keys().copied().collect();
        self.rebuild(nodes, edges);
        Ok(())
    }

    /// Returns `true` if the edge `a - b` is present.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.contains_edge(a, b)
    }

    fn check_edge(&self, a: NodeId, b: NodeId) -> Result<(), CoreError> {
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Err(CoreError::SelfLoop { id: a });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Neighborhood queries
    // -----------------------------------------------------------------------

    /// Returns the neighbor set of a node.
    pub fn neighbors(&self, id: NodeId) -> Result<BTreeSet<NodeId>, CoreError> {
        self.require(id)?;
        Ok(self.graph.neighbors(id).collect())
    }

    /// Returns the odd neighborhood of a node set: the symmetric difference
    /// of the neighbor sets of its members.
    pub fn odd_neighborhood<I>(&self, nodes: I) -> Result<BTreeSet<NodeId>, CoreError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut odd = BTreeSet::new();
        for node in nodes {
            self.require(node)?;
            for neighbor in self.graph.neighbors(node) {
                if !odd.remove(&neighbor) {
                    odd.insert(neighbor);
                }
            }
        }
        Ok(odd)
    }

    // -----------------------------------------------------------------------
    // Relabeling
    // -----------------------------------------------------------------------

    /// Applies a node relabeling to edges, metadata, inputs and outputs in
    /// one pass. Nodes missing from `mapping` keep their identity.
    ///
    /// The mapping must be a bijection on the node set; otherwise nothing
    /// changes and `InvalidRelabel` is returned.
    pub fn relabel(&mut self, mapping: &HashMap<NodeId, NodeId>) -> Result<(), CoreError> {
        for &from in mapping.keys() {
            self.require(from)?;
        }
        let image = |id: NodeId| mapping.get(&id).copied().unwrap_or(id);

        let mut seen = HashSet::with_capacity(self.measurements.len());
        for &id in self.measurements.keys() {
            let to = image(id);
            if !seen.insert(to) {
                return Err(CoreError::InvalidRelabel {
                    reason: format!("NodeId({}) is the image of more than one node", to),
                });
            }
        }

        let nodes = self.measurements.keys().map(|&id| image(id)).collect();
        let edges = self
            .edges
            .iter()
            .map(|&(a, b)| edge_key(image(a), image(b)))
            .collect();
        self.rebuild(nodes, edges);
        self.measurements = self
            .measurements
            .iter()
            .map(|(&id, &m)| (image(id), m))
            .collect();
        self.inputs = self.inputs.iter().map(|&id| image(id)).collect();
        self.outputs = self.outputs.iter().map(|&id| image(id)).collect();
        Ok(())
    }

    /// Replaces adjacency and the edge sequence together.
    fn rebuild(&mut self, nodes: Vec<NodeId>, edges: IndexSet<(NodeId, NodeId)>) {
        let mut graph = UnGraphMap::with_capacity(nodes.len(), edges.len());
        for id in nodes {
            graph.add_node(id);
        }
        for &(a, b) in &edges {
            graph.add_edge(a, b, ());
        }
        self.graph = graph;
        self.edges = edges;
    }

    /// Exchanges the identities of two nodes.
    pub fn swap_labels(&mut self, u: NodeId, v: NodeId) -> Result<(), CoreError> {
        let mapping = HashMap::from([(u, v), (v, u)]);
        self.relabel(&mapping)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Returns `true` if the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.measurements.contains_key(&id)
    }

    pub(crate) fn require(&self, id: NodeId) -> Result<(), CoreError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(CoreError::UnknownNode { id })
        }
    }

    /// Returns the measurement of a node; `None` for outputs and unknown nodes.
    pub fn measurement(&self, id: NodeId) -> Option<Measurement> {
        self.measurements.get(&id).copied().flatten()
    }

    /// Returns the plane of a measured node.
    pub fn plane(&self, id: NodeId) -> Option<Plane> {
        self.measurement(id).map(|m| m.plane)
    }

    /// Returns `true` if the node exists and carries no measurement.
    pub fn is_output(&self, id: NodeId) -> bool {
        self.outputs.contains(&id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.measurements.keys().copied()
    }

    /// Measured nodes in insertion order.
    pub fn non_output_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.measurements
            .iter()
            .filter(|(_, m)| m.is_some())
            .map(|(&id, _)| id)
    }

    /// All edges in insertion order, each as a `(min, max)` pair.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges.iter().copied()
    }

    /// The input sequence.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// The output sequence.
    pub fn outputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.outputs.iter().copied()
    }

    /// Plane of every measured node, for the flow oracle.
    pub fn measurement_planes(&self) -> IndexMap<NodeId, Plane> {
        self.measurements
            .iter()
            .filter_map(|(&id, m)| m.map(|m| (id, m.plane)))
            .collect()
    }

    /// The read-only view handed to a flow oracle.
    pub fn flow_query(&self) -> FlowQuery<'_> {
        FlowQuery {
            graph: &self.graph,
            inputs: &self.inputs,
            outputs: self.outputs.iter().copied().collect(),
            planes: self.measurement_planes(),
        }
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.measurements.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The edge set, for order-insensitive comparisons.
    pub fn edge_set(&self) -> BTreeSet<(NodeId, NodeId)> {
        self.edges().collect()
    }
}

fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
