//! JSON interchange format for graph states and their flow.
//!
//! A [`GraphDocument`] is the on-disk shape of a [`GraphState`] plus an
//! optional [`FlowStructure`]. Planes are kept as text so that a bad plane
//! name surfaces as `InvalidPlane` while converting, not as an opaque
//! deserialization failure.
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": 0, "plane": "XY", "angle": 0.5 },
//!     { "id": 1 }
//!   ],
//!   "edges": [[0, 1]],
//!   "inputs": [0],
//!   "outputs": [1],
//!   "flow": { "corrections": { "0": [1] }, "layers": [[0]] }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::flow::FlowStructure;
use crate::graph::GraphState;
use crate::id::NodeId;
use crate::plane::Plane;

/// One node entry. A node without a plane is an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

/// Flow entry: correction sets plus layers, layer `k` at index `k`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowSpec {
    pub corrections: BTreeMap<NodeId, Vec<NodeId>>,
    pub layers: Vec<Vec<NodeId>>,
}

/// Serialized graph state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<(NodeId, NodeId)>,
    #[serde(default)]
    pub inputs: Vec<NodeId>,
    /// Output order. Unmeasured nodes left out keep node order, ahead of
    /// the listed ones.
    #[serde(default)]
    pub outputs: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowSpec>,
}

impl GraphDocument {
    /// Builds the graph state (and flow, when present) this document describes.
    pub fn into_parts(self) -> Result<(GraphState, Option<FlowStructure>), CoreError> {
        let mut graph = GraphState::new();
        let mut measured = Vec::new();

        for spec in &self.nodes {
            match &spec.plane {
                Some(name) => {
                    let plane: Plane = name.parse()?;
                    let angle = spec.angle.unwrap_or(0.0);
                    graph.add_measured_node(spec.id, plane, angle);
                    measured.push((spec.id, plane, angle));
                }
                None => graph.add_output_node(spec.id),
            }
        }

        for &id in &self.inputs {
            graph.require(id)?;
        }
        graph.set_input_nodes(self.inputs.iter().copied());
        for (id, plane, angle) in measured {
            if self.inputs.contains(&id) {
                graph.assign_measurement(id, plane, angle)?;
            }
        }

        for &id in &self.outputs {
            graph.require(id)?;
            if !graph.is_output(id) {
                return Err(CoreError::MeasuredOutput { id });
            }
        }
        graph.add_output_nodes(self.outputs.iter().copied());

        for (a, b) in self.edges {
            graph.add_edge(a, b)?;
        }

        let flow = self.flow.map(|spec| {
            FlowStructure::from_parts(
                spec.corrections
                    .into_iter()
                    .map(|(node, set)| (node, set.into_iter().collect())),
                spec.layers
                    .into_iter()
                    .enumerate()
                    .map(|(k, layer)| (k, layer.into_iter().collect())),
            )
        });

        Ok((graph, flow))
    }

    /// Captures a graph state (and optionally its flow) as a document.
    pub fn from_parts(graph: &GraphState, flow: Option<&FlowStructure>) -> Self {
        let nodes = graph
            .nodes()
            .map(|id| {
                let measurement = graph.measurement(id);
                NodeSpec {
                    id,
                    plane: measurement.map(|m| m.plane.to_string()),
                    angle: measurement.map(|m| m.angle),
                }
            })
            .collect();

        let flow = flow.map(|flow| {
            let depth = flow.layers().keys().next_back().map_or(0, |&k| k + 1);
            let mut layers = vec![Vec::new(); depth];
            for (&k, layer) in flow.layers() {
                layers[k] = layer.iter().copied().collect();
            }
            FlowSpec {
                corrections: flow
                    .flow()
                    .iter()
                    .map(|(&node, set)| (node, set.iter().copied().collect()))
                    .collect(),
                layers,
            }
        });

        GraphDocument {
            nodes,
            edges: graph.edges().collect(),
            inputs: graph.inputs().to_vec(),
            outputs: graph.outputs().collect(),
            flow,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
