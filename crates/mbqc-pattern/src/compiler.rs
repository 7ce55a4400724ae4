//! Graph-to-pattern compilation.
//!
//! [`compile`] emits, in order:
//! 1. one `N` per node, in node insertion order
//! 2. one `E` per edge, in edge insertion order (an edge removed and
//!    re-added by a rewrite counts as inserted again)
//! 3. one `M` per measured node, from the highest layer down to layer 0,
//!    insertion order within a layer, each carrying its X/Z signals
//! 4. an `X` and/or `Z` per output whose signals are non-empty
//!
//! The output is a pure function of its inputs, so compiling the same
//! graph and flow twice yields identical patterns.

use mbqc_core::{collect_signals, CoreError, FlowOracle, FlowStructure, GraphState};

use crate::error::PatternError;
use crate::pattern::{Command, Pattern};

/// Compile a graph state and its flow to a pattern.
///
/// Rejects stale flow, layerings that do not partition the measured
/// nodes, and measured nodes without a correction set.
pub fn compile(graph: &GraphState, flow: &FlowStructure) -> Result<Pattern, PatternError> {
    flow.ensure_fresh()?;
    flow.validate_layers(graph)?;
    let signals = collect_signals(graph, flow)?;

    let mut pattern = Pattern::new(graph.inputs().to_vec(), graph.outputs().collect());

    // 1. Preparation
    for node in graph.nodes() {
        pattern.push(Command::N { node });
    }

    // 2. Entanglement
    for nodes in graph.edges() {
        pattern.push(Command::E { nodes });
    }

    // 3. Measurements, later layers first
    for layer in flow.layers().values().rev() {
        for node in graph.non_output_nodes().filter(|n| layer.contains(n)) {
            let measurement = graph
                .measurement(node)
                .ok_or(CoreError::UnknownNode { id: node })?;
            pattern.push(Command::M {
                node,
                plane: measurement.plane,
                angle: measurement.angle,
                s_domain: signals.x_of(node),
                t_domain: signals.z_of(node),
            });
        }
    }

    // 4. Output corrections
    for node in graph.outputs() {
        let domain = signals.x_of(node);
        if !domain.is_empty() {
            pattern.push(Command::X { node, domain });
        }
        let domain = signals.z_of(node);
        if !domain.is_empty() {
            pattern.push(Command::Z { node, domain });
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        depth = flow.depth(),
        commands = pattern.len(),
        "compiled pattern"
    );

    Ok(pattern)
}

/// Discover a flow through `oracle` (flow first, then generalized flow)
/// and compile with it.
pub fn compile_with_oracle<O>(graph: &GraphState, oracle: &O) -> Result<Pattern, PatternError>
where
    O: FlowOracle + ?Sized,
{
    let flow = FlowStructure::discover(graph, oracle)?;
    compile(graph, &flow)
}
