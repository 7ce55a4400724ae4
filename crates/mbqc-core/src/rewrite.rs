//! Graph rewrites that preserve the represented state up to local basis
//! changes: local complementation and pivot.
//!
//! Both rewrites toggle edge subsets and rotate measurement planes through
//! the tables on [`Plane`]. Local complementation also keeps a flow
//! consistent; pivot relabels the flow and marks it stale, since no update
//! rule for it is defined.
//!
//! Every precondition is checked before the first mutation, so an error
//! leaves the graph and flow untouched.

use std::collections::{BTreeSet, HashMap};

use crate::error::CoreError;
use crate::flow::FlowStructure;
use crate::graph::GraphState;
use crate::id::NodeId;
use crate::plane::Plane;

/// XORs `node` into `set`.
fn toggle(set: &mut BTreeSet<NodeId>, node: NodeId) {
    if !set.remove(&node) {
        set.insert(node);
    }
}

/// Toggles every edge of the complete bipartite graph between `left` and `right`.
fn toggle_bipartite(
    graph: &mut GraphState,
    left: &BTreeSet<NodeId>,
    right: &BTreeSet<NodeId>,
) -> Result<usize, CoreError> {
    let mut count = 0;
    for &a in left {
        for &b in right {
            graph.toggle_edge(a, b)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Applies local complementation at `target`.
///
/// Complements the subgraph induced by the neighborhood of `target`,
/// rotates `target`'s plane (XY <-> XZ) and every other measured node's
/// plane (XZ <-> YZ), and, when a flow is given, updates it:
///
/// - `target` is toggled into its own correction set;
/// - every other measured node `m` with `target` in the odd neighborhood
///   of its correction set gets `target` and the members of `target`'s
///   correction set toggled into it.
///
/// The self-toggle is applied for every plane, YZ included. Output targets
/// keep no plane and no correction set of their own. Layers are not
/// touched.
pub fn local_complement(
    graph: &mut GraphState,
    mut flow: Option<&mut FlowStructure>,
    target: NodeId,
) -> Result<(), CoreError> {
    let neighbors: Vec<NodeId> = graph.neighbors(target)?.into_iter().collect();
    let target_plane = graph.plane(target);
    let others: Vec<NodeId> = graph.non_output_nodes().filter(|&n| n != target).collect();

    if let Some(flow) = flow.as_deref() {
        flow.ensure_fresh()?;
        for &id in others.iter().chain(target_plane.map(|_| &target)) {
            let corrections = flow.corrections(id).ok_or(CoreError::MissingFlow { id })?;
            for &member in corrections {
                graph.require(member)?;
            }
        }
        // An output target may still carry a correction set that gets composed.
        for &member in flow.corrections(target).into_iter().flatten() {
            graph.require(member)?;
        }
    }

    let mut toggled = 0;
    for (i, &a) in neighbors.iter().enumerate() {
        for &b in &neighbors[i + 1..] {
            graph.toggle_edge(a, b)?;
            toggled += 1;
        }
    }

    if let Some(plane) = target_plane {
        graph.set_plane(target, plane.local_complement_target());
    }
    for &node in &others {
        if let Some(plane) = graph.plane(node) {
            graph.set_plane(node, plane.local_complement_other());
        }
    }

    if let Some(flow) = flow.as_deref_mut() {
        if target_plane.is_some() {
            toggle(flow.corrections_mut(target), target);
        }
        let target_corrections = flow.corrections(target).cloned().unwrap_or_default();

        let mut updated = 0;
        for &node in &others {
            let corrections = flow
                .corrections(node)
                .ok_or(CoreError::MissingFlow { id: node })?;
            if !graph
                .odd_neighborhood(corrections.iter().copied())?
                .contains(&target)
            {
                continue;
            }
            let corrections = flow.corrections_mut(node);
            toggle(corrections, target);
            for &member in &target_corrections {
                toggle(corrections, member);
            }
            updated += 1;
        }
        tracing::debug!(%target, toggled, updated, "local complementation");
    } else {
        tracing::debug!(%target, toggled, "local complementation without flow");
    }

    Ok(())
}

/// Applies a pivot on the pair `u`, `v`.
///
/// The neighbors of `u` and `v` (excluding `u` and `v`) split into
/// shared, `u`-only and `v`-only classes; the complete bipartite edge sets
/// between each pair of classes are toggled. The two nodes then exchange
/// identities, and both have their planes rotated (XY <-> YZ).
///
/// A given flow is relabeled with the same exchange and marked stale:
/// it must be rediscovered before signals or patterns are derived.
pub fn pivot(
    graph: &mut GraphState,
    flow: Option<&mut FlowStructure>,
    u: NodeId,
    v: NodeId,
) -> Result<(), CoreError> {
    if u == v {
        return Err(CoreError::InvalidPivot { id: u });
    }
    let pair = BTreeSet::from([u, v]);
    let u_neighbors: BTreeSet<NodeId> = graph.neighbors(u)?.difference(&pair).copied().collect();
    let v_neighbors: BTreeSet<NodeId> = graph.neighbors(v)?.difference(&pair).copied().collect();

    let shared: BTreeSet<NodeId> = u_neighbors.intersection(&v_neighbors).copied().collect();
    let only_u: BTreeSet<NodeId> = u_neighbors.difference(&v_neighbors).copied().collect();
    let only_v: BTreeSet<NodeId> = v_neighbors.difference(&u_neighbors).copied().collect();

    let mut toggled = toggle_bipartite(graph, &shared, &only_u)?;
    toggled += toggle_bipartite(graph, &shared, &only_v)?;
    toggled += toggle_bipartite(graph, &only_u, &only_v)?;

    graph.swap_labels(u, v)?;
    for node in [u, v] {
        if let Some(plane) = graph.plane(node) {
            graph.set_plane(node, Plane::pivot(plane));
        }
    }

    if let Some(flow) = flow {
        flow.relabel(&HashMap::from([(u, v), (v, u)]));
        flow.invalidate();
    }

    tracing::debug!(%u, %v, toggled, "pivot");
    Ok(())
}
