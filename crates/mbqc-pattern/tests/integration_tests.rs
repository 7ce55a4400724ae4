//! End-to-end tests for the graph-to-pattern pipeline.
//!
//! Each test builds a graph state through the public builder API, obtains a
//! flow (hand-written or through a scripted oracle), optionally rewrites the
//! graph, and checks the compiled pattern.

use std::cell::RefCell;
use std::collections::BTreeSet;

use mbqc_core::{
    collect_signals, local_complement, pivot, CoreError, FlowOracle, FlowQuery, FlowStructure,
    GraphDocument, GraphState, NodeId, Plane,
};
use mbqc_pattern::{
    compile, compile_with_oracle, simulate, Backend, Command, CommandKind, ExecutionConfig,
    Pattern, PatternError,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn n(raw: u32) -> NodeId {
    NodeId(raw)
}

fn set(ids: &[u32]) -> BTreeSet<NodeId> {
    ids.iter().copied().map(NodeId).collect()
}

/// Input 0 measured in XY at angle 0, entangled with output 1.
fn single_step() -> (GraphState, FlowStructure) {
    let mut graph = GraphState::new();
    graph.set_input_nodes([n(0)]);
    graph.add_output_node(n(1));
    graph.assign_measurement(n(0), Plane::XY, 0.0).unwrap();
    graph.add_edge(n(0), n(1)).unwrap();

    let flow = FlowStructure::from_parts([(n(0), set(&[1]))], [(0, set(&[0]))]);
    (graph, flow)
}

/// Linear cluster 0 - 1 - ... - (len-1) with causal flow f(i) = i + 1.
fn linear_cluster(len: u32) -> (GraphState, FlowStructure) {
    let mut graph = GraphState::new();
    let mut flow = FlowStructure::new();
    graph.set_input_nodes([n(0)]);
    for i in 0..len - 1 {
        graph.add_measured_node(n(i), Plane::XY, 0.25 * i as f64);
        flow.set_corrections(n(i), [n(i + 1)]);
        flow.set_layer((len - 2 - i) as usize, [n(i)]);
    }
    graph.add_output_node(n(len - 1));
    for i in 0..len - 1 {
        graph.add_edge(n(i), n(i + 1)).unwrap();
    }
    (graph, flow)
}

/// Oracle returning canned answers and recording which searches ran.
struct ScriptedOracle {
    flow: Option<FlowStructure>,
    gflow: Option<FlowStructure>,
    calls: RefCell<Vec<&'static str>>,
}

impl ScriptedOracle {
    fn new(flow: Option<FlowStructure>, gflow: Option<FlowStructure>) -> Self {
        ScriptedOracle {
            flow,
            gflow,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FlowOracle for ScriptedOracle {
    fn find_flow(&self, query: &FlowQuery<'_>) -> Option<FlowStructure> {
        assert!(query.outputs.iter().all(|o| !query.planes.contains_key(o)));
        self.calls.borrow_mut().push("flow");
        self.flow.clone()
    }

    fn find_generalized_flow(&self, _query: &FlowQuery<'_>) -> Option<FlowStructure> {
        self.calls.borrow_mut().push("gflow");
        self.gflow.clone()
    }
}

/// Backend that records the pattern it was given.
#[derive(Default)]
struct RecordingBackend {
    seen: RefCell<Option<(Pattern, ExecutionConfig)>>,
}

impl Backend for RecordingBackend {
    type State = usize;
    type Error = String;

    fn run(&self, pattern: &Pattern, config: &ExecutionConfig) -> Result<usize, String> {
        *self.seen.borrow_mut() = Some((pattern.clone(), *config));
        Ok(pattern.output_nodes().len())
    }
}

struct FailingBackend;

impl Backend for FailingBackend {
    type State = ();
    type Error = String;

    fn run(&self, _pattern: &Pattern, _config: &ExecutionConfig) -> Result<(), String> {
        Err("out of qubits".to_string())
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

#[test]
fn single_step_pattern() {
    let (graph, flow) = single_step();
    let pattern = compile(&graph, &flow).unwrap();

    assert_eq!(pattern.count(CommandKind::N), 2);
    assert_eq!(pattern.count(CommandKind::E), 1);
    assert_eq!(pattern.count(CommandKind::M), 1);
    assert_eq!(
        pattern.commands()[3],
        Command::M {
            node: n(0),
            plane: Plane::XY,
            angle: 0.0,
            s_domain: BTreeSet::new(),
            t_domain: BTreeSet::new(),
        }
    );

    // The output's X-signal is {0}; its Z-signal is empty because the only
    // odd-neighborhood member of {1} is node 0 itself.
    assert_eq!(pattern.count(CommandKind::Z), 0);
    assert_eq!(
        pattern.commands()[4..],
        [Command::X {
            node: n(1),
            domain: set(&[0]),
        }]
    );
    assert_eq!(pattern.input_nodes(), &[n(0)]);
    assert_eq!(pattern.output_nodes(), &[n(1)]);
}

#[test]
fn linear_cluster_pattern_text() {
    let (graph, flow) = linear_cluster(4);
    let pattern = compile(&graph, &flow).unwrap();

    let expected = "\
N 0
N 1
N 2
N 3
E 0 1
E 1 2
E 2 3
M 0 XY 0 s=[] t=[]
M 1 XY 0.25 s=[0] t=[]
M 2 XY 0.5 s=[1] t=[0]
X 3 [2]
Z 3 [1]
";
    assert_eq!(pattern.to_string(), expected);
}

#[test]
fn compilation_is_deterministic() {
    let (graph, flow) = linear_cluster(6);
    let first = compile(&graph, &flow).unwrap();
    let second = compile(&graph, &flow).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn compilation_does_not_mutate_inputs() {
    let (graph, flow) = linear_cluster(4);
    let edges = graph.edge_set();
    let flow_before = flow.clone();
    compile(&graph, &flow).unwrap();
    assert_eq!(graph.edge_set(), edges);
    assert_eq!(flow, flow_before);
}

#[test]
fn signals_are_idempotent() {
    let (graph, flow) = linear_cluster(5);
    assert_eq!(
        collect_signals(&graph, &flow).unwrap(),
        collect_signals(&graph, &flow).unwrap()
    );
}

#[test]
fn missing_flow_entry_fails_compilation() {
    let (graph, _) = linear_cluster(3);
    let mut flow = FlowStructure::new();
    flow.set_corrections(n(0), [n(1)]);
    flow.set_layer(1, [n(0)]);
    flow.set_layer(0, [n(1)]);

    match compile(&graph, &flow) {
        Err(PatternError::Core(CoreError::MissingFlow { id })) => assert_eq!(id, n(1)),
        other => panic!("expected MissingFlow, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Oracle fallback
// ---------------------------------------------------------------------------

#[test]
fn oracle_flow_is_used_first() {
    let (graph, flow) = single_step();
    let oracle = ScriptedOracle::new(Some(flow.clone()), None);
    let pattern = compile_with_oracle(&graph, &oracle).unwrap();
    assert_eq!(pattern, compile(&graph, &flow).unwrap());
    assert_eq!(*oracle.calls.borrow(), vec!["flow"]);
}

#[test]
fn oracle_falls_back_to_generalized_flow() {
    let (graph, flow) = single_step();
    let oracle = ScriptedOracle::new(None, Some(flow));
    compile_with_oracle(&graph, &oracle).unwrap();
    assert_eq!(*oracle.calls.borrow(), vec!["flow", "gflow"]);
}

#[test]
fn oracle_without_flow_reports_no_flow() {
    let (graph, _) = single_step();
    let oracle = ScriptedOracle::new(None, None);
    assert!(matches!(
        compile_with_oracle(&graph, &oracle),
        Err(PatternError::Core(CoreError::NoFlow))
    ));
}

// ---------------------------------------------------------------------------
// Rewrites before compilation
// ---------------------------------------------------------------------------

#[test]
fn local_complement_keeps_flow_compilable() {
    let (mut graph, mut flow) = linear_cluster(4);
    local_complement(&mut graph, Some(&mut flow), n(2)).unwrap();

    assert_eq!(graph.plane(n(2)), Some(Plane::XZ));
    let pattern = compile(&graph, &flow).unwrap();
    assert_eq!(pattern.measurement_order(), vec![n(0), n(1), n(2)]);
    assert_eq!(pattern.count(CommandKind::E), 4);
}

#[test]
fn pivot_requires_flow_rediscovery() {
    let (mut graph, mut flow) = linear_cluster(4);
    pivot(&mut graph, Some(&mut flow), n(1), n(2)).unwrap();

    assert!(matches!(
        compile(&graph, &flow),
        Err(PatternError::Core(CoreError::StaleFlow))
    ));

    let fresh = FlowStructure::from_parts(
        [(n(0), set(&[3])), (n(1), set(&[3])), (n(2), set(&[3]))],
        [(0, set(&[0, 1, 2]))],
    );
    let oracle = ScriptedOracle::new(Some(fresh), None);
    let pattern = compile_with_oracle(&graph, &oracle).unwrap();
    assert_eq!(pattern.count(CommandKind::M), 3);
}

// ---------------------------------------------------------------------------
// Documents and backends
// ---------------------------------------------------------------------------

#[test]
fn document_compiles_like_builder_graph() {
    let json = r#"{
        "nodes": [{ "id": 0, "plane": "XY", "angle": 0.0 }, { "id": 1 }],
        "edges": [[0, 1]],
        "inputs": [0],
        "flow": { "corrections": { "0": [1] }, "layers": [[0]] }
    }"#;
    let (graph, flow) = GraphDocument::from_json(json).unwrap().into_parts().unwrap();
    let from_doc = compile(&graph, &flow.unwrap()).unwrap();

    let (graph, flow) = single_step();
    assert_eq!(from_doc, compile(&graph, &flow).unwrap());
}

#[test]
fn simulate_hands_pattern_to_backend() {
    let (graph, flow) = linear_cluster(3);
    let backend = RecordingBackend::default();
    let config = ExecutionConfig {
        minimize_space: true,
    };

    let outputs = simulate(&graph, &flow, &backend, &config).unwrap();
    assert_eq!(outputs, 1);

    let seen = backend.seen.borrow();
    let (pattern, seen_config) = seen.as_ref().unwrap();
    assert_eq!(pattern, &compile(&graph, &flow).unwrap());
    assert!(seen_config.minimize_space);
}

#[test]
fn simulate_reports_backend_failure() {
    let (graph, flow) = linear_cluster(3);
    match simulate(&graph, &flow, &FailingBackend, &ExecutionConfig::default()) {
        Err(PatternError::Backend(msg)) => assert_eq!(msg, "out of qubits"),
        other => panic!("expected backend error, got {:?}", other),
    }
}
