//! The measurement pattern: the ordered command sequence handed to an
//! execution engine.
//!
//! Five command kinds make up the vocabulary:
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `N`  | prepare a node in the |+> state |
//! | `E`  | entangle two nodes with CZ |
//! | `M`  | measure a node in a plane at an angle, adapted by its X (`s`) and Z (`t`) domains |
//! | `X`  | X correction on an output, conditioned on the parity of a domain |
//! | `Z`  | Z correction on an output, conditioned on the parity of a domain |

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use mbqc_core::{NodeId, Plane};

/// A single pattern command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Command {
    N {
        node: NodeId,
    },
    E {
        nodes: (NodeId, NodeId),
    },
    M {
        node: NodeId,
        plane: Plane,
        angle: f64,
        s_domain: BTreeSet<NodeId>,
        t_domain: BTreeSet<NodeId>,
    },
    X {
        node: NodeId,
        domain: BTreeSet<NodeId>,
    },
    Z {
        node: NodeId,
        domain: BTreeSet<NodeId>,
    },
}

/// Discriminant of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    N,
    E,
    M,
    X,
    Z,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::N { .. } => CommandKind::N,
            Command::E { .. } => CommandKind::E,
            Command::M { .. } => CommandKind::M,
            Command::X { .. } => CommandKind::X,
            Command::Z { .. } => CommandKind::Z,
        }
    }
}

fn write_domain(f: &mut fmt::Formatter<'_>, domain: &BTreeSet<NodeId>) -> fmt::Result {
    f.write_str("[")?;
    for (i, node) in domain.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", node)?;
    }
    f.write_str("]")
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::N { node } => write!(f, "N {}", node),
            Command::E { nodes: (a, b) } => write!(f, "E {} {}", a, b),
            Command::M {
                node,
                plane,
                angle,
                s_domain,
                t_domain,
            } => {
                write!(f, "M {} {} {} s=", node, plane, angle)?;
                write_domain(f, s_domain)?;
                f.write_str(" t=")?;
                write_domain(f, t_domain)
            }
            Command::X { node, domain } => {
                write!(f, "X {} ", node)?;
                write_domain(f, domain)
            }
            Command::Z { node, domain } => {
                write!(f, "Z {} ", node)?;
                write_domain(f, domain)
            }
        }
    }
}

/// A compiled pattern with its input and output node sequences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pattern {
    input_nodes: Vec<NodeId>,
    output_nodes: Vec<NodeId>,
    commands: Vec<Command>,
}

impl Pattern {
    pub fn new(input_nodes: Vec<NodeId>, output_nodes: Vec<NodeId>) -> Self {
        Pattern {
            input_nodes,
            output_nodes,
            commands: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn input_nodes(&self) -> &[NodeId] {
        &self.input_nodes
    }

    pub fn output_nodes(&self) -> &[NodeId] {
        &self.output_nodes
    }

    /// Number of commands of the given kind.
    pub fn count(&self, kind: CommandKind) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }

    /// Nodes in the order they are measured.
    pub fn measurement_order(&self) -> Vec<NodeId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::M { node, .. } => Some(*node),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{}", command)?;
        }
        Ok(())
    }
}
