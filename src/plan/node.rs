// src/plan/node.rs

//! Scheduler payload carried by each graph vertex.

use serde::{Deserialize, Serialize};

use crate::dag::graph::Vertex;
use crate::types::StepKind;

/// Metadata key carrying the scheduler-assigned node id across the
/// external task boundary.
pub const DAG_NODE_ID_KEY: &str = "dag_node_id";

/// Agent assignment and scheduling data for a plan step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub agent: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: StepKind,
    /// External task id, bound once an update event identifies this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Dispatch wave; computed by the scheduler.
    #[serde(default)]
    pub level: usize,
}

/// A plan node: a graph vertex whose label is the step subject.
pub type Node = Vertex<Assignment>;
