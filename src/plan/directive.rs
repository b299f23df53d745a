// src/plan/directive.rs

//! Structured "what to dispatch next" output.
//!
//! Text rendering for the agent is left to the caller; this module only
//! exposes the data (plus a one-line `Display` for logs).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plan::node::Node;
use crate::plan::scheduler::DagState;

/// One node to dispatch in the current wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchNode {
    pub id: String,
    pub subject: String,
    pub agent: String,
}

impl From<&Node> for DispatchNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            subject: node.label.clone(),
            agent: node.data.agent.clone(),
        }
    }
}

/// Every ready node at the lowest open level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelDispatch {
    pub dag_id: String,
    pub level: usize,
    pub total_levels: usize,
    pub nodes: Vec<DispatchNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub dag_id: String,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    ParallelDispatch(ParallelDispatch),
    Complete(Completion),
}

impl Directive {
    pub fn completion(dag_id: &str) -> Self {
        Directive::Complete(Completion {
            dag_id: dag_id.to_string(),
            complete: true,
        })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Directive::Complete(_))
    }

    pub fn as_dispatch(&self) -> Option<&ParallelDispatch> {
        match self {
            Directive::ParallelDispatch(d) => Some(d),
            Directive::Complete(_) => None,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::ParallelDispatch(d) => {
                let ids: Vec<&str> = d.nodes.iter().map(|n| n.id.as_str()).collect();
                write!(
                    f,
                    "{}: dispatch wave {}/{} [{}]",
                    d.dag_id,
                    d.level + 1,
                    d.total_levels,
                    ids.join(", ")
                )
            }
            Directive::Complete(c) => write!(f, "{}: complete", c.dag_id),
        }
    }
}

/// Render the current frontier.
///
/// - ready nodes exist: dispatch every one at the lowest ready level
/// - nothing ready, plan resolved: completion
/// - nothing ready, plan unresolved: `None` (stalled; waiting on work in flight)
///
/// Pure: repeated calls against unchanged state return the same value.
pub fn build_directive(state: &DagState) -> Option<Directive> {
    let ready = state.ready_nodes();
    let Some(first) = ready.first() else {
        return state
            .is_complete()
            .then(|| Directive::completion(&state.id));
    };

    let level = first.data.level;
    let nodes = ready
        .iter()
        .filter(|n| n.data.level == level)
        .map(|n| DispatchNode::from(*n))
        .collect();

    Some(Directive::ParallelDispatch(ParallelDispatch {
        dag_id: state.id.clone(),
        level,
        total_levels: state.wave_count(),
        nodes,
    }))
}
