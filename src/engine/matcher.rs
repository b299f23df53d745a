// src/engine/matcher.rs

use serde::Serialize;

use crate::engine::event::UpdateEvent;
use crate::plan::scheduler::DagState;

/// How an update event was resolved to a node.
///
/// Strategies are tried in declaration order; the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum NodeMatch {
    /// The node already carries this external task id.
    ByTaskId { node: String },
    /// The event named the node through `metadata.dag_node_id`.
    ByNodeId { node: String },
    /// Exactly one unbound node has the event's subject.
    BySubject { node: String },
    /// Several nodes share the subject; nothing is applied.
    Ambiguous {
        subject: String,
        candidates: Vec<String>,
    },
    Unmatched,
}

impl NodeMatch {
    /// The resolved node, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            NodeMatch::ByTaskId { node }
            | NodeMatch::ByNodeId { node }
            | NodeMatch::BySubject { node } => Some(node),
            NodeMatch::Ambiguous { .. } | NodeMatch::Unmatched => None,
        }
    }

    /// Whether the event's task id should be bound to the resolved node.
    pub fn binds_task_id(&self) -> bool {
        matches!(self, NodeMatch::ByNodeId { .. } | NodeMatch::BySubject { .. })
    }
}

/// Resolve an update event to a node of `state`.
///
/// Subject matching is a last resort: it only runs when the event names no
/// node id, and only accepts a single unbound candidate.
pub fn resolve(state: &DagState, event: &UpdateEvent) -> NodeMatch {
    if let Some(node) = state.node_by_task_id(&event.task_id) {
        return NodeMatch::ByTaskId {
            node: node.id.clone(),
        };
    }

    if let Some(node_id) = event.node_id.as_deref() {
        return match state.node(node_id) {
            Some(node) => NodeMatch::ByNodeId {
                node: node.id.clone(),
            },
            None => NodeMatch::Unmatched,
        };
    }

    let Some(subject) = event.subject.as_deref() else {
        return NodeMatch::Unmatched;
    };

    match state.nodes_with_subject(subject).as_slice() {
        [] => NodeMatch::Unmatched,
        [only] if only.data.task_id.is_none() => NodeMatch::BySubject {
            node: only.id.clone(),
        },
        [_] => NodeMatch::Unmatched,
        many => NodeMatch::Ambiguous {
            subject: subject.to_string(),
            candidates: many.iter().map(|n| n.id.clone()).collect(),
        },
    }
}
