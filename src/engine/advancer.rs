// src/engine/advancer.rs

//! Event-driven state machine over a [`DagState`].
//!
//! Events move nodes forward only:
//!
//! ```text
//! Ready --create--> Dispatched --update(in_progress)--> Running --update(completed)--> Done
//! ```
//!
//! Unknown, malformed or unresolvable events are swallowed; the caller
//! just gets back the (unchanged) directive.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::event::{CreateEvent, TaskEvent, UpdateEvent, UpdateStatus};
use crate::engine::matcher::{NodeMatch, resolve};
use crate::plan::directive::{Directive, build_directive};
use crate::plan::scheduler::DagState;
use crate::types::NodeStatus;

/// What an event did to the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Not an event the scheduler tracks.
    Ignored,
    /// A create event marked the node dispatched.
    Dispatched { node: String },
    /// An update event moved the node to `status`.
    Applied {
        node: String,
        #[serde(rename = "match")]
        via: NodeMatch,
        status: NodeStatus,
    },
    /// The node was found but is already at or past the requested status.
    Unchanged { node: String, status: NodeStatus },
    /// No node could be resolved (including ambiguous subjects).
    NoMatch {
        #[serde(rename = "match")]
        via: NodeMatch,
    },
}

/// Result of advancing the plan by one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advance {
    pub complete: bool,
    /// Set together with `complete`: the whole plan should be verified.
    pub needs_final_verification: bool,
    /// Next wave, completion, or `None` while work is in flight.
    pub directive: Option<Directive>,
    pub outcome: EventOutcome,
}

/// Apply one (optional) event and report where the plan stands.
pub fn advance(state: &mut DagState, event: Option<&TaskEvent>) -> Advance {
    let outcome = match event {
        None => EventOutcome::Ignored,
        Some(TaskEvent::Create(ev)) => apply_create(state, ev),
        Some(TaskEvent::Update(ev)) => apply_update(state, ev),
    };

    if state.is_complete() {
        info!(dag = %state.id, "all nodes done; plan complete");
        return Advance {
            complete: true,
            needs_final_verification: true,
            directive: Some(Directive::completion(&state.id)),
            outcome,
        };
    }

    Advance {
        complete: false,
        needs_final_verification: false,
        directive: build_directive(state),
        outcome,
    }
}

fn apply_create(state: &mut DagState, ev: &CreateEvent) -> EventOutcome {
    let Some(current) = state.node(&ev.node_id).map(|n| n.status) else {
        debug!(node = %ev.node_id, "create event for unknown node; ignoring");
        return EventOutcome::NoMatch {
            via: NodeMatch::Unmatched,
        };
    };

    if current == NodeStatus::Dispatched || !current.can_advance_to(NodeStatus::Dispatched) {
        return EventOutcome::Unchanged {
            node: ev.node_id.clone(),
            status: current,
        };
    }

    match state.mark(&ev.node_id, NodeStatus::Dispatched) {
        Ok(()) => {
            debug!(node = %ev.node_id, from = %current, "node dispatched");
            EventOutcome::Dispatched {
                node: ev.node_id.clone(),
            }
        }
        Err(e) => {
            warn!(node = %ev.node_id, error = %e, "failed to mark node dispatched");
            EventOutcome::NoMatch {
                via: NodeMatch::Unmatched,
            }
        }
    }
}

fn apply_update(state: &mut DagState, ev: &UpdateEvent) -> EventOutcome {
    let via = resolve(state, ev);
    let Some(node_id) = via.node_id().map(String::from) else {
        match &via {
            NodeMatch::Ambiguous { subject, candidates } => warn!(
                task = %ev.task_id,
                subject = %subject,
                ?candidates,
                "update event subject is ambiguous; ignoring"
            ),
            _ => debug!(task = %ev.task_id, "update event matches no node; ignoring"),
        }
        return EventOutcome::NoMatch { via };
    };

    if via.binds_task_id() {
        if let Some(node) = state.node_mut(&node_id) {
            node.data.task_id = Some(ev.task_id.clone());
            debug!(node = %node_id, task = %ev.task_id, "bound external task id");
        }
    }

    let current = match state.node(&node_id) {
        Some(node) => node.status,
        None => return EventOutcome::NoMatch { via },
    };
    let target = match ev.status {
        UpdateStatus::Completed => NodeStatus::Done,
        UpdateStatus::InProgress => NodeStatus::Running,
    };

    if current == target || !current.can_advance_to(target) {
        return EventOutcome::Unchanged {
            node: node_id,
            status: current,
        };
    }

    let result = match target {
        NodeStatus::Done => state.complete_node(&node_id).map(|promoted| {
            if !promoted.is_empty() {
                debug!(node = %node_id, ?promoted, "completion unblocked successors");
            }
        }),
        _ => state.mark(&node_id, target),
    };

    match result {
        Ok(()) => {
            debug!(node = %node_id, from = %current, to = %target, "node advanced");
            EventOutcome::Applied {
                node: node_id,
                via,
                status: target,
            }
        }
        Err(e) => {
            warn!(node = %node_id, error = %e, "failed to apply update event");
            EventOutcome::NoMatch { via }
        }
    }
}
