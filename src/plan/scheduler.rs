// src/plan/scheduler.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dag::graph::{Dag, DagStats};
use crate::dag::id::generate_id;
use crate::errors::{DagError, ScheduleError};
use crate::plan::node::{Assignment, Node};
use crate::types::{NodeStatus, Relation, StepKind};

/// Prefix of plan (DAG state) ids.
pub const DAG_ID_PREFIX: &str = "dag-";

/// One session's full scheduling state.
///
/// Serialized through [`RawDagState`]; deserializing rebuilds the graph
/// edge by edge, so a corrupted file cannot smuggle in a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "RawDagState", try_from = "RawDagState")]
pub struct DagState {
    pub id: String,
    pub session_id: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    graph: Dag<Assignment>,
    /// Highest dispatch level in the plan.
    pub max_level: usize,
}

impl DagState {
    pub fn new(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            id: generate_id(DAG_ID_PREFIX, &prompt),
            session_id: session_id.into(),
            prompt,
            created_at: Utc::now(),
            graph: Dag::new(),
            max_level: 0,
        }
    }

    pub fn graph(&self) -> &Dag<Assignment> {
        &self.graph
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.graph.get_mut(id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.vertices()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Number of dispatch waves.
    pub fn wave_count(&self) -> usize {
        if self.graph.is_empty() {
            0
        } else {
            self.max_level + 1
        }
    }

    pub fn stats(&self) -> DagStats {
        self.graph.stats()
    }

    /// Nodes in the `Ready` status, ordered by `(level, priority, id)`.
    pub fn ready_nodes(&self) -> Vec<&Node> {
        let mut ready: Vec<&Node> = self
            .graph
            .ready()
            .into_iter()
            .filter(|n| n.status == NodeStatus::Ready)
            .collect();
        ready.sort_by(|a, b| {
            a.data
                .level
                .cmp(&b.data.level)
                .then_with(|| a.priority.cmp(&b.priority))
                .then_with(|| a.id.cmp(&b.id))
        });
        ready
    }

    /// Every node is done (an empty plan is never complete).
    pub fn is_complete(&self) -> bool {
        !self.graph.is_empty() && self.graph.vertices().all(|n| n.status.is_done())
    }

    /// Plain status assignment.
    pub fn mark(&mut self, id: &str, status: NodeStatus) -> Result<(), DagError> {
        self.graph.update_status(id, status).map(|_| ())
    }

    /// Mark a node done and promote successors it unblocked to `Ready`.
    /// Returns the promoted ids.
    pub fn complete_node(&mut self, id: &str) -> Result<Vec<String>, DagError> {
        let unblocked = self.graph.update_status(id, NodeStatus::Done)?;
        for next in &unblocked {
            self.graph.update_status(next, NodeStatus::Ready)?;
            debug!(node = %next, "promoted to Ready");
        }
        Ok(unblocked)
    }

    /// Recompute every node's level and `max_level`.
    pub fn compute_levels(&mut self) -> Result<(), DagError> {
        let levels = self.graph.levels()?;
        let mut max_level = 0;
        for node in self.graph.vertices_mut() {
            let level = levels.get(&node.id).copied().unwrap_or(0);
            node.data.level = level;
            max_level = max_level.max(level);
        }
        self.max_level = max_level;
        Ok(())
    }

    /// Node ids whose subject equals `subject`.
    pub fn nodes_with_subject(&self, subject: &str) -> Vec<&Node> {
        self.graph.vertices().filter(|n| n.label == subject).collect()
    }

    /// Node bound to the given external task id.
    pub fn node_by_task_id(&self, task_id: &str) -> Option<&Node> {
        self.graph
            .vertices()
            .find(|n| n.data.task_id.as_deref() == Some(task_id))
    }
}

/// Build a session-scoped graph from decomposed nodes.
///
/// Implementation steps form a single chain in input order; research steps
/// get no edges and are eligible immediately. Any edge failure aborts the
/// whole call.
pub fn schedule(
    session_id: &str,
    prompt: &str,
    nodes: Vec<Node>,
) -> Result<DagState, ScheduleError> {
    let mut state = DagState::new(session_id, prompt);

    let order: Vec<(String, StepKind)> = nodes.iter().map(|n| (n.id.clone(), n.data.kind)).collect();
    for node in nodes {
        state.graph.insert_vertex(node);
    }

    let mut last_impl: Option<String> = None;
    for (id, kind) in order {
        if kind == StepKind::Research {
            continue;
        }
        if let Some(prev) = last_impl.as_deref() {
            state
                .graph
                .add_edge(prev, &id, Relation::Blocks)
                .map_err(|source| ScheduleError::Edge {
                    from: prev.to_string(),
                    to: id.clone(),
                    source,
                })?;
        }
        last_impl = Some(id);
    }

    let roots: Vec<String> = state
        .graph
        .vertices()
        .filter(|n| n.in_degree() == 0)
        .map(|n| n.id.clone())
        .collect();
    for id in roots {
        state
            .graph
            .update_status(&id, NodeStatus::Ready)
            .map_err(ScheduleError::Leveling)?;
    }

    state.compute_levels().map_err(ScheduleError::Leveling)?;

    info!(
        dag = %state.id,
        session = %state.session_id,
        nodes = state.len(),
        edges = state.graph.edge_count(),
        waves = state.wave_count(),
        "scheduled plan"
    );
    Ok(state)
}

/// On-disk shape of a plan node: the vertex plus its direct dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedNode {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// On-disk shape of a [`DagState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDagState {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub nodes: BTreeMap<String, PersistedNode>,
    #[serde(default)]
    pub max_level: usize,
}

impl From<DagState> for RawDagState {
    fn from(state: DagState) -> Self {
        let graph = state.graph;
        let nodes = graph
            .vertices()
            .map(|n| {
                let depends_on = graph.predecessors(&n.id).into_iter().map(String::from).collect();
                (
                    n.id.clone(),
                    PersistedNode {
                        node: n.clone(),
                        depends_on,
                    },
                )
            })
            .collect();

        RawDagState {
            id: state.id,
            session_id: state.session_id,
            prompt: state.prompt,
            created_at: state.created_at,
            nodes,
            max_level: state.max_level,
        }
    }
}

impl TryFrom<RawDagState> for DagState {
    type Error = DagError;

    fn try_from(raw: RawDagState) -> Result<Self, Self::Error> {
        let mut graph = Dag::new();
        let mut deps = Vec::new();

        for (key, persisted) in raw.nodes {
            let mut node = persisted.node;
            if node.id.is_empty() {
                node.id = key;
            }
            for from in persisted.depends_on {
                deps.push((from, node.id.clone()));
            }
            graph.insert_vertex(node);
        }

        let statuses: Vec<(String, NodeStatus)> =
            graph.vertices().map(|n| (n.id.clone(), n.status)).collect();
        // Edge insertion flips Pending to Blocked; the persisted status wins.
        for (from, to) in deps {
            graph.add_edge(&from, &to, Relation::Blocks)?;
        }
        for (id, status) in statuses {
            if let Some(node) = graph.get_mut(&id) {
                node.status = status;
            }
        }

        Ok(DagState {
            id: raw.id,
            session_id: raw.session_id,
            prompt: raw.prompt,
            created_at: raw.created_at,
            graph,
            max_level: raw.max_level,
        })
    }
}
