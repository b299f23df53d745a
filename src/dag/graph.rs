// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DagError;
use crate::types::{NodeStatus, Relation};

/// A unit of work tracked by the graph.
///
/// `T` is the scheduler payload (agent assignment, level, ...). It is
/// flattened into the vertex when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex<T> {
    pub id: String,
    pub label: String,
    pub status: NodeStatus,
    #[serde(default)]
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub data: T,
    /// Number of incoming edges (blockers).
    #[serde(skip)]
    in_degree: usize,
    /// Number of outgoing edges (blocks).
    #[serde(skip)]
    out_degree: usize,
}

impl<T> Vertex<T> {
    pub fn new(id: impl Into<String>, label: impl Into<String>, priority: i32, data: T) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            label: label.into(),
            status: NodeStatus::Pending,
            priority,
            created_at: now,
            updated_at: now,
            metadata: BTreeMap::new(),
            data,
            in_degree: 0,
            out_degree: 0,
        }
    }

    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// A directed dependency: `from` must be done before `to` is eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub relation: Relation,
}

/// Per-status vertex counts plus edge count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DagStats {
    pub total: usize,
    pub pending: usize,
    pub ready: usize,
    pub dispatched: usize,
    pub running: usize,
    pub done: usize,
    pub blocked: usize,
    pub edges: usize,
}

/// Directed acyclic graph of work items.
///
/// Forward adjacency (`edges[from][to]`) owns the edges; `reverse[to]` is a
/// derived index of predecessor ids, maintained by the same mutations and
/// never holding vertex data itself.
#[derive(Debug, Clone)]
pub struct Dag<T> {
    vertices: BTreeMap<String, Vertex<T>>,
    edges: BTreeMap<String, BTreeMap<String, Edge>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl<T> Default for Dag<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Would adding `from -> to` close a cycle? True when `to` already reaches
/// `from` (including `from == to`). Pure; never mutates the graph.
pub fn would_create_cycle<T>(dag: &Dag<T>, from: &str, to: &str) -> bool {
    dag.has_path(to, from)
}

impl<T> Dag<T> {
    pub fn new() -> Self {
        Self {
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
            reverse: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Vertex<T>> {
        self.vertices.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Vertex<T>> {
        self.vertices.get_mut(id)
    }

    /// All vertices, ordered by id.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<T>> {
        self.vertices.values()
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex<T>> {
        self.vertices.values_mut()
    }

    /// All edges, ordered by `(from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flat_map(|targets| targets.values())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Add a vertex. Idempotent: an existing id is returned unchanged.
    pub fn add_vertex(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        priority: i32,
        data: T,
    ) -> &Vertex<T> {
        self.insert_vertex(Vertex::new(id, label, priority, data))
    }

    /// Register a pre-built vertex. Idempotent like [`Dag::add_vertex`];
    /// degree counters of the incoming value are ignored.
    pub fn insert_vertex(&mut self, mut vertex: Vertex<T>) -> &Vertex<T> {
        let id = vertex.id.clone();
        if !self.vertices.contains_key(&id) {
            vertex.in_degree = 0;
            vertex.out_degree = 0;
            self.edges.insert(id.clone(), BTreeMap::new());
            self.reverse.insert(id.clone(), BTreeSet::new());
            self.vertices.insert(id.clone(), vertex);
        }
        &self.vertices[&id]
    }

    /// Add a dependency edge `from -> to`.
    ///
    /// Every check runs before the graph is touched, so a rejected edge
    /// leaves adjacency and degree counters exactly as they were.
    pub fn add_edge(&mut self, from: &str, to: &str, relation: Relation) -> Result<(), DagError> {
        if !self.vertices.contains_key(from) {
            return Err(DagError::VertexNotFound(from.to_string()));
        }
        if !self.vertices.contains_key(to) {
            return Err(DagError::VertexNotFound(to.to_string()));
        }
        if from == to {
            return Err(DagError::SelfLoop(from.to_string()));
        }
        if self.edges.get(from).is_some_and(|t| t.contains_key(to)) {
            return Err(DagError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if would_create_cycle(self, from, to) {
            return Err(DagError::CycleDetected {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let edge = Edge {
            from: from.to_string(),
            to: to.to_string(),
            relation,
        };
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), edge);
        self.reverse
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());

        if let Some(v) = self.vertices.get_mut(from) {
            v.out_degree += 1;
        }
        if let Some(v) = self.vertices.get_mut(to) {
            v.in_degree += 1;
            if v.status == NodeStatus::Pending {
                v.set_status(NodeStatus::Blocked);
            }
        }

        debug!(from, to, %relation, "edge added");
        Ok(())
    }

    /// Remove the edge `from -> to`. A blocked target with no remaining
    /// predecessors returns to `Pending`.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<(), DagError> {
        let removed = self
            .edges
            .get_mut(from)
            .and_then(|targets| targets.remove(to));
        if removed.is_none() {
            return Err(DagError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if let Some(preds) = self.reverse.get_mut(to) {
            preds.remove(from);
        }

        if let Some(v) = self.vertices.get_mut(from) {
            v.out_degree -= 1;
        }
        if let Some(v) = self.vertices.get_mut(to) {
            v.in_degree -= 1;
            if v.in_degree == 0 && v.status == NodeStatus::Blocked {
                v.set_status(NodeStatus::Pending);
            }
        }
        Ok(())
    }

    /// Set a vertex status and refresh its timestamp.
    ///
    /// When the new status is `Done`, direct successors whose every
    /// predecessor is now done leave `Blocked`. This is one hop only; each
    /// completing predecessor triggers its own check. Returns the ids that
    /// were unblocked.
    pub fn update_status(&mut self, id: &str, status: NodeStatus) -> Result<Vec<String>, DagError> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| DagError::VertexNotFound(id.to_string()))?;
        vertex.set_status(status);

        let mut unblocked = Vec::new();
        if status.is_done() {
            let successors: Vec<String> = self
                .edges
                .get(id)
                .map(|targets| targets.keys().cloned().collect())
                .unwrap_or_default();
            for to in successors {
                if self.check_unblock(&to) {
                    unblocked.push(to);
                }
            }
        }
        Ok(unblocked)
    }

    fn check_unblock(&mut self, id: &str) -> bool {
        match self.vertices.get(id) {
            Some(v) if v.status == NodeStatus::Blocked => {}
            _ => return false,
        }
        if !self.all_predecessors_done(id) {
            return false;
        }
        if let Some(v) = self.vertices.get_mut(id) {
            v.set_status(NodeStatus::Pending);
            debug!(vertex = id, "all blockers done; unblocked");
        }
        true
    }

    fn all_predecessors_done(&self, id: &str) -> bool {
        self.reverse.get(id).is_none_or(|preds| {
            preds
                .iter()
                .all(|p| self.vertices.get(p).is_some_and(|v| v.status.is_done()))
        })
    }

    /// Vertices with no incomplete blockers: not done, not blocked, and every
    /// predecessor done. Ordered by `(priority, id)`.
    pub fn ready(&self) -> Vec<&Vertex<T>> {
        let mut ready: Vec<&Vertex<T>> = self
            .vertices
            .values()
            .filter(|v| {
                !v.status.is_done()
                    && v.status != NodeStatus::Blocked
                    && self.all_predecessors_done(&v.id)
            })
            .collect();
        ready.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        ready
    }

    /// Direct predecessors that are not yet done.
    pub fn blockers(&self, id: &str) -> Vec<&Vertex<T>> {
        self.reverse
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|p| self.vertices.get(p))
            .filter(|v| !v.status.is_done())
            .collect()
    }

    /// Direct successors.
    pub fn blocks(&self, id: &str) -> Vec<&Vertex<T>> {
        self.edges
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.keys())
            .filter_map(|to| self.vertices.get(to))
            .collect()
    }

    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.reverse
            .get(id)
            .map(|preds| preds.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.edges
            .get(id)
            .map(|targets| targets.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Depth-first reachability from `from` to `to`.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(targets) = self.edges.get(current) {
                stack.extend(targets.keys().map(String::as_str));
            }
        }
        false
    }

    /// Kahn's algorithm over a snapshot of the degree counters.
    pub fn topological_sort(&self) -> Result<Vec<&Vertex<T>>, DagError> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .vertices
            .iter()
            .map(|(id, v)| (id.as_str(), v.in_degree))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut sorted = Vec::with_capacity(self.vertices.len());
        while let Some(current) = queue.pop_front() {
            sorted.push(&self.vertices[current]);
            if let Some(targets) = self.edges.get(current) {
                for to in targets.keys() {
                    if let Some(deg) = in_degree.get_mut(to.as_str()) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(to.as_str());
                        }
                    }
                }
            }
        }

        if sorted.len() != self.vertices.len() {
            let stuck = in_degree
                .into_iter()
                .find(|&(_, deg)| deg > 0)
                .map(|(id, _)| id.to_string())
                .unwrap_or_default();
            return Err(DagError::CycleDetected {
                from: stuck.clone(),
                to: stuck,
            });
        }
        Ok(sorted)
    }

    /// Dispatch level per vertex: 0 without predecessors, otherwise one more
    /// than the highest predecessor level.
    pub fn levels(&self) -> Result<BTreeMap<String, usize>, DagError> {
        let mut levels: BTreeMap<String, usize> = BTreeMap::new();
        for v in self.topological_sort()? {
            let level = self
                .reverse
                .get(&v.id)
                .into_iter()
                .flatten()
                .filter_map(|p| levels.get(p))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            levels.insert(v.id.clone(), level);
        }
        Ok(levels)
    }

    pub fn stats(&self) -> DagStats {
        let mut stats = DagStats {
            total: self.vertices.len(),
            edges: self.edge_count(),
            ..DagStats::default()
        };
        for v in self.vertices.values() {
            match v.status {
                NodeStatus::Pending => stats.pending += 1,
                NodeStatus::Ready => stats.ready += 1,
                NodeStatus::Dispatched => stats.dispatched += 1,
                NodeStatus::Running => stats.running += 1,
                NodeStatus::Done => stats.done += 1,
                NodeStatus::Blocked => stats.blocked += 1,
            }
        }
        stats
    }
}
