use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a graph vertex / plan node.
///
/// Nodes move forward through `Pending -> Ready -> Dispatched -> Running -> Done`.
/// `Blocked` is a side-state held while any predecessor is not yet `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Ready,
    Dispatched,
    Running,
    Done,
    Blocked,
}

impl NodeStatus {
    /// Terminal "completed" status.
    pub fn is_done(self) -> bool {
        self == NodeStatus::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Ready => "ready",
            NodeStatus::Dispatched => "dispatched",
            NodeStatus::Running => "running",
            NodeStatus::Done => "done",
            NodeStatus::Blocked => "blocked",
        }
    }

    /// Position on the forward path. `Blocked` sits with `Pending`.
    fn rank(self) -> u8 {
        match self {
            NodeStatus::Pending | NodeStatus::Blocked => 0,
            NodeStatus::Ready => 1,
            NodeStatus::Dispatched => 2,
            NodeStatus::Running => 3,
            NodeStatus::Done => 4,
        }
    }

    /// Whether an external lifecycle event may move a node from `self` to
    /// `next`. Equal ranks are allowed so that replays stay no-ops.
    pub fn can_advance_to(self, next: NodeStatus) -> bool {
        !self.is_done() && next.rank() >= self.rank()
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of dependency carried by an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// `from` must be done before `to` is eligible.
    #[default]
    Blocks,
    Related,
    Parent,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Blocks => "blocks",
            Relation::Related => "related",
            Relation::Parent => "parent",
        };
        f.write_str(s)
    }
}

/// Classification of a plan step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Parallel-safe; never depends on another step.
    Research,
    /// Chained sequentially behind the previous implementation step.
    #[default]
    Implementation,
}
