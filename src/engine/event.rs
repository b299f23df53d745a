// src/engine/event.rs

//! Lifecycle events reported by the host after the agent creates or updates
//! a real task.

use serde::Deserialize;
use serde_json::Value;

use crate::plan::node::DAG_NODE_ID_KEY;

pub const TASK_CREATE: &str = "TaskCreate";
pub const TASK_UPDATE: &str = "TaskUpdate";

/// Hook payload as delivered on stdin: `{ "tool_name": ..., "tool_input": {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
}

/// Status carried by an update event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Completed,
    InProgress,
}

impl UpdateStatus {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(UpdateStatus::Completed),
            "in_progress" => Some(UpdateStatus::InProgress),
            _ => None,
        }
    }
}

/// The real task for a node was created; its external id is not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEvent {
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub task_id: String,
    pub status: UpdateStatus,
    pub node_id: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Create(CreateEvent),
    Update(UpdateEvent),
}

impl TaskEvent {
    /// Parse a tool call into an event.
    ///
    /// Returns `None` for other tools, missing ids, or statuses the scheduler
    /// does not track. Malformed input is never an error.
    pub fn from_tool(tool_name: &str, input: &Value) -> Option<Self> {
        match tool_name {
            TASK_CREATE => {
                let node_id = metadata_node_id(input)?;
                Some(TaskEvent::Create(CreateEvent { node_id }))
            }
            TASK_UPDATE => {
                let task_id = non_empty_str(input, "taskId")?;
                let status = input
                    .get("status")
                    .and_then(Value::as_str)
                    .and_then(UpdateStatus::parse)?;
                Some(TaskEvent::Update(UpdateEvent {
                    task_id,
                    status,
                    node_id: metadata_node_id(input),
                    subject: non_empty_str(input, "subject"),
                }))
            }
            _ => None,
        }
    }
}

fn non_empty_str(input: &Value, key: &str) -> Option<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn metadata_node_id(input: &Value) -> Option<String> {
    input
        .get("metadata")
        .and_then(|md| non_empty_str(md, DAG_NODE_ID_KEY))
}
