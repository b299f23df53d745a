#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value, json};

use plandag::config::{ConfigFile, DecomposeSection};
use plandag::engine::event::{TASK_CREATE, TASK_UPDATE};
use plandag::engine::{Orchestrator, TaskEvent};
use plandag::plan::{DAG_NODE_ID_KEY, DagState, Decomposer, Node, schedule};
use plandag::store::StateStore;

/// Builder for a plan request: ordered steps plus the agent pool.
#[derive(Debug, Clone, Default)]
pub struct StepsBuilder {
    steps: Vec<String>,
    agents: Vec<String>,
    decompose: DecomposeSection,
}

impl StepsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, text: &str) -> Self {
        self.steps.push(text.to_string());
        self
    }

    pub fn steps<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(texts.into_iter().map(Into::into));
        self
    }

    pub fn agent(mut self, name: &str) -> Self {
        self.agents.push(name.to_string());
        self
    }

    pub fn with_decompose(mut self, section: DecomposeSection) -> Self {
        self.decompose = section;
        self
    }

    pub fn step_texts(&self) -> &[String] {
        &self.steps
    }

    pub fn agent_names(&self) -> &[String] {
        &self.agents
    }

    pub fn decomposer(&self) -> Decomposer {
        Decomposer::new(&self.decompose).expect("valid keyword regex in test config")
    }

    /// Decompose only.
    pub fn nodes(&self) -> Vec<Node> {
        self.decomposer().decompose(&self.steps, &self.agents)
    }

    /// Decompose and schedule for `session`.
    pub fn schedule(&self, session: &str) -> DagState {
        schedule(session, "test prompt", self.nodes()).expect("schedule should succeed")
    }
}

/// Builder for host tool calls as `(tool_name, tool_input)` pairs.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    tool_name: String,
    input: Map<String, Value>,
}

impl EventBuilder {
    /// A `TaskCreate` carrying `metadata.dag_node_id`.
    pub fn create(node_id: &str) -> Self {
        Self::tool(TASK_CREATE).node_id(node_id)
    }

    /// A `TaskUpdate` for an external task id.
    pub fn update(task_id: &str) -> Self {
        Self::tool(TASK_UPDATE).field("taskId", json!(task_id))
    }

    /// Any other tool call.
    pub fn tool(name: &str) -> Self {
        Self {
            tool_name: name.to_string(),
            input: Map::new(),
        }
    }

    pub fn status(self, status: &str) -> Self {
        self.field("status", json!(status))
    }

    pub fn completed(self) -> Self {
        self.status("completed")
    }

    pub fn in_progress(self) -> Self {
        self.status("in_progress")
    }

    pub fn subject(self, subject: &str) -> Self {
        self.field("subject", json!(subject))
    }

    pub fn node_id(mut self, node_id: &str) -> Self {
        let metadata = self
            .input
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(md) = metadata {
            md.insert(DAG_NODE_ID_KEY.to_string(), json!(node_id));
        }
        self
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.input.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> (String, Value) {
        (self.tool_name, Value::Object(self.input))
    }

    /// Parsed form, for driving the advancer directly.
    pub fn event(self) -> Option<TaskEvent> {
        let (name, input) = self.build();
        TaskEvent::from_tool(&name, &input)
    }

    /// The hook payload as the host writes it to stdin.
    pub fn hook_json(self) -> String {
        let (name, input) = self.build();
        json!({ "tool_name": name, "tool_input": input }).to_string()
    }
}

/// An orchestrator with default settings whose state lives in `dir`.
pub fn orchestrator_in(dir: &Path) -> Orchestrator {
    let cfg = ConfigFile::default();
    let decomposer = Decomposer::new(&cfg.decompose).expect("default config is valid");
    let store = StateStore::new(dir, Duration::from_millis(cfg.state.lock_timeout_ms));
    Orchestrator::new(decomposer, store, cfg.state.max_age_days)
}
