// src/engine/orchestrator.rs

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::dag::graph::DagStats;
use crate::engine::advancer::{Advance, advance};
use crate::engine::event::TaskEvent;
use crate::errors::{PlandagError, Result};
use crate::plan::decompose::Decomposer;
use crate::plan::directive::{Directive, build_directive};
use crate::plan::scheduler::{DagState, schedule};
use crate::store::StateStore;
use crate::types::NodeStatus;

/// A freshly scheduled plan and its first dispatch wave.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub state: DagState,
    pub directive: Option<Directive>,
}

/// One node's line in a [`StatusReport`].
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub subject: String,
    pub agent: String,
    pub status: NodeStatus,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub dag_id: String,
    pub session_id: String,
    pub prompt: String,
    pub waves: usize,
    pub complete: bool,
    pub stats: DagStats,
    pub nodes: Vec<NodeSummary>,
}

impl From<&DagState> for StatusReport {
    fn from(state: &DagState) -> Self {
        let mut nodes: Vec<NodeSummary> = state
            .nodes()
            .map(|n| NodeSummary {
                id: n.id.clone(),
                subject: n.label.clone(),
                agent: n.data.agent.clone(),
                status: n.status,
                level: n.data.level,
                task_id: n.data.task_id.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.id.cmp(&b.id)));

        Self {
            dag_id: state.id.clone(),
            session_id: state.session_id.clone(),
            prompt: state.prompt.clone(),
            waves: state.wave_count(),
            complete: state.is_complete(),
            stats: state.stats(),
            nodes,
        }
    }
}

/// Everything one invocation needs: step classification and the state store.
///
/// Built once from configuration and passed around explicitly; nothing is
/// kept in process-wide state.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    decomposer: Decomposer,
    store: StateStore,
    max_age_days: u64,
}

impl Orchestrator {
    pub fn new(decomposer: Decomposer, store: StateStore, max_age_days: u64) -> Self {
        Self {
            decomposer,
            store,
            max_age_days,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let decomposer = Decomposer::new(&cfg.decompose)
            .map_err(|e| PlandagError::ConfigError(format!("research_keywords: {e}")))?;
        Ok(Self::new(
            decomposer,
            StateStore::from_config(&cfg.state),
            cfg.state.max_age_days,
        ))
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Decompose and schedule without touching the store.
    pub fn preview<S, A>(
        &self,
        session_id: &str,
        prompt: &str,
        steps: &[S],
        agents: &[A],
    ) -> Result<PlanOutcome>
    where
        S: AsRef<str>,
        A: AsRef<str>,
    {
        let nodes = self.decomposer.decompose(steps, agents);
        let state = schedule(session_id, prompt, nodes)?;
        let directive = build_directive(&state);
        Ok(PlanOutcome { state, directive })
    }

    /// Build a plan for the session and persist it, replacing any previous one.
    pub fn plan<S, A>(
        &self,
        session_id: &str,
        prompt: &str,
        steps: &[S],
        agents: &[A],
    ) -> Result<PlanOutcome>
    where
        S: AsRef<str>,
        A: AsRef<str>,
    {
        let outcome = self.preview(session_id, prompt, steps, agents)?;
        self.store.save(&outcome.state)?;
        match &outcome.directive {
            Some(directive) => info!(session = %session_id, %directive, "plan saved"),
            None => info!(session = %session_id, dag = %outcome.state.id, "plan saved"),
        }
        Ok(outcome)
    }

    /// Apply one host tool call to the session's plan.
    ///
    /// `Ok(None)` when the session has no plan; unrecognised tool calls still
    /// report the current directive.
    pub fn handle_event(
        &self,
        session_id: &str,
        tool_name: &str,
        input: &Value,
    ) -> Result<Option<Advance>> {
        let event = TaskEvent::from_tool(tool_name, input);
        if event.is_none() {
            debug!(tool = %tool_name, "tool call is not a tracked task event");
        }

        let advanced = self
            .store
            .update(session_id, |state| advance(state, event.as_ref()))?;
        if advanced.is_none() {
            debug!(session = %session_id, "no plan for session; event ignored");
        }
        Ok(advanced)
    }

    /// Current directive for the session, `Ok(None)` if there is no plan or
    /// nothing is dispatchable right now.
    pub fn directive(&self, session_id: &str) -> Result<Option<Directive>> {
        let Some(state) = self.store.load_optional(session_id)? else {
            return Ok(None);
        };
        if state.is_complete() {
            return Ok(Some(Directive::completion(&state.id)));
        }
        Ok(build_directive(&state))
    }

    pub fn status(&self, session_id: &str) -> Result<StatusReport> {
        let state = self.store.load(session_id)?;
        Ok(StatusReport::from(&state))
    }

    /// Remove stale session files; `None` uses the configured age.
    pub fn cleanup(&self, max_age_days: Option<u64>) -> Result<usize> {
        let days = max_age_days.unwrap_or(self.max_age_days);
        Ok(self.store.cleanup_old(days)?)
    }
}
