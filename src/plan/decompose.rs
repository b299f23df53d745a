// src/plan/decompose.rs

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::config::model::DecomposeSection;
use crate::config::validate::keyword_regex;
use crate::dag::graph::Vertex;
use crate::dag::id::generate_unique_id;
use crate::plan::node::{Assignment, DAG_NODE_ID_KEY, Node};
use crate::types::StepKind;

/// Prefix of scheduler-assigned node ids.
pub const NODE_ID_PREFIX: &str = "pd-";

/// Turns an ordered list of plan steps into typed graph nodes.
///
/// Research steps go to agents whose name contains the research marker;
/// everything else goes to the remaining agents. Each pool is walked
/// round-robin with its own counter.
#[derive(Debug, Clone)]
pub struct Decomposer {
    research_marker: String,
    keywords: Regex,
    research_fallback: String,
    implementation_fallback: String,
}

impl Decomposer {
    pub fn new(cfg: &DecomposeSection) -> Result<Self, regex::Error> {
        Ok(Self {
            research_marker: cfg.research_marker.clone(),
            keywords: keyword_regex(&cfg.research_keywords)?,
            research_fallback: cfg.research_fallback.clone(),
            implementation_fallback: cfg.implementation_fallback.clone(),
        })
    }

    /// Classify a single step.
    pub fn classify(&self, step: &str) -> StepKind {
        if self.keywords.is_match(&step.to_lowercase()) {
            StepKind::Research
        } else {
            StepKind::Implementation
        }
    }

    pub fn decompose<S, A>(&self, steps: &[S], agents: &[A]) -> Vec<Node>
    where
        S: AsRef<str>,
        A: AsRef<str>,
    {
        let (mut research, mut implementation): (Vec<&str>, Vec<&str>) = agents
            .iter()
            .map(AsRef::as_ref)
            .partition(|a| a.contains(self.research_marker.as_str()));
        if research.is_empty() {
            research.push(&self.research_fallback);
        }
        if implementation.is_empty() {
            implementation.push(&self.implementation_fallback);
        }

        let mut taken = HashSet::new();
        let (mut r_idx, mut i_idx) = (0usize, 0usize);

        steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let step = step.as_ref();
                let kind = self.classify(step);
                let agent = match kind {
                    StepKind::Research => {
                        let a = research[r_idx % research.len()];
                        r_idx += 1;
                        a
                    }
                    StepKind::Implementation => {
                        let a = implementation[i_idx % implementation.len()];
                        i_idx += 1;
                        a
                    }
                };

                let id = generate_unique_id(NODE_ID_PREFIX, step, &mut taken);
                debug!(node = %id, ?kind, agent, "decomposed step");

                let priority = i32::try_from(index).unwrap_or(i32::MAX);
                let mut node = Vertex::new(
                    id.clone(),
                    step,
                    priority,
                    Assignment {
                        agent: agent.to_string(),
                        description: step.to_string(),
                        kind,
                        task_id: None,
                        level: 0,
                    },
                );
                node.metadata.insert(DAG_NODE_ID_KEY.to_string(), id);
                node
            })
            .collect()
    }
}
