// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [state]
/// dir = "/home/me/.plandag/dag"
/// max_age_days = 7
/// lock_timeout_ms = 2000
///
/// [decompose]
/// research_marker = "research"
/// research_keywords = ["research", "search", "explore", "investigate", "find", "read"]
/// research_fallback = "research-director"
/// implementation_fallback = "general-purpose"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Persistence settings from `[state]`.
    #[serde(default)]
    pub state: StateSection,

    /// Step classification and agent pools from `[decompose]`.
    #[serde(default)]
    pub decompose: DecomposeSection,
}

/// `[state]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StateSection {
    /// Directory holding one `<session>.json` per session.
    ///
    /// If `None`, `$HOME/.plandag/dag` is used.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Age after which `cleanup` removes state files.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,

    /// How long to wait for another invocation's lock on a session file.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_max_age_days() -> u64 {
    7
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            dir: None,
            max_age_days: default_max_age_days(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// `[decompose]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DecomposeSection {
    /// Agents whose name contains this marker form the research pool.
    #[serde(default = "default_research_marker")]
    pub research_marker: String,

    /// Steps containing any of these (case-insensitive) are research steps.
    #[serde(default = "default_research_keywords")]
    pub research_keywords: Vec<String>,

    /// Used when no research agent is available.
    #[serde(default = "default_research_fallback")]
    pub research_fallback: String,

    /// Used when no implementation agent is available.
    #[serde(default = "default_implementation_fallback")]
    pub implementation_fallback: String,
}

fn default_research_marker() -> String {
    "research".to_string()
}

pub fn default_research_keywords() -> Vec<String> {
    ["research", "search", "explore", "investigate", "find", "read"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_research_fallback() -> String {
    "research-director".to_string()
}

fn default_implementation_fallback() -> String {
    "general-purpose".to_string()
}

impl Default for DecomposeSection {
    fn default() -> Self {
        Self {
            research_marker: default_research_marker(),
            research_keywords: default_research_keywords(),
            research_fallback: default_research_fallback(),
            implementation_fallback: default_implementation_fallback(),
        }
    }
}
