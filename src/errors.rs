// src/errors.rs

//! Crate-wide error types.
//!
//! Each layer has its own enum; [`PlandagError`] unifies them for the
//! orchestrator and CLI entry points.

use std::path::PathBuf;

use thiserror::Error;

/// Structural errors raised by the graph core on invalid mutation requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("vertex not found: {0}")]
    VertexNotFound(String),

    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: String, to: String },

    #[error("adding edge {from} -> {to} would create cycle")]
    CycleDetected { from: String, to: String },

    #[error("edge already exists: {from} -> {to}")]
    DuplicateEdge { from: String, to: String },

    #[error("self-loops not allowed: {0}")]
    SelfLoop(String),
}

/// Malformed input to the delegation check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("malformed delegation edge {0:?}, expected PARENT>CHILD")]
    MalformedEdge(String),
}

/// Failure while turning decomposed nodes into a scheduled graph.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("edge {from}->{to}: {source}")]
    Edge {
        from: String,
        to: String,
        #[source]
        source: DagError,
    },

    #[error("leveling: {0}")]
    Leveling(#[source] DagError),
}

/// Persistence faults, tagged with the stage that failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mkdir: {path:?}: {source}")]
    Mkdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("marshal: {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("unmarshal: {path:?}: {source}")]
    Unmarshal {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("read: {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write: {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock: {path:?}: {reason}")]
    Lock { path: PathBuf, reason: String },

    #[error("invalid state: {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DagError,
    },

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("no state for session: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum PlandagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlandagError>;
