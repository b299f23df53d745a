// src/dag/mod.rs

//! Graph core.
//!
//! - [`graph`] holds the cycle-safe vertex/edge store with readiness queries.
//! - [`id`] generates short hash ids for nodes and plans.
//! - [`chain`] checks agent delegation chains for cycles.

pub mod chain;
pub mod graph;
pub mod id;

pub use graph::{Dag, DagStats, Edge, Vertex, would_create_cycle};
