// src/plan/mod.rs

//! Plan construction on top of the graph core.
//!
//! - [`decompose`] turns plan steps into typed nodes with agent assignments.
//! - [`scheduler`] wires dependencies, computes dispatch levels and owns the
//!   per-session [`DagState`].
//! - [`directive`] renders the current dispatch wave or a completion signal.

pub mod decompose;
pub mod directive;
pub mod node;
pub mod scheduler;

pub use decompose::Decomposer;
pub use directive::{Directive, DispatchNode, ParallelDispatch, build_directive};
pub use node::{Assignment, DAG_NODE_ID_KEY, Node};
pub use scheduler::{DagState, schedule};
