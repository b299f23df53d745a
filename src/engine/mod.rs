// src/engine/mod.rs

//! Event-driven advancement of a persisted plan.
//!
//! - [`event`] parses host tool calls into [`TaskEvent`]s.
//! - [`matcher`] resolves an update event to a plan node.
//! - [`advancer`] is the pure state machine: one event in, one [`Advance`] out.
//! - [`orchestrator`] is the IO shell that loads, advances and saves state.

pub mod advancer;
pub mod event;
pub mod matcher;
pub mod orchestrator;

pub use advancer::{Advance, EventOutcome, advance};
pub use event::{CreateEvent, HookInput, TaskEvent, UpdateEvent, UpdateStatus};
pub use matcher::{NodeMatch, resolve};
pub use orchestrator::{NodeSummary, Orchestrator, PlanOutcome, StatusReport};
