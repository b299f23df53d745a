#![allow(dead_code)]

use plandag::engine::{Advance, advance};
use plandag::plan::DagState;
use plandag_test_utils::builders::EventBuilder;

/// Node id of the step with the given subject. Panics if absent or shared.
pub fn node_id(state: &DagState, subject: &str) -> String {
    let matches = state.nodes_with_subject(subject);
    assert_eq!(matches.len(), 1, "expected exactly one node for {subject:?}");
    matches[0].id.clone()
}

/// Drive a node through create -> in_progress -> completed, binding `task_id`.
pub fn run_to_done(state: &mut DagState, node: &str, task_id: &str) -> Advance {
    advance(state, EventBuilder::create(node).event().as_ref());
    advance(
        state,
        EventBuilder::update(task_id)
            .in_progress()
            .node_id(node)
            .event()
            .as_ref(),
    );
    advance(state, EventBuilder::update(task_id).completed().event().as_ref())
}
