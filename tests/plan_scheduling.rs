// tests/plan_scheduling.rs

mod common;

use plandag::config::DecomposeSection;
use plandag::plan::decompose::NODE_ID_PREFIX;
use plandag::plan::{DAG_NODE_ID_KEY, Directive, build_directive, schedule};
use plandag::types::{NodeStatus, StepKind};
use plandag_test_utils::builders::StepsBuilder;

use common::node_id;

#[test]
fn test_research_and_implementation_get_separate_agents() {
    let nodes = StepsBuilder::new()
        .step("Research OAuth providers")
        .step("Implement login endpoint")
        .agent("research-director")
        .agent("backend-engineer")
        .nodes();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].data.kind, StepKind::Research);
    assert_eq!(nodes[0].data.agent, "research-director");
    assert_eq!(nodes[1].data.kind, StepKind::Implementation);
    assert_eq!(nodes[1].data.agent, "backend-engineer");

    for (i, node) in nodes.iter().enumerate() {
        assert!(node.id.starts_with(NODE_ID_PREFIX));
        assert_eq!(node.id.len(), NODE_ID_PREFIX.len() + 6);
        assert_eq!(node.priority, i as i32);
        assert_eq!(node.status, NodeStatus::Pending);
        assert_eq!(node.label, node.data.description);
        assert_eq!(node.metadata.get(DAG_NODE_ID_KEY), Some(&node.id));
    }
}

#[test]
fn test_independent_steps_are_all_ready_at_level_zero() {
    plandag_test_utils::init_tracing();
    let state = StepsBuilder::new()
        .step("Research OAuth providers")
        .step("Implement login endpoint")
        .agent("research-director")
        .agent("backend-engineer")
        .schedule("session-a");

    assert_eq!(state.graph().edge_count(), 0);
    assert_eq!(state.max_level, 0);
    assert_eq!(state.wave_count(), 1);
    for node in state.nodes() {
        assert_eq!(node.status, NodeStatus::Ready);
        assert_eq!(node.data.level, 0);
    }

    let Some(Directive::ParallelDispatch(wave)) = build_directive(&state) else {
        panic!("expected a dispatch directive");
    };
    assert_eq!(wave.level, 0);
    assert_eq!(wave.total_levels, 1);
    assert_eq!(wave.nodes.len(), 2);
}

#[test]
fn test_implementation_steps_form_a_chain() {
    let state = StepsBuilder::new()
        .steps(["Implement A", "Implement B", "Implement C"])
        .agent("backend-engineer")
        .schedule("session-b");

    let (a, b, c) = (
        node_id(&state, "Implement A"),
        node_id(&state, "Implement B"),
        node_id(&state, "Implement C"),
    );
    assert_eq!(state.graph().successors(&a), vec![b.as_str()]);
    assert_eq!(state.graph().successors(&b), vec![c.as_str()]);
    assert_eq!(state.graph().edge_count(), 2);

    assert_eq!(state.node(&a).unwrap().status, NodeStatus::Ready);
    assert_eq!(state.node(&b).unwrap().status, NodeStatus::Blocked);
    assert_eq!(state.node(&c).unwrap().status, NodeStatus::Blocked);

    assert_eq!(state.node(&a).unwrap().data.level, 0);
    assert_eq!(state.node(&b).unwrap().data.level, 1);
    assert_eq!(state.node(&c).unwrap().data.level, 2);
    assert_eq!(state.max_level, 2);
    assert_eq!(state.wave_count(), 3);
}

#[test]
fn test_research_steps_float_free_of_the_chain() {
    let state = StepsBuilder::new()
        .steps(["Implement schema", "Investigate caching", "Implement API"])
        .agent("research-analyst")
        .agent("backend-engineer")
        .schedule("session-mixed");

    let research = node_id(&state, "Investigate caching");
    let schema = node_id(&state, "Implement schema");
    let api = node_id(&state, "Implement API");

    assert!(state.graph().predecessors(&research).is_empty());
    assert!(state.graph().successors(&research).is_empty());
    assert_eq!(state.graph().predecessors(&api), vec![schema.as_str()]);

    let ready: Vec<&str> = state.ready_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ready.len(), 2);
    assert!(ready.contains(&research.as_str()));
    assert!(ready.contains(&schema.as_str()));
}

#[test]
fn test_round_robin_within_each_pool() {
    let nodes = StepsBuilder::new()
        .steps([
            "Implement one",
            "Research two",
            "Implement three",
            "Research four",
            "Implement five",
        ])
        .agent("research-a")
        .agent("research-b")
        .agent("frontend")
        .agent("backend")
        .nodes();

    let agents: Vec<&str> = nodes.iter().map(|n| n.data.agent.as_str()).collect();
    assert_eq!(
        agents,
        vec!["frontend", "research-a", "backend", "research-b", "frontend"]
    );
}

#[test]
fn test_empty_pools_use_fallback_agents() {
    let nodes = StepsBuilder::new()
        .step("Explore the codebase")
        .step("Write migration")
        .nodes();

    assert_eq!(nodes[0].data.agent, "research-director");
    assert_eq!(nodes[1].data.agent, "general-purpose");

    let only_research = StepsBuilder::new()
        .step("Write migration")
        .agent("research-director")
        .nodes();
    assert_eq!(only_research[0].data.agent, "general-purpose");
}

#[test]
fn test_keyword_match_is_case_insensitive_substring() {
    let decomposer = StepsBuilder::new().decomposer();
    assert_eq!(decomposer.classify("SEARCH logs"), StepKind::Research);
    assert_eq!(decomposer.classify("Refind the bug"), StepKind::Research);
    assert_eq!(decomposer.classify("Deploy service"), StepKind::Implementation);
}

#[test]
fn test_keyword_match_uses_plain_lowercasing() {
    let decomposer = StepsBuilder::new().decomposer();
    // `ſ` lowercases to itself, so this is not "research".
    assert_eq!(decomposer.classify("Reſearch options"), StepKind::Implementation);
    assert_eq!(decomposer.classify("RESEARCH options"), StepKind::Research);

    let section = DecomposeSection {
        research_keywords: vec!["Survey".into()],
        ..DecomposeSection::default()
    };
    let decomposer = StepsBuilder::new().with_decompose(section).decomposer();
    assert_eq!(decomposer.classify("quick SURVEY"), StepKind::Research);
}

#[test]
fn test_custom_keywords_and_marker() {
    let section = DecomposeSection {
        research_marker: "scout".into(),
        research_keywords: vec!["survey".into()],
        ..DecomposeSection::default()
    };
    let nodes = StepsBuilder::new()
        .with_decompose(section)
        .step("Survey options")
        .step("Research is now implementation")
        .agent("scout-1")
        .agent("builder")
        .nodes();

    assert_eq!(nodes[0].data.kind, StepKind::Research);
    assert_eq!(nodes[0].data.agent, "scout-1");
    assert_eq!(nodes[1].data.kind, StepKind::Implementation);
    assert_eq!(nodes[1].data.agent, "builder");
}

#[test]
fn test_duplicate_steps_get_distinct_ids() {
    let nodes = StepsBuilder::new()
        .steps(["Implement X", "Implement X", "Implement X"])
        .nodes();
    let mut ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_empty_plan_schedules_to_nothing() {
    let state = schedule("empty", "nothing to do", Vec::new()).unwrap();
    assert!(state.is_empty());
    assert_eq!(state.wave_count(), 0);
    assert!(!state.is_complete());
    assert_eq!(build_directive(&state), None);
}

#[test]
fn test_directive_is_stable_across_calls() {
    let state = StepsBuilder::new()
        .steps(["Implement A", "Research B"])
        .schedule("stable");
    assert_eq!(build_directive(&state), build_directive(&state));
}
