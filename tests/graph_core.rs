// tests/graph_core.rs

use plandag::dag::{Dag, would_create_cycle};
use plandag::errors::DagError;
use plandag::types::{NodeStatus, Relation};

fn dag_with(ids: &[&str]) -> Dag<()> {
    let mut dag = Dag::new();
    for (i, id) in ids.iter().enumerate() {
        dag.add_vertex(*id, format!("task {id}"), i as i32, ());
    }
    dag
}

#[test]
fn test_add_edge_updates_forward_reverse_and_degrees() {
    let mut dag = dag_with(&["a", "b"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();

    assert_eq!(dag.successors("a"), vec!["b"]);
    assert_eq!(dag.predecessors("b"), vec!["a"]);
    assert_eq!(dag.get("a").unwrap().out_degree(), 1);
    assert_eq!(dag.get("b").unwrap().in_degree(), 1);
    assert_eq!(dag.edge_count(), 1);
    assert_eq!(dag.get("b").unwrap().status, NodeStatus::Blocked);
    assert_eq!(dag.get("a").unwrap().status, NodeStatus::Pending);
}

#[test]
fn test_add_vertex_is_idempotent() {
    let mut dag = dag_with(&["a"]);
    dag.add_vertex("a", "different label", 99, ());

    assert_eq!(dag.len(), 1);
    let a = dag.get("a").unwrap();
    assert_eq!(a.label, "task a");
    assert_eq!(a.priority, 0);
}

#[test]
fn test_rejected_edges_report_specific_errors() {
    let mut dag = dag_with(&["a", "b"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();

    assert_eq!(
        dag.add_edge("a", "missing", Relation::Blocks),
        Err(DagError::VertexNotFound("missing".into()))
    );
    assert_eq!(
        dag.add_edge("a", "a", Relation::Blocks),
        Err(DagError::SelfLoop("a".into()))
    );
    assert_eq!(
        dag.add_edge("a", "b", Relation::Related),
        Err(DagError::DuplicateEdge {
            from: "a".into(),
            to: "b".into()
        })
    );
    assert_eq!(
        dag.add_edge("b", "a", Relation::Blocks),
        Err(DagError::CycleDetected {
            from: "b".into(),
            to: "a".into()
        })
    );
}

#[test]
fn test_cycle_rejection_leaves_graph_unchanged() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();

    let before: Vec<_> = dag
        .vertices()
        .map(|v| (v.id.clone(), v.status, v.in_degree(), v.out_degree()))
        .collect();
    let edges_before = dag.edge_count();

    let err = dag.add_edge("c", "a", Relation::Blocks).unwrap_err();
    assert!(matches!(err, DagError::CycleDetected { .. }));

    let after: Vec<_> = dag
        .vertices()
        .map(|v| (v.id.clone(), v.status, v.in_degree(), v.out_degree()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(dag.edge_count(), edges_before);
    assert!(dag.successors("c").is_empty());
    assert!(dag.predecessors("a").is_empty());
}

#[test]
fn test_would_create_cycle_is_pure() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();

    assert!(would_create_cycle(&dag, "c", "a"));
    assert!(would_create_cycle(&dag, "b", "b"));
    assert!(!would_create_cycle(&dag, "a", "c"));
    assert_eq!(dag.edge_count(), 2);
}

#[test]
fn test_topological_sort_orders_every_vertex() {
    let mut dag = dag_with(&["d", "c", "b", "a"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.add_edge("a", "c", Relation::Blocks).unwrap();
    dag.add_edge("b", "d", Relation::Blocks).unwrap();
    dag.add_edge("c", "d", Relation::Blocks).unwrap();

    let order: Vec<&str> = dag
        .topological_sort()
        .unwrap()
        .into_iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(order.len(), 4);

    let pos = |id: &str| order.iter().position(|x| *x == id).unwrap();
    for edge in dag.edges() {
        assert!(pos(&edge.from) < pos(&edge.to), "{} before {}", edge.from, edge.to);
    }
}

#[test]
fn test_levels_follow_longest_path() {
    let mut dag = dag_with(&["a", "b", "c", "d"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();
    dag.add_edge("a", "c", Relation::Blocks).unwrap();

    let levels = dag.levels().unwrap();
    assert_eq!(levels["a"], 0);
    assert_eq!(levels["b"], 1);
    assert_eq!(levels["c"], 2);
    assert_eq!(levels["d"], 0);
}

#[test]
fn test_done_unblocks_only_when_all_predecessors_done() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "c", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();

    let unblocked = dag.update_status("a", NodeStatus::Done).unwrap();
    assert!(unblocked.is_empty());
    assert_eq!(dag.get("c").unwrap().status, NodeStatus::Blocked);

    let unblocked = dag.update_status("b", NodeStatus::Done).unwrap();
    assert_eq!(unblocked, vec!["c".to_string()]);
    assert_eq!(dag.get("c").unwrap().status, NodeStatus::Pending);
}

#[test]
fn test_unblock_is_one_hop() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();

    dag.update_status("a", NodeStatus::Done).unwrap();
    assert_eq!(dag.get("b").unwrap().status, NodeStatus::Pending);
    assert_eq!(dag.get("c").unwrap().status, NodeStatus::Blocked);
}

#[test]
fn test_update_status_is_idempotent() {
    let mut dag = dag_with(&["a", "b"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();

    dag.update_status("a", NodeStatus::Done).unwrap();
    let again = dag.update_status("a", NodeStatus::Done).unwrap();
    assert!(again.is_empty(), "b is no longer blocked, so nothing to report");
    assert_eq!(dag.get("a").unwrap().status, NodeStatus::Done);
    assert_eq!(dag.get("b").unwrap().status, NodeStatus::Pending);
}

#[test]
fn test_update_status_unknown_vertex() {
    let mut dag = dag_with(&["a"]);
    assert_eq!(
        dag.update_status("nope", NodeStatus::Done),
        Err(DagError::VertexNotFound("nope".into()))
    );
}

#[test]
fn test_ready_lists_unblocked_unfinished_vertices_by_priority() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "c", Relation::Blocks).unwrap();

    let ready: Vec<&str> = dag.ready().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ready, vec!["a", "b"]);

    dag.update_status("a", NodeStatus::Done).unwrap();
    let ready: Vec<&str> = dag.ready().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ready, vec!["b", "c"]);
}

#[test]
fn test_blockers_and_blocks() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "c", Relation::Blocks).unwrap();
    dag.add_edge("b", "c", Relation::Blocks).unwrap();
    dag.update_status("a", NodeStatus::Done).unwrap();

    let blockers: Vec<&str> = dag.blockers("c").iter().map(|v| v.id.as_str()).collect();
    assert_eq!(blockers, vec!["b"]);
    let blocks: Vec<&str> = dag.blocks("b").iter().map(|v| v.id.as_str()).collect();
    assert_eq!(blocks, vec!["c"]);
}

#[test]
fn test_remove_edge_restores_pending_and_degrees() {
    let mut dag = dag_with(&["a", "b"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.remove_edge("a", "b").unwrap();

    assert_eq!(dag.edge_count(), 0);
    assert_eq!(dag.get("a").unwrap().out_degree(), 0);
    assert_eq!(dag.get("b").unwrap().in_degree(), 0);
    assert_eq!(dag.get("b").unwrap().status, NodeStatus::Pending);
    assert!(dag.predecessors("b").is_empty());

    assert_eq!(
        dag.remove_edge("a", "b"),
        Err(DagError::EdgeNotFound {
            from: "a".into(),
            to: "b".into()
        })
    );
}

#[test]
fn test_stats_counts_statuses_and_edges() {
    let mut dag = dag_with(&["a", "b", "c"]);
    dag.add_edge("a", "b", Relation::Blocks).unwrap();
    dag.update_status("c", NodeStatus::Done).unwrap();

    let stats = dag.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.blocked, 1);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.edges, 1);
}
