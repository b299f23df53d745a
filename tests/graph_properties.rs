// tests/graph_properties.rs

use std::collections::HashSet;

use proptest::prelude::*;
use plandag::dag::Dag;
use plandag::types::{NodeStatus, Relation};

// Random edge requests over a fixed vertex set. Unlike a generator that
// only emits forward edges, these include back edges and self loops, so the
// cycle guard is actually exercised.
fn edge_requests(max_vertices: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=max_vertices).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..(n * 3)),
        )
    })
}

fn build(n: usize, requests: &[(usize, usize)]) -> Dag<()> {
    let mut dag = Dag::new();
    for i in 0..n {
        dag.add_vertex(format!("v{i}"), format!("step {i}"), i as i32, ());
    }
    for &(from, to) in requests {
        let _ = dag.add_edge(&format!("v{from}"), &format!("v{to}"), Relation::Blocks);
    }
    dag
}

proptest! {
    #[test]
    fn test_graph_stays_acyclic((n, requests) in edge_requests(12)) {
        let dag = build(n, &requests);
        let order = dag.topological_sort();
        prop_assert!(order.is_ok());
        prop_assert_eq!(order.unwrap().len(), dag.len());
    }

    #[test]
    fn test_topological_order_respects_edges((n, requests) in edge_requests(12)) {
        let dag = build(n, &requests);
        let order: Vec<String> = dag
            .topological_sort()
            .unwrap()
            .into_iter()
            .map(|v| v.id.clone())
            .collect();
        for edge in dag.edges() {
            let from = order.iter().position(|x| *x == edge.from).unwrap();
            let to = order.iter().position(|x| *x == edge.to).unwrap();
            prop_assert!(from < to);
        }
    }

    #[test]
    fn test_degree_counters_match_adjacency((n, requests) in edge_requests(12)) {
        let dag = build(n, &requests);
        for v in dag.vertices() {
            prop_assert_eq!(v.in_degree(), dag.predecessors(&v.id).len());
            prop_assert_eq!(v.out_degree(), dag.successors(&v.id).len());
        }
        let total_out: usize = dag.vertices().map(|v| v.out_degree()).sum();
        prop_assert_eq!(total_out, dag.edge_count());
    }

    #[test]
    fn test_rejected_edge_changes_nothing(
        (n, requests) in edge_requests(10),
        extra in (0..10usize, 0..10usize),
    ) {
        let mut dag = build(n, &requests);
        let (from, to) = (format!("v{}", extra.0 % n), format!("v{}", extra.1 % n));

        let snapshot: Vec<_> = dag
            .vertices()
            .map(|v| (v.id.clone(), v.status, v.in_degree(), v.out_degree()))
            .collect();
        let edges = dag.edge_count();

        if dag.add_edge(&from, &to, Relation::Blocks).is_err() {
            let after: Vec<_> = dag
                .vertices()
                .map(|v| (v.id.clone(), v.status, v.in_degree(), v.out_degree()))
                .collect();
            prop_assert_eq!(snapshot, after);
            prop_assert_eq!(edges, dag.edge_count());
        }
    }

    #[test]
    fn test_ready_frontier_is_sound(
        (n, requests) in edge_requests(10),
        done in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let mut dag = build(n, &requests);

        // Complete a random subset in topological order so unblocking runs.
        let order: Vec<String> = dag
            .topological_sort()
            .unwrap()
            .into_iter()
            .map(|v| v.id.clone())
            .collect();
        let mut finished = HashSet::new();
        for (i, id) in order.iter().enumerate() {
            let deps_done = dag.predecessors(id).iter().all(|p| finished.contains(*p));
            if done[i] && deps_done {
                dag.update_status(id, NodeStatus::Done).unwrap();
                finished.insert(id.clone());
            }
        }

        for v in dag.ready() {
            prop_assert!(!v.status.is_done());
            for p in dag.predecessors(&v.id) {
                prop_assert!(dag.get(p).unwrap().status.is_done());
            }
        }
    }
}
