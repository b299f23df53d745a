// src/dag/chain.rs

//! Cycle checks for agent delegation chains (`ceo -> engineer -> ...`).

use std::collections::{HashMap, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;

use crate::errors::ChainError;

/// Result of checking a delegation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainCheck {
    pub valid: bool,
    /// The repeating slice, e.g. `["A", "B", "A"]`. Empty when valid.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
}

impl ChainCheck {
    fn from_cycle(cycle: Option<Vec<String>>) -> Self {
        match cycle {
            Some(cycle) => Self { valid: false, cycle },
            None => Self {
                valid: true,
                cycle: Vec::new(),
            },
        }
    }
}

/// Report the first agent that re-enters the chain.
pub fn validate_chain<S: AsRef<str>>(chain: &[S]) -> ChainCheck {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, agent) in chain.iter().enumerate() {
        let agent = agent.as_ref();
        if let Some(&first) = seen.get(agent) {
            return ChainCheck::from_cycle(Some(
                chain[first..=i].iter().map(|a| a.as_ref().to_string()).collect(),
            ));
        }
        seen.insert(agent, i);
    }
    ChainCheck::from_cycle(None)
}

/// Check a set of `parent -> child` delegation edges for a cycle.
///
/// Returns the cycle as a closed path, e.g. `["ceo", "lead", "ceo"]`.
pub fn find_cycle<'a, I>(edges: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (parent, child) in edges {
        graph.add_edge(parent, child, ());
    }

    match toposort(&graph, None) {
        Ok(_order) => None,
        Err(cycle) => Some(cycle_through(&graph, cycle.node_id())),
    }
}

/// Shortest path from `start` back to itself.
fn cycle_through<'a>(graph: &DiGraphMap<&'a str, ()>, start: &'a str) -> Vec<String> {
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbors(node) {
            if next == start {
                let mut back = Vec::new();
                let mut cur = node;
                while cur != start {
                    back.push(cur);
                    match parent.get(cur) {
                        Some(&p) => cur = p,
                        None => break,
                    }
                }
                let mut path = vec![start.to_string()];
                path.extend(back.into_iter().rev().map(String::from));
                path.push(start.to_string());
                return path;
            }
            if !parent.contains_key(next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    // toposort only reports nodes that sit on a cycle
    vec![start.to_string()]
}

/// Check delegation edges and report the cycle path, if any.
pub fn check_edges<S: AsRef<str>>(edges: &[(S, S)]) -> ChainCheck {
    ChainCheck::from_cycle(find_cycle(
        edges.iter().map(|(p, c)| (p.as_ref(), c.as_ref())),
    ))
}

/// Split a comma-separated chain, trimming whitespace and dropping blanks.
pub fn parse_chain(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `ceo>lead, lead->engineer` into `(parent, child)` pairs.
pub fn parse_edges(raw: &str) -> Result<Vec<(String, String)>, ChainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|edge| {
            let (parent, child) = edge
                .split_once("->")
                .or_else(|| edge.split_once('>'))
                .ok_or_else(|| ChainError::MalformedEdge(edge.to_string()))?;
            let (parent, child) = (parent.trim(), child.trim());
            if parent.is_empty() || child.is_empty() {
                return Err(ChainError::MalformedEdge(edge.to_string()));
            }
            Ok((parent.to_string(), child.to_string()))
        })
        .collect()
}
