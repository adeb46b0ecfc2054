//! Scenario Kernel: Decision Graph Analysis
//!
//! Structural checks over the scenario's node graph. Pure; used by
//! invariant validation and the CLI `inspect` command.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use crate::scenario::Scenario;

/// One edge that points at a node the document does not define.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingChoice {
    pub node_id: String,
    pub choice_index: usize,
    pub next_node_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub node_count: usize,
    pub duplicate_node_ids: Vec<String>,
    pub dangling_choices: Vec<DanglingChoice>,
    pub unreachable_nodes: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub terminal_reachable: bool,
}

impl GraphReport {
    /// Cycles are reported but not fatal: scenarios may loop back.
    pub fn is_playable(&self) -> bool {
        self.duplicate_node_ids.is_empty()
            && self.dangling_choices.is_empty()
            && self.terminal_reachable
    }
}

/// Adjacency keyed by node id, targets sorted for determinism.
fn adjacency(scenario: &Scenario) -> BTreeMap<&str, Vec<&str>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for node in scenario.nodes() {
        let targets = adj.entry(node.id.as_str()).or_default();
        for choice in &node.choices {
            targets.push(choice.next_node_id.as_str());
        }
    }
    for list in adj.values_mut() {
        list.sort();
        list.dedup();
    }
    adj
}

pub fn find_duplicate_node_ids(scenario: &Scenario) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for node in scenario.nodes() {
        if !seen.insert(node.id.as_str()) {
            dups.insert(node.id.clone());
        }
    }
    dups.into_iter().collect()
}

/// Choices whose `nextNodeId` is neither a defined node nor the terminal id.
pub fn find_dangling_choices(scenario: &Scenario, terminal_node_id: &str) -> Vec<DanglingChoice> {
    let mut out = Vec::new();
    for node in scenario.nodes() {
        for (idx, choice) in node.choices.iter().enumerate() {
            let target = choice.next_node_id.as_str();
            if target != terminal_node_id && !scenario.contains_node(target) {
                out.push(DanglingChoice {
                    node_id: node.id.clone(),
                    choice_index: idx,
                    next_node_id: choice.next_node_id.clone(),
                });
            }
        }
    }
    out
}

/// Breadth-first reachability from the first node.
pub fn reachable_from_start(scenario: &Scenario) -> BTreeSet<String> {
    let adj = adjacency(scenario);
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let Some((_, start)) = scenario.first_position() else {
        return seen;
    };
    let mut queue: VecDeque<&str> = VecDeque::from([start.id.as_str()]);
    seen.insert(start.id.clone());
    while let Some(node) = queue.pop_front() {
        for &next in adj.get(node).map(|v| v.as_slice()).unwrap_or(&[]) {
            if seen.insert(next.to_string()) {
                queue.push_back(next);
            }
        }
    }
    seen
}

pub fn find_unreachable_nodes(scenario: &Scenario) -> Vec<String> {
    let reachable = reachable_from_start(scenario);
    let mut out: Vec<String> = scenario
        .nodes()
        .filter(|n| !reachable.contains(&n.id))
        .map(|n| n.id.clone())
        .collect();
    out.sort();
    out
}

/// Cycles in the decision graph. Iterative DFS with explicit colouring,
/// sorted traversal so the output is stable.
pub fn detect_cycles(scenario: &Scenario) -> Vec<Vec<String>> {
    let adj = adjacency(scenario);

    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    let mut colour: BTreeMap<&str, u8> = adj.keys().map(|k| (*k, WHITE)).collect();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let starts: Vec<&str> = adj.keys().copied().collect();

    for start in starts {
        if colour.get(start).copied().unwrap_or(WHITE) != WHITE {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        colour.insert(start, GREY);

        while let Some(&(node, idx)) = stack.last() {
            let neighbours = adj.get(node).map(|v| v.as_slice()).unwrap_or(&[]);

            if idx < neighbours.len() {
                if let Some(top) = stack.last_mut() {
                    top.1 = idx + 1;
                }
                let nbr = neighbours[idx];
                match colour.get(nbr).copied().unwrap_or(WHITE) {
                    GREY => {
                        let mut cycle = vec![nbr.to_string()];
                        for (sn, _) in stack.iter().rev() {
                            cycle.push(sn.to_string());
                            if *sn == nbr {
                                break;
                            }
                        }
                        cycle.reverse();
                        cycles.push(cycle);
                    }
                    WHITE if adj.contains_key(nbr) => {
                        colour.insert(nbr, GREY);
                        stack.push((nbr, 0));
                    }
                    _ => {}
                }
            } else {
                colour.insert(node, BLACK);
                stack.pop();
            }
        }
    }

    cycles
}

pub fn validate_scenario(scenario: &Scenario, terminal_node_id: &str) -> GraphReport {
    // terminal id must be referenced from a node reachable from start
    let reachable = reachable_from_start(scenario);
    let terminal_reachable = scenario.nodes().any(|n| {
        reachable.contains(&n.id) && n.choices.iter().any(|c| c.next_node_id == terminal_node_id)
    });

    GraphReport {
        node_count: scenario.node_count(),
        duplicate_node_ids: find_duplicate_node_ids(scenario),
        dangling_choices: find_dangling_choices(scenario, terminal_node_id),
        unreachable_nodes: find_unreachable_nodes(scenario),
        cycles: detect_cycles(scenario),
        terminal_reachable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(edges: &[(&str, &[&str])]) -> Scenario {
        let nodes: Vec<serde_json::Value> = edges
            .iter()
            .map(|(id, next)| {
                let choices: Vec<serde_json::Value> = next
                    .iter()
                    .map(|n| serde_json::json!({"label": format!("to {n}"), "nextNodeId": n}))
                    .collect();
                serde_json::json!({"id": id, "title": id, "choices": choices})
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "version": "t",
            "phases": [{"id": "P1", "title": "p", "nodes": nodes}]
        }))
        .unwrap()
    }

    #[test]
    fn test_linear_scenario_is_playable() {
        let s = doc(&[("A", &["B"]), ("B", &["C", "END"]), ("C", &["END"])]);
        let report = validate_scenario(&s, "END");
        assert!(report.is_playable());
        assert!(report.cycles.is_empty());
        assert!(report.unreachable_nodes.is_empty());
    }

    #[test]
    fn test_dangling_and_unreachable() {
        let s = doc(&[("A", &["END", "Z"]), ("B", &["END"])]);
        let report = validate_scenario(&s, "END");
        assert_eq!(report.dangling_choices.len(), 1);
        assert_eq!(report.dangling_choices[0].next_node_id, "Z");
        assert_eq!(report.unreachable_nodes, vec!["B".to_string()]);
        assert!(!report.is_playable());
    }

    #[test]
    fn test_cycle_detected() {
        let s = doc(&[("A", &["B"]), ("B", &["A", "END"])]);
        let cycles = detect_cycles(&s);
        assert_eq!(cycles, vec![vec!["A".to_string(), "B".to_string(), "A".to_string()]]);
    }

    #[test]
    fn test_terminal_unreachable() {
        let s = doc(&[("A", &["A"])]);
        assert!(!validate_scenario(&s, "END").terminal_reachable);
    }
}
