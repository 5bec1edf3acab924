use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::TableId;
use crate::schema::Diagram;

/// Summary of the foreign-key graph structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Emission order for a diagram's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub summary: DependencySummary,
    /// Every table exactly once, referenced tables before referencing ones.
    pub order: Vec<TableId>,
    /// Edges that closed a cycle (including self references). Their ordering
    /// could not be honoured.
    pub back_edges: Vec<(TableId, TableId)>,
}

impl DependencyReport {
    pub fn is_acyclic(&self) -> bool {
        self.back_edges.is_empty()
    }
}

/// Order tables so that every table comes after the tables it references.
///
/// Depth-first post-order over the tables in diagram order. Nodes are marked
/// before their neighbours are visited, so cycles and self references degrade
/// to a deterministic order instead of failing.
pub fn build_dependency_report(diagram: &Diagram) -> DependencyReport {
    let graph = build_adjacency(diagram);
    let edges = graph.values().map(Vec::len).sum();
    let summary = DependencySummary {
        nodes: diagram.tables.len(),
        edges,
    };

    let mut visited = BTreeSet::new();
    let mut finished = BTreeSet::new();
    let mut order = Vec::with_capacity(diagram.tables.len());
    let mut back_edges = Vec::new();

    for root in diagram.tables.iter().map(|table| table.id) {
        if !visited.insert(root) {
            continue;
        }
        // (node, index of the next neighbour to visit)
        let mut stack = vec![(root, 0usize)];
        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let neighbours = graph.get(&node).map(Vec::as_slice).unwrap_or_default();
            if let Some(&target) = neighbours.get(*next) {
                *next += 1;
                if visited.insert(target) {
                    stack.push((target, 0));
                } else if !finished.contains(&target) {
                    back_edges.push((node, target));
                }
            } else {
                stack.pop();
                finished.insert(node);
                order.push(node);
            }
        }
    }

    if !back_edges.is_empty() {
        tracing::debug!(
            event = "dependency_cycle",
            back_edges = back_edges.len()
        );
    }

    DependencyReport {
        summary,
        order,
        back_edges,
    }
}

/// Convenience wrapper returning only the emission order.
pub fn dependency_order(diagram: &Diagram) -> Vec<TableId> {
    build_dependency_report(diagram).order
}

/// Edges from each referencing table to the tables it references, in
/// relationship order with duplicates removed. Relationships pointing at
/// unknown tables are ignored.
fn build_adjacency(diagram: &Diagram) -> BTreeMap<TableId, Vec<TableId>> {
    let mut graph: BTreeMap<TableId, Vec<TableId>> = diagram
        .tables
        .iter()
        .map(|table| (table.id, Vec::new()))
        .collect();

    for relationship in &diagram.relationships {
        if !graph.contains_key(&relationship.end.table) {
            continue;
        }
        if let Some(targets) = graph.get_mut(&relationship.start.table) {
            if !targets.contains(&relationship.end.table) {
                targets.push(relationship.end.table);
            }
        }
    }

    graph
}
