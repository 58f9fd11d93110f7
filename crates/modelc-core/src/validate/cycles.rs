//! Reference cycles among fixed enumerations.
//!
//! A fixed enumeration whose rows reference, directly or transitively, rows
//! of itself cannot be baked into constants. The traversal is an iterative
//! breadth-first search over association edges in declaration order, so the
//! reported path is the same on every run.

use super::ValidationContext;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::model::{ClassId, Stereotype};
use crate::resolve::Graph;
use std::collections::{HashMap, VecDeque};

/// Association edges between fixed enumerations, in property order.
fn enumeration_edges(ctx: &ValidationContext<'_>) -> Vec<Vec<ClassId>> {
    let graph = ctx.graph;
    graph
        .ids()
        .map(|id| {
            let mut targets = Vec::new();
            if graph.class(id).stereotype != Stereotype::Enumeration {
                return targets;
            }
            for property in &graph.class(id).properties {
                let Some(target) = property.linked_class().and_then(|name| ctx.table.class_id(name))
                else {
                    continue;
                };
                if graph.class(target).stereotype == Stereotype::Enumeration
                    && !targets.contains(&target)
                {
                    targets.push(target);
                }
            }
            targets
        })
        .collect()
}

/// Shortest path from `start` back to itself, if any.
fn find_cycle(edges: &[Vec<ClassId>], start: ClassId) -> Option<Vec<ClassId>> {
    let mut came_from: HashMap<ClassId, ClassId> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for &next in &edges[current.index()] {
            if next == start {
                let mut path = vec![start, current];
                let mut node = current;
                while let Some(&previous) = came_from.get(&node) {
                    path.push(previous);
                    node = previous;
                }
                // Built backwards from the closing edge.
                path.reverse();
                return Some(path);
            }
            if !came_from.contains_key(&next) {
                came_from.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

fn describe(graph: &Graph, path: &[ClassId]) -> String {
    path.iter()
        .map(|id| graph.class(*id).name.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Report every fixed enumeration that reaches itself.
pub fn check_reference_cycles(ctx: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    let edges = enumeration_edges(ctx);
    let mut found = 0;

    for id in graph.ids() {
        if graph.class(id).stereotype != Stereotype::Enumeration {
            continue;
        }
        if let Some(path) = find_cycle(&edges, id) {
            found += 1;
            let class = graph.class(id);
            diagnostics.push(graph.diagnostic(
                ctx.table,
                id,
                DiagnosticKind::ReferenceCycle,
                graph.spans[id.index()].name,
                format!(
                    "fixed enumeration '{}' ({}) references itself: {}",
                    class.name,
                    class.file,
                    describe(graph, &path)
                ),
            ));
        }
    }

    if found > 0 {
        tracing::debug!(cycles = found, "reference cycles found");
    }
}
