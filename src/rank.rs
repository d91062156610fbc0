use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{GraphError, Result, Rule};
use crate::graph::{Graph, Ranks, VertexId};

/// Assigns every vertex the least rank below all of its in-neighbours, then
/// pulls founders down next to their partners.
pub fn assign_ranks(graph: &Graph) -> Result<Ranks> {
    let mut ranks = scan_in_edges(graph)?;
    compress_founders(graph, &mut ranks)?;
    log::debug!(
        "assigned {} ranks to {} vertices",
        crate::graph::max_rank(&ranks) + 1,
        ranks.len()
    );
    Ok(ranks)
}

fn scan_in_edges(graph: &Graph) -> Result<Ranks> {
    let mut indeg: HashMap<VertexId, usize> = HashMap::new();
    let mut ready: BinaryHeap<Reverse<VertexId>> = BinaryHeap::new();
    for (id, vertex) in graph.vertices() {
        indeg.insert(id, vertex.in_degree());
        if vertex.in_degree() == 0 {
            ready.push(Reverse(id));
        }
    }

    let mut ranks = Ranks::new();
    while let Some(Reverse(id)) = ready.pop() {
        let rank = *ranks.entry(id).or_insert(0);
        for next in graph.vertex(id)?.out_edges() {
            let entry = ranks.entry(next).or_insert(0);
            *entry = (*entry).max(rank + 1);
            if let Some(deg) = indeg.get_mut(&next) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
    }

    if let Some((_, vertex)) = graph.vertices().find(|(id, _)| indeg.get(id) != Some(&0)) {
        return Err(GraphError::invariant(Rule::Acyclic, vertex.name.clone()));
    }
    Ok(ranks)
}

/// A parentless person whose out-edges all lead to relationships sits one
/// rank above the highest of those relationships.
fn compress_founders(graph: &Graph, ranks: &mut Ranks) -> Result<()> {
    for id in graph.parentless_vertices() {
        if !graph.is_person(id) {
            continue;
        }
        let targets = graph.out_edges(id)?;
        if targets.is_empty() || targets.iter().any(|t| !graph.is_relationship(*t)) {
            continue;
        }
        let Some(lowest) = targets.iter().filter_map(|t| ranks.get(t)).min().copied() else {
            continue;
        };
        let current = ranks.get(&id).copied().unwrap_or(0);
        if lowest > current + 1 {
            ranks.insert(id, lowest - 1);
        }
    }
    Ok(())
}
