use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::graph::{Graph, Ranks, VertexId, max_rank};

/// Left-to-right order of the vertices on every rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub order: Vec<Vec<VertexId>>,
    positions: HashMap<VertexId, usize>,
}

impl Ordering {
    pub fn from_ranks(order: Vec<Vec<VertexId>>) -> Self {
        let mut ordering = Self {
            order,
            positions: HashMap::new(),
        };
        ordering.update_positions();
        ordering
    }

    /// Buckets vertices by rank in slot order, then runs `passes` rounds of
    /// median sweeps and keeps whichever ordering crosses the fewest edges.
    pub fn initial(graph: &Graph, ranks: &Ranks, passes: usize) -> Result<Self> {
        let mut buckets = vec![Vec::new(); max_rank(ranks) + 1];
        for id in graph.vertex_ids() {
            let rank = ranks.get(&id).copied().ok_or_else(|| {
                GraphError::MalformedInput(format!("no rank for vertex {id}"))
            })?;
            buckets[rank].push(id);
        }
        let mut ordering = Ordering::from_ranks(buckets);
        let edges = RankEdges::new(graph, ranks);

        let mut best = ordering.clone();
        let mut best_crossings = ordering.count_crossings(graph, ranks);
        for _ in 0..passes {
            if best_crossings == 0 {
                break;
            }
            ordering.sweep(&edges);
            let crossings = ordering.count_crossings(graph, ranks);
            if crossings < best_crossings {
                best = ordering.clone();
                best_crossings = crossings;
            }
        }
        log::debug!("initial ordering has {best_crossings} crossings");
        Ok(best)
    }

    pub fn rank_len(&self, rank: usize) -> usize {
        self.order.get(rank).map_or(0, Vec::len)
    }

    pub fn position(&self, id: VertexId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn insert(&mut self, rank: usize, index: usize, id: VertexId) {
        if self.order.len() <= rank {
            self.order.resize(rank + 1, Vec::new());
        }
        let bucket = &mut self.order[rank];
        bucket.insert(index.min(bucket.len()), id);
        self.update_rank_positions(rank);
    }

    /// Swaps two vertices of `rank`; out-of-range positions leave the rank
    /// as it was.
    pub fn exchange(&mut self, rank: usize, a: usize, b: usize) {
        let Some(bucket) = self.order.get_mut(rank) else {
            return;
        };
        if a >= bucket.len() || b >= bucket.len() {
            return;
        }
        bucket.swap(a, b);
        self.update_rank_positions(rank);
    }

    pub fn move_vertex(&mut self, rank: usize, from: usize, to: usize) {
        let Some(bucket) = self.order.get_mut(rank) else {
            return;
        };
        if from >= bucket.len() {
            return;
        }
        let id = bucket.remove(from);
        let to = to.min(bucket.len());
        bucket.insert(to, id);
        self.update_rank_positions(rank);
    }

    /// Number of pairs of edges between adjacent ranks that cross.
    pub fn count_crossings(&self, graph: &Graph, ranks: &Ranks) -> usize {
        let mut per_rank: Vec<Vec<(usize, usize)>> = vec![Vec::new(); self.order.len()];
        for (from, to, _) in graph.edges() {
            let (Some(&rank), Some(&to_rank)) = (ranks.get(&from), ranks.get(&to)) else {
                continue;
            };
            if to_rank != rank + 1 {
                continue;
            }
            if let (Some(a), Some(b)) = (self.position(from), self.position(to)) {
                per_rank[rank].push((a, b));
            }
        }
        per_rank
            .iter()
            .map(|segments| {
                let mut crossings = 0;
                for (i, (a1, b1)) in segments.iter().enumerate() {
                    for (a2, b2) in &segments[i + 1..] {
                        if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                            crossings += 1;
                        }
                    }
                }
                crossings
            })
            .sum()
    }

    fn sweep(&mut self, edges: &RankEdges) {
        for rank in 1..self.order.len() {
            self.sort_rank(rank, &edges.incoming);
        }
        for rank in (0..self.order.len().saturating_sub(1)).rev() {
            self.sort_rank(rank, &edges.outgoing);
        }
    }

    fn sort_rank(&mut self, rank: usize, neighbors: &HashMap<VertexId, Vec<VertexId>>) {
        if self.order[rank].len() <= 1 {
            return;
        }
        let mut keyed: Vec<(f32, usize, VertexId)> = self.order[rank]
            .iter()
            .enumerate()
            .map(|(idx, id)| (median_position(*id, idx, neighbors, &self.positions), idx, *id))
            .collect();
        keyed.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        self.order[rank] = keyed.into_iter().map(|(_, _, id)| id).collect();
        self.update_rank_positions(rank);
    }

    fn update_positions(&mut self) {
        self.positions.clear();
        for rank in 0..self.order.len() {
            self.update_rank_positions(rank);
        }
    }

    fn update_rank_positions(&mut self, rank: usize) {
        for (idx, id) in self.order[rank].iter().enumerate() {
            self.positions.insert(*id, idx);
        }
    }
}

/// Adjacency restricted to edges joining consecutive ranks.
struct RankEdges {
    incoming: HashMap<VertexId, Vec<VertexId>>,
    outgoing: HashMap<VertexId, Vec<VertexId>>,
}

impl RankEdges {
    fn new(graph: &Graph, ranks: &Ranks) -> Self {
        let mut incoming: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
        let mut outgoing: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
        for (from, to, _) in graph.edges() {
            let adjacent = matches!(
                (ranks.get(&from), ranks.get(&to)),
                (Some(a), Some(b)) if *b == *a + 1
            );
            if adjacent {
                outgoing.entry(from).or_default().push(to);
                incoming.entry(to).or_default().push(from);
            }
        }
        Self { incoming, outgoing }
    }
}

fn median_position(
    id: VertexId,
    current: usize,
    neighbors: &HashMap<VertexId, Vec<VertexId>>,
    positions: &HashMap<VertexId, usize>,
) -> f32 {
    let Some(list) = neighbors.get(&id) else {
        return current as f32;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|neighbor| positions.get(neighbor))
        .map(|pos| *pos as f32)
        .collect();
    if values.is_empty() {
        return current as f32;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::assign_ranks;

    /// Two couples whose children are declared in the opposite order, so the
    /// slot-order bucketing starts with a crossing.
    fn crossed_families() -> (Graph, Ranks) {
        let graph = Graph::from_json(
            r#"[
                {"name": "a", "outEdges": [{"to": "ab"}]},
                {"name": "b", "outEdges": [{"to": "ab"}]},
                {"name": "c", "outEdges": [{"to": "cd"}]},
                {"name": "d", "outEdges": [{"to": "cd"}]},
                {"name": "cd", "kind": "relationship", "outEdges": [{"to": "y"}]},
                {"name": "ab", "kind": "relationship", "outEdges": [{"to": "x"}]},
                {"name": "x", "outEdges": [{"to": "xy"}]},
                {"name": "y", "outEdges": [{"to": "xy"}]},
                {"name": "xy", "kind": "relationship", "outEdges": [{"to": "z"}]},
                {"name": "z"}
            ]"#,
        )
        .unwrap();
        let ranks = assign_ranks(&graph).unwrap();
        (graph, ranks)
    }

    #[test]
    fn median_sweeps_remove_crossings() {
        let (graph, ranks) = crossed_families();
        let unordered = Ordering::initial(&graph, &ranks, 0).unwrap();
        assert!(unordered.count_crossings(&graph, &ranks) > 0);

        let ordered = Ordering::initial(&graph, &ranks, 4).unwrap();
        assert_eq!(ordered.count_crossings(&graph, &ranks), 0);
        for (rank, bucket) in ordered.order.iter().enumerate() {
            assert_eq!(ordered.rank_len(rank), bucket.len());
            for (idx, id) in bucket.iter().enumerate() {
                assert_eq!(ordered.position(*id), Some(idx));
                assert_eq!(ranks[id], rank);
            }
        }
    }

    #[test]
    fn edits_keep_positions_in_sync() {
        let (graph, ranks) = crossed_families();
        let mut ordering = Ordering::initial(&graph, &ranks, 0).unwrap();
        let first = ordering.order[0][0];
        let last = *ordering.order[0].last().unwrap();
        ordering.exchange(0, 0, ordering.rank_len(0) - 1);
        assert_eq!(ordering.position(first), Some(ordering.rank_len(0) - 1));
        assert_eq!(ordering.position(last), Some(0));

        ordering.move_vertex(0, 0, 2);
        assert_eq!(ordering.position(last), Some(2));

        let extra = graph.vertex_by_name("z").unwrap();
        ordering.insert(0, 0, extra);
        assert_eq!(ordering.position(extra), Some(0));
        assert_eq!(ordering.position(last), Some(3));
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let (graph, ranks) = crossed_families();
        let mut ordering = Ordering::initial(&graph, &ranks, 0).unwrap();
        let before = ordering.order.clone();
        let len = ordering.rank_len(0);

        ordering.exchange(0, 0, len);
        ordering.exchange(ordering.order.len(), 0, 1);
        ordering.move_vertex(0, len, 0);
        ordering.move_vertex(ordering.order.len(), 0, 1);
        assert_eq!(ordering.order, before);

        let first = ordering.order[0][0];
        ordering.move_vertex(0, 0, len + 5);
        assert_eq!(ordering.position(first), Some(len - 1));

        let extra = graph.vertex_by_name("z").unwrap();
        let rank = ordering.order.len() + 1;
        ordering.insert(rank, 10, extra);
        assert_eq!(ordering.order[rank], vec![extra]);
        assert_eq!(ordering.rank_len(rank - 1), 0);
        assert_eq!(ordering.position(extra), Some(0));
    }
}
