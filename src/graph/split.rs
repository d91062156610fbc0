use std::collections::HashMap;

use super::{Graph, VertexId, VertexKind, VertexSpec};
use crate::error::{GraphError, Result};

/// Rank (row) of every vertex.
pub type Ranks = HashMap<VertexId, usize>;

pub fn max_rank(ranks: &Ranks) -> usize {
    ranks.values().copied().max().unwrap_or(0)
}

impl Graph {
    /// Returns a copy in which every edge spanning more than one rank is
    /// replaced by a chain of virtual vertices, one per intermediate rank.
    /// Ranks of the new vertices are written into `ranks`.
    pub fn split_multi_rank_edges(&self, ranks: &mut Ranks) -> Result<Graph> {
        let mut split = self.clone();
        for (source, target, weight) in self.edges() {
            let source_rank = rank_of(ranks, source)?;
            let target_rank = rank_of(ranks, target)?;
            if target_rank < source_rank {
                return Err(GraphError::MalformedInput(format!(
                    "edge {} -> {} points to a lower rank",
                    self.name(source)?,
                    self.name(target)?
                )));
            }
            if target_rank <= source_rank + 1 {
                continue;
            }

            split.remove_edge(source, target)?;
            let source_name = self.name(source)?;
            let target_name = self.name(target)?;
            let mut previous = source;
            for mid_rank in source_rank + 1..target_rank {
                let name = format!(
                    "{source_name}->{target_name}_{}",
                    mid_rank - source_rank - 1
                );
                let next = split.add_vertex(VertexSpec::new(name, VertexKind::Virtual))?;
                ranks.insert(next, mid_rank);
                split.add_edge(previous, next, weight)?;
                previous = next;
            }
            split.add_edge(previous, target, weight)?;
        }
        log::debug!(
            "split multi-rank edges: {} virtual vertices added",
            split.vertex_count() - self.vertex_count()
        );
        Ok(split)
    }

    /// Inverse of [`Graph::split_multi_rank_edges`]: every chain through
    /// virtual vertices becomes one direct edge and virtual vertices go away.
    pub fn collapse_multi_rank_edges(&self) -> Result<Graph> {
        let mut collapsed = self.clone();
        for (source, target, weight) in self.edges() {
            if self.is_virtual(source) || !self.is_virtual(target) {
                continue;
            }
            let end = self.down_to_real(target)?;
            collapsed.remove_edge(source, target)?;
            collapsed.add_edge(source, end, weight)?;
        }
        for id in self.vertex_ids() {
            if self.is_virtual(id) {
                collapsed.remove_vertex(id)?;
            }
        }
        collapsed.validate()?;
        Ok(collapsed)
    }
}

fn rank_of(ranks: &Ranks, id: VertexId) -> Result<usize> {
    ranks
        .get(&id)
        .copied()
        .ok_or_else(|| GraphError::MalformedInput(format!("no rank for vertex {id}")))
}
