use std::collections::HashMap;

use crate::crossing::Side;
use crate::graph::{Graph, Ranks, VertexId};
use crate::ordering::Ordering;

/// Horizontal line joining a childhub to its children, on one lane of the
/// gap below the childhub rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildLine {
    pub childhub: VertexId,
    pub rank: usize,
    /// 0 for a line that is a single point, otherwise 1 is the lane nearest
    /// the childhubs.
    pub level: u32,
    pub left: f64,
    pub right: f64,
    pub y: f64,
}

/// Line from a partner (or a virtual vertex on its way) down to a
/// relationship on the next rank, on one lane of the gap between them.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerLink {
    pub source: VertexId,
    pub relationship: VertexId,
    /// Rank of `source`.
    pub rank: usize,
    pub side: Side,
    /// Lowest lane the line may take: farther partnerships of one source
    /// nest above nearer ones.
    pub min_level: u32,
    /// 0 for a vertical link, otherwise 1 is the lane nearest the
    /// relationships.
    pub level: u32,
    pub left: f64,
    pub right: f64,
    pub y: f64,
}

/// Result of a full layout pass. `graph` is the rank-split graph, so every
/// edge joins adjacent ranks and virtual vertices carry positions too.
#[derive(Debug, Clone)]
pub struct PedigreeLayout {
    pub graph: Graph,
    pub ranks: Ranks,
    pub ordering: Ordering,
    pub positions: HashMap<VertexId, f64>,
    pub rank_y: Vec<f64>,
    /// Lanes used below each rank by child or partner lines.
    pub lanes: Vec<u32>,
    pub child_lines: Vec<ChildLine>,
    pub partner_links: Vec<PartnerLink>,
    pub width: f64,
    pub height: f64,
}

impl PedigreeLayout {
    pub fn position(&self, id: VertexId) -> Option<(f64, f64)> {
        let x = *self.positions.get(&id)?;
        let y = *self.rank_y.get(*self.ranks.get(&id)?)?;
        Some((x, y))
    }

    pub fn position_by_name(&self, name: &str) -> Option<(f64, f64)> {
        self.position(self.graph.vertex_by_name(name)?)
    }

    pub fn child_line(&self, childhub: VertexId) -> Option<&ChildLine> {
        self.child_lines.iter().find(|line| line.childhub == childhub)
    }

    pub fn partner_link(&self, source: VertexId, relationship: VertexId) -> Option<&PartnerLink> {
        self.partner_links
            .iter()
            .find(|link| link.source == source && link.relationship == relationship)
    }

    pub fn crossings(&self) -> usize {
        self.ordering.count_crossings(&self.graph, &self.ranks)
    }
}
