use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::graph::{Graph, Vertex, VertexId, VertexKind};
use crate::ordering::Ordering;

/// Packs every rank left to right in order, then centres each rank on the
/// widest one. Returns the x of every vertex centre and the total width.
pub(super) fn assign_x(
    graph: &Graph,
    ordering: &Ordering,
    config: &LayoutConfig,
) -> Result<(HashMap<VertexId, f64>, f64)> {
    let mut rows: Vec<(Vec<(VertexId, f64)>, f64)> = Vec::with_capacity(ordering.order.len());
    let mut widest = 0.0f64;
    for rank in &ordering.order {
        let mut cursor = 0.0;
        let mut row = Vec::with_capacity(rank.len());
        let mut previous: Option<&Vertex> = None;
        for &id in rank {
            let vertex = graph.vertex(id)?;
            if let Some(previous) = previous {
                cursor += separation(previous, vertex, config);
            }
            let width = f64::from(vertex.width);
            row.push((id, cursor + width / 2.0));
            cursor += width;
            previous = Some(vertex);
        }
        widest = widest.max(cursor);
        rows.push((row, cursor));
    }

    let mut positions = HashMap::new();
    for (row, row_width) in rows {
        let offset = (widest - row_width) / 2.0;
        for (id, x) in row {
            positions.insert(id, x + offset);
        }
    }
    Ok((positions, widest))
}

fn separation(left: &Vertex, right: &Vertex, config: &LayoutConfig) -> f64 {
    if left.kind != VertexKind::Person || right.kind != VertexKind::Person {
        return config.relationship_separation;
    }
    let twins = left.properties.twin_group.is_some()
        && left.properties.twin_group == right.properties.twin_group
        && left.in_edges() == right.in_edges();
    if twins {
        config.twin_separation
    } else {
        config.person_separation
    }
}

/// `y` of every rank. The gap above a childhub rank is
/// `node_to_childhub_distance`; any other gap is `childhub_to_node_distance`
/// widened by `extra_per_horizontal_line` for each lane beyond the second
/// in the rank above.
pub(super) fn rank_y(
    graph: &Graph,
    ordering: &Ordering,
    lanes: &[u32],
    config: &LayoutConfig,
) -> Vec<f64> {
    let mut rank_y = Vec::with_capacity(ordering.order.len());
    let mut y = 0.0;
    for (rank, vertices) in ordering.order.iter().enumerate() {
        if rank > 0 {
            let has_childhubs = vertices.iter().any(|id| graph.is_childhub(*id));
            y += if has_childhubs {
                config.node_to_childhub_distance
            } else {
                config.childhub_to_node_distance
            };
            let above = lanes.get(rank - 1).copied().unwrap_or(0);
            y += config.extra_per_horizontal_line * f64::from(above.max(2) - 2);
        }
        rank_y.push(y);
    }
    rank_y
}
