use std::collections::HashMap;

use super::types::ChildLine;
use crate::config::OptimizerConfig;
use crate::crossing::{ChildLineScore, HorizontalLine};
use crate::error::Error;
use crate::graph::{Graph, VertexId};
use crate::optimizer::VerticalPosOptimizer;
use crate::ordering::Ordering;

/// Builds the child line of every childhub and stacks the lines of each
/// childhub rank onto lanes. Returns the lines (with `y` unset) and the
/// number of lanes used below every rank.
pub(super) fn place_child_lines(
    graph: &Graph,
    ordering: &Ordering,
    positions: &HashMap<VertexId, f64>,
    config: &OptimizerConfig,
) -> Result<(Vec<ChildLine>, Vec<u32>), Error> {
    let mut placed = Vec::new();
    let mut lanes = vec![0; ordering.order.len()];

    for (rank, vertices) in ordering.order.iter().enumerate() {
        let mut hubs = Vec::new();
        let mut lines = Vec::new();
        for &hub in vertices {
            if !graph.is_childhub(hub) {
                continue;
            }
            let Some(line) = horizontal_line(graph, ordering, positions, hub)? else {
                continue;
            };
            if line.left == line.right {
                placed.push(child_line(hub, rank, 0, &line));
                continue;
            }
            hubs.push(hub);
            lines.push(line);
        }
        if lines.is_empty() {
            continue;
        }

        let score = ChildLineScore::new(lines);
        let init_levels = vec![1; hubs.len()];
        let optimizer = VerticalPosOptimizer::new(&score, &init_levels, None)?;
        let levels = optimizer.compute_vertical_positions(config);
        log::debug!(
            "rank {rank}: {} child lines on {} lanes, score {}",
            hubs.len(),
            levels.iter().max().copied().unwrap_or(0),
            optimizer.total_score(&levels)
        );

        for ((hub, line), level) in hubs.into_iter().zip(&score.lines).zip(levels) {
            lanes[rank] = lanes[rank].max(level);
            placed.push(child_line(hub, rank, level, line));
        }
    }
    Ok((placed, lanes))
}

fn horizontal_line(
    graph: &Graph,
    ordering: &Ordering,
    positions: &HashMap<VertexId, f64>,
    hub: VertexId,
) -> Result<Option<HorizontalLine>, Error> {
    let rise = positions.get(&hub).copied();
    let children = graph.out_edges(hub)?;
    let drops: Vec<f64> = children
        .iter()
        .filter_map(|child| positions.get(child).copied())
        .collect();
    if drops.is_empty() {
        return Ok(None);
    }

    let line = HorizontalLine::new(rise, drops);
    if let ([child], Some(rise)) = (children.as_slice(), rise) {
        let drop = line.drops[0];
        let rank_len = ordering.order.iter().find(|rank| rank.contains(child)).map_or(0, Vec::len);
        let at_left_end = ordering.position(*child) == Some(0) && rise > drop;
        let at_right_end = ordering.position(*child) == Some(rank_len.saturating_sub(1)) && rise < drop;
        if at_left_end || at_right_end {
            return Ok(Some(line.topmost()));
        }
    }
    Ok(Some(line))
}

fn child_line(childhub: VertexId, rank: usize, level: u32, line: &HorizontalLine) -> ChildLine {
    ChildLine {
        childhub,
        rank,
        level,
        left: line.left,
        right: line.right,
        y: 0.0,
    }
}
