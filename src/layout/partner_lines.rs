use std::collections::HashMap;

use super::types::PartnerLink;
use crate::config::OptimizerConfig;
use crate::crossing::{PartnerLine, PartnerLineScore, Side};
use crate::error::Error;
use crate::graph::{Graph, VertexId};
use crate::optimizer::VerticalPosOptimizer;
use crate::ordering::Ordering;

/// Builds the line from every partner to each of its relationships and
/// stacks the lines of each gap onto lanes, never below the lane their
/// nesting asks for. Returns the links (with `y` unset) and the number of
/// lanes used below every rank.
pub(super) fn place_partner_lines(
    graph: &Graph,
    ordering: &Ordering,
    positions: &HashMap<VertexId, f64>,
    config: &OptimizerConfig,
) -> Result<(Vec<PartnerLink>, Vec<u32>), Error> {
    let mut placed = Vec::new();
    let mut lanes = vec![0; ordering.order.len()];

    for (rank, vertices) in ordering.order.iter().enumerate() {
        let relationships_below: Vec<f64> = ordering
            .order
            .get(rank + 1)
            .into_iter()
            .flatten()
            .filter(|id| graph.is_relationship(**id))
            .filter_map(|id| positions.get(id).copied())
            .collect();

        let mut links = Vec::new();
        let mut lines = Vec::new();
        let mut keys = Vec::new();
        let mut min_levels = Vec::new();
        for (source, &vertex) in vertices.iter().enumerate() {
            if !graph.is_person(vertex) && !graph.is_virtual(vertex) {
                continue;
            }
            let Some(&top) = positions.get(&vertex) else {
                continue;
            };
            let mut left = Vec::new();
            let mut right = Vec::new();
            for target in graph.out_edges(vertex)? {
                if !graph.is_relationship(target) {
                    continue;
                }
                let Some(&down) = positions.get(&target) else {
                    continue;
                };
                if down < top {
                    left.push((target, down));
                } else {
                    right.push((target, down));
                }
            }

            for (side, mut targets) in [(Side::Left, left), (Side::Right, right)] {
                targets.sort_by(|a, b| (a.1 - top).abs().total_cmp(&(b.1 - top).abs()));
                let mut next_level = 0;
                for (attach, (relationship, down)) in targets.into_iter().enumerate() {
                    let line = PartnerLine::new(source, side, attach as u32, top, down);
                    let base = if line.left == line.right {
                        0
                    } else if relationships_below
                        .iter()
                        .any(|x| line.left < *x && *x < line.right)
                    {
                        2
                    } else {
                        1
                    };
                    next_level = next_level.max(base);
                    links.push(PartnerLink {
                        source: vertex,
                        relationship,
                        rank,
                        side,
                        min_level: next_level,
                        level: next_level,
                        left: line.left,
                        right: line.right,
                        y: 0.0,
                    });
                    if next_level > 0 {
                        min_levels.push(next_level);
                        keys.push(relationship.index as usize);
                        lines.push((links.len() - 1, line));
                    }
                    next_level += 1;
                }
            }
        }
        if lines.is_empty() {
            placed.extend(links);
            continue;
        }

        let (link_indices, lines): (Vec<usize>, Vec<PartnerLine>) = lines.into_iter().unzip();
        let score = PartnerLineScore::new(lines, &keys);
        let optimizer =
            VerticalPosOptimizer::new(&score, &min_levels, Some(min_levels.as_slice()))?;
        let levels = optimizer.compute_vertical_positions(config);
        log::debug!(
            "rank {rank}: {} partner lines on {} lanes, score {}",
            levels.len(),
            levels.iter().max().copied().unwrap_or(0),
            optimizer.total_score(&levels)
        );

        for (link, level) in link_indices.into_iter().zip(levels) {
            links[link].level = level;
            lanes[rank] = lanes[rank].max(level);
        }
        placed.extend(links);
    }
    Ok((placed, lanes))
}
