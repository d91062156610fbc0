mod child_lines;
mod partner_lines;
mod positions;
pub(crate) mod types;

pub use types::*;

use crate::config::LayoutConfig;
use crate::error::Error;
use crate::graph::{Graph, Ranks, max_rank};
use crate::ordering::Ordering;
use crate::rank::assign_ranks;

/// Validates `graph`, ranks it and lays it out.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> Result<PedigreeLayout, Error> {
    graph.validate()?;
    let ranks = assign_ranks(graph)?;
    compute_layout_with_ranks(graph, ranks, config)
}

/// Lays out `graph` on caller-supplied ranks, which must cover every vertex
/// and never point an edge upwards.
pub fn compute_layout_with_ranks(
    graph: &Graph,
    mut ranks: Ranks,
    config: &LayoutConfig,
) -> Result<PedigreeLayout, Error> {
    let split = graph.split_multi_rank_edges(&mut ranks)?;
    let ordering = Ordering::initial(&split, &ranks, config.order_passes)?;
    let (positions, width) = positions::assign_x(&split, &ordering, config)?;
    let (mut child_lines, mut lanes) =
        child_lines::place_child_lines(&split, &ordering, &positions, &config.optimizer)?;
    let (mut partner_links, partner_lanes) = partner_lines::place_partner_lines(
        &split,
        &ordering,
        &positions,
        &config.partner_optimizer,
    )?;
    for (lane, partner) in lanes.iter_mut().zip(partner_lanes) {
        *lane = (*lane).max(partner);
    }
    let rank_y = positions::rank_y(&split, &ordering, &lanes, config);

    let extra = config.extra_per_horizontal_line;
    for line in &mut child_lines {
        line.y = rank_y[line.rank] + extra * f64::from(line.level.max(1));
    }
    for link in &mut partner_links {
        let below = rank_y.get(link.rank + 1).copied().unwrap_or(rank_y[link.rank]);
        link.y = below - extra * f64::from(link.level.max(1));
    }
    let height = rank_y.last().copied().unwrap_or(0.0);

    log::debug!(
        "laid out {} vertices on {} ranks ({} child lines, {} partner links)",
        split.vertex_count(),
        max_rank(&ranks) + 1,
        child_lines.len(),
        partner_links.len()
    );
    Ok(PedigreeLayout {
        graph: split,
        ranks,
        ordering,
        positions,
        rank_y,
        lanes,
        child_lines,
        partner_links,
        width,
        height,
    })
}
