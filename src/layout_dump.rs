use crate::crossing::Side;
use crate::graph::VertexKind;
use crate::layout::PedigreeLayout;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f64,
    pub height: f64,
    pub crossings: usize,
    pub rank_y: Vec<f64>,
    pub lanes: Vec<u32>,
    pub vertices: Vec<VertexDump>,
    pub edges: Vec<EdgeDump>,
    pub child_lines: Vec<ChildLineDump>,
    pub partner_links: Vec<PartnerLinkDump>,
}

#[derive(Debug, Serialize)]
pub struct VertexDump {
    pub name: String,
    pub kind: VertexKind,
    pub rank: usize,
    pub order: usize,
    pub x: f64,
    pub y: f64,
    pub width: u32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub weight: u32,
}

#[derive(Debug, Serialize)]
pub struct ChildLineDump {
    pub childhub: String,
    pub rank: usize,
    pub level: u32,
    pub left: f64,
    pub right: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct PartnerLinkDump {
    pub source: String,
    pub relationship: String,
    pub rank: usize,
    pub side: Side,
    pub level: u32,
    pub left: f64,
    pub right: f64,
    pub y: f64,
}

impl LayoutDump {
    pub fn from_layout(layout: &PedigreeLayout) -> Self {
        let graph = &layout.graph;
        let name_of = |id| graph.name(id).map(str::to_string).unwrap_or_default();

        let mut vertices = Vec::new();
        for (rank, row) in layout.ordering.order.iter().enumerate() {
            for (order, id) in row.iter().enumerate() {
                let Ok(vertex) = graph.vertex(*id) else {
                    continue;
                };
                let (x, y) = layout.position(*id).unwrap_or_default();
                vertices.push(VertexDump {
                    name: vertex.name.clone(),
                    kind: vertex.kind,
                    rank,
                    order,
                    x,
                    y,
                    width: vertex.width,
                });
            }
        }

        let edges = graph
            .edges()
            .into_iter()
            .map(|(from, to, weight)| EdgeDump {
                from: name_of(from),
                to: name_of(to),
                weight,
            })
            .collect();

        let child_lines = layout
            .child_lines
            .iter()
            .map(|line| ChildLineDump {
                childhub: name_of(line.childhub),
                rank: line.rank,
                level: line.level,
                left: line.left,
                right: line.right,
                y: line.y,
            })
            .collect();

        let partner_links = layout
            .partner_links
            .iter()
            .map(|link| PartnerLinkDump {
                source: name_of(link.source),
                relationship: name_of(link.relationship),
                rank: link.rank,
                side: link.side,
                level: link.level,
                left: link.left,
                right: link.right,
                y: link.y,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            crossings: layout.crossings(),
            rank_y: layout.rank_y.clone(),
            lanes: layout.lanes.clone(),
            vertices,
            edges,
            child_lines,
            partner_links,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &PedigreeLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

/// Writes the dump to stdout, or to `path` when one is given.
pub fn write_output_json(layout: &PedigreeLayout, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        return write_layout_dump(path, layout);
    }
    let dump = LayoutDump::from_layout(layout);
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writeln!(writer)?;
    Ok(())
}
