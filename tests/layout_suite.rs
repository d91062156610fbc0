use std::path::Path;

use pedigree_layout::layout_dump::LayoutDump;
use pedigree_layout::{LayoutConfig, PedigreeLayout, VertexKind, layout_from_json};

fn layout_fixture(path: &Path, config: &LayoutConfig) -> PedigreeLayout {
    let input = std::fs::read_to_string(path).expect("fixture read failed");
    layout_from_json(&input, config).expect("layout failed")
}

fn assert_sane_layout(layout: &PedigreeLayout, fixture: &str) {
    let graph = &layout.graph;
    graph.validate().expect("split graph must validate");

    for id in graph.vertex_ids() {
        assert!(layout.position(id).is_some(), "{fixture}: {id} has no position");
    }
    for (from, to, _) in graph.edges() {
        assert_eq!(
            layout.ranks[&to],
            layout.ranks[&from] + 1,
            "{fixture}: edge spans more than one rank"
        );
    }
    assert!(
        layout.rank_y.windows(2).all(|pair| pair[0] < pair[1]),
        "{fixture}: ranks must move down"
    );

    for row in &layout.ordering.order {
        for pair in row.windows(2) {
            let left = graph.vertex(pair[0]).unwrap();
            let right = graph.vertex(pair[1]).unwrap();
            let gap = layout.positions[&pair[1]] - layout.positions[&pair[0]];
            let needed = f64::from(left.width + right.width) / 2.0;
            assert!(gap > needed, "{fixture}: {} overlaps {}", left.name, right.name);
        }
    }

    let into_relationships = graph
        .edges()
        .into_iter()
        .filter(|(_, to, _)| graph.is_relationship(*to))
        .count();
    assert_eq!(
        layout.partner_links.len(),
        into_relationships,
        "{fixture}: one partner link per edge into a relationship"
    );
    for (i, a) in layout.partner_links.iter().enumerate() {
        assert!(a.level >= a.min_level, "{fixture}: partner link below its nesting");
        let (top_y, bottom_y) = (layout.rank_y[a.rank], layout.rank_y[a.rank + 1]);
        assert!(a.y > top_y && a.y < bottom_y, "{fixture}: partner link outside its gap");
        for b in &layout.partner_links[i + 1..] {
            let overlap = a.left < b.right && b.left < a.right;
            if a.rank == b.rank && a.level > 0 && b.level > 0 && overlap {
                assert_ne!(a.level, b.level, "{fixture}: overlapping partner links share a lane");
            }
        }
    }

    let hubs = graph
        .vertex_ids()
        .into_iter()
        .filter(|id| graph.kind(*id).ok() == Some(VertexKind::ChildHub))
        .count();
    assert_eq!(layout.child_lines.len(), hubs, "{fixture}: one child line per childhub");
    for (i, a) in layout.child_lines.iter().enumerate() {
        let (hub_y, next_y) = (layout.rank_y[a.rank], layout.rank_y[a.rank + 1]);
        assert!(a.y > hub_y && a.y < next_y, "{fixture}: child line outside its gap");
        for b in &layout.child_lines[i + 1..] {
            let overlap = a.left <= b.right && b.left <= a.right;
            if a.rank == b.rank && a.level > 0 && b.level > 0 && overlap {
                assert_ne!(a.level, b.level, "{fixture}: overlapping child lines share a lane");
            }
        }
    }
}

#[test]
fn layout_all_fixtures() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    let config = LayoutConfig::default();

    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "nuclear.json",
        "three_generations.json",
        "remarriage.json",
        "cousins.json",
        "across_generations.json",
        "partner_over_siblings.json",
    ];

    for rel in candidates {
        let path = root.join(rel);
        assert!(path.exists(), "fixture missing: {}", rel);
        let layout = layout_fixture(&path, &config);
        assert_sane_layout(&layout, rel);
    }
}

#[test]
fn layouts_are_reproducible() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cousins.json");
    let config = LayoutConfig::default();
    let first = serde_json::to_string(&LayoutDump::from_layout(&layout_fixture(&path, &config)))
        .unwrap();
    let second = serde_json::to_string(&LayoutDump::from_layout(&layout_fixture(&path, &config)))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn long_partnerships_are_split_and_collapse_back() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/across_generations.json");
    let input = std::fs::read_to_string(&path).unwrap();
    let input_graph = pedigree_layout::Graph::from_json(&input).unwrap();
    let layout = layout_from_json(&input, &LayoutConfig::default()).unwrap();

    let virtuals = layout
        .graph
        .vertex_ids()
        .into_iter()
        .filter(|id| layout.graph.is_virtual(*id))
        .count();
    assert!(virtuals > 0);
    let collapsed = layout.graph.collapse_multi_rank_edges().unwrap();
    assert!(collapsed.same_structure(&input_graph));
}

#[test]
fn partner_link_over_siblings_gets_a_lane() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/partner_over_siblings.json");
    let layout = layout_fixture(&path, &LayoutConfig::default());
    let union = layout.graph.vertex_by_name("union").unwrap();
    let links: Vec<_> = layout
        .partner_links
        .iter()
        .filter(|link| link.relationship == union)
        .collect();
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|link| link.level >= 1));
    assert_eq!(links[0].rank, links[1].rank);

    let dump = LayoutDump::from_layout(&layout);
    assert_eq!(dump.partner_links.len(), layout.partner_links.len());
    assert!(dump.partner_links.iter().any(|link| link.relationship == "union"));
}

#[test]
fn configured_widths_and_separations_apply() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/nuclear.json");
    let narrow = layout_fixture(&path, &LayoutConfig::default());
    let wide_config = LayoutConfig {
        person_separation: 30.0,
        default_person_width: 4,
        ..LayoutConfig::default()
    };
    let wide = layout_fixture(&path, &wide_config);
    assert!(wide.width > narrow.width);

    let x = |layout: &PedigreeLayout, name: &str| layout.position_by_name(name).unwrap().0;
    let gap = (x(&wide, "son") - x(&wide, "daughter")).abs();
    assert!(gap >= 34.0);
}
