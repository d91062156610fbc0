#[cfg(feature = "cli")]
pub mod cli;
pub mod components;
pub mod config;
pub mod crossing;
pub mod error;
pub mod graph;
pub mod layout;
pub mod layout_dump;
pub mod optimizer;
pub mod ordering;
pub mod rank;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, OptimizerConfig};
pub use crossing::{
    ChildLineScore, HorizontalLine, PairScore, PartnerLine, PartnerLineScore, Side,
};
pub use error::{Error, GraphError, OptimizerError, Rule};
pub use graph::{Graph, VertexDescriptor, VertexId, VertexKind};
pub use layout::{
    ChildLine, PartnerLink, PedigreeLayout, compute_layout, compute_layout_with_ranks,
};
pub use optimizer::{AnnealObserver, NoopObserver, VerticalPosOptimizer};

/// Builds the graph from JSON descriptors, using the configured default
/// widths, and lays it out.
pub fn layout_from_json(input: &str, config: &LayoutConfig) -> Result<PedigreeLayout, Error> {
    let descriptors: Vec<VertexDescriptor> = serde_json::from_str(input)?;
    let graph = Graph::build_with_widths(
        &descriptors,
        config.default_person_width,
        config.default_non_person_width,
    )?;
    compute_layout(&graph, config)
}
