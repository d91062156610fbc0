use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Components with at most this many edges are searched exhaustively.
    pub max_full_search_size: usize,
    pub max_steps: usize,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_full_search_size: 5,
            max_steps: 600,
            seed: 1,
        }
    }
}

impl OptimizerConfig {
    /// Settings for partner lines, which get a smaller step budget.
    pub fn partner_lines() -> Self {
        Self {
            max_steps: 500,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub person_separation: f64,
    pub twin_separation: f64,
    pub relationship_separation: f64,
    pub default_person_width: u32,
    pub default_non_person_width: u32,
    pub node_to_childhub_distance: f64,
    pub childhub_to_node_distance: f64,
    pub extra_per_horizontal_line: f64,
    pub order_passes: usize,
    /// Child-line lanes.
    pub optimizer: OptimizerConfig,
    /// Partner-line lanes.
    pub partner_optimizer: OptimizerConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            person_separation: 10.0,
            twin_separation: 8.0,
            relationship_separation: 6.0,
            default_person_width: 1,
            default_non_person_width: 1,
            node_to_childhub_distance: 18.0,
            childhub_to_node_distance: 16.0,
            extra_per_horizontal_line: 4.0,
            order_passes: 4,
            optimizer: OptimizerConfig::default(),
            partner_optimizer: OptimizerConfig::partner_lines(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OptimizerConfigFile {
    max_full_search_size: Option<usize>,
    max_steps: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    person_separation: Option<f64>,
    twin_separation: Option<f64>,
    relationship_separation: Option<f64>,
    default_person_width: Option<u32>,
    default_non_person_width: Option<u32>,
    node_to_childhub_distance: Option<f64>,
    childhub_to_node_distance: Option<f64>,
    extra_per_horizontal_line: Option<f64>,
    order_passes: Option<usize>,
    optimizer: Option<OptimizerConfigFile>,
    partner_optimizer: Option<OptimizerConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let mut config = LayoutConfig::default();
    // hand-written config files may carry comments or trailing commas
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };

    if let Some(v) = parsed.person_separation {
        config.person_separation = v;
    }
    if let Some(v) = parsed.twin_separation {
        config.twin_separation = v;
    }
    if let Some(v) = parsed.relationship_separation {
        config.relationship_separation = v;
    }
    if let Some(v) = parsed.default_person_width {
        config.default_person_width = v.max(1);
    }
    if let Some(v) = parsed.default_non_person_width {
        config.default_non_person_width = v.max(1);
    }
    if let Some(v) = parsed.node_to_childhub_distance {
        config.node_to_childhub_distance = v;
    }
    if let Some(v) = parsed.childhub_to_node_distance {
        config.childhub_to_node_distance = v;
    }
    if let Some(v) = parsed.extra_per_horizontal_line {
        config.extra_per_horizontal_line = v;
    }
    if let Some(v) = parsed.order_passes {
        config.order_passes = v;
    }
    if let Some(optimizer) = parsed.optimizer {
        optimizer.apply(&mut config.optimizer);
    }
    if let Some(optimizer) = parsed.partner_optimizer {
        optimizer.apply(&mut config.partner_optimizer);
    }

    Ok(config)
}

impl OptimizerConfigFile {
    fn apply(self, config: &mut OptimizerConfig) {
        if let Some(v) = self.max_full_search_size {
            config.max_full_search_size = v;
        }
        if let Some(v) = self.max_steps {
            config.max_steps = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}
