use pedigree_layout::layout_dump::LayoutDump;
use pedigree_layout::{LayoutConfig, layout_from_json};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PedigreeLayoutOptions {
    seed: Option<u64>,
    max_steps: Option<usize>,
    person_separation: Option<f64>,
    twin_separation: Option<f64>,
    debug_log: Option<bool>,
}

fn build_layout_config(options: &PedigreeLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(seed) = options.seed {
        config.optimizer.seed = seed;
        config.partner_optimizer.seed = seed;
    }
    if let Some(max_steps) = options.max_steps {
        config.optimizer.max_steps = max_steps;
        config.partner_optimizer.max_steps = max_steps;
    }
    if let Some(separation) = options.person_separation {
        config.person_separation = separation;
    }
    if let Some(separation) = options.twin_separation {
        config.twin_separation = separation;
    }
    config
}

fn layout_json(descriptors: &str, options: &PedigreeLayoutOptions) -> Result<String, String> {
    let config = build_layout_config(options);
    let layout = layout_from_json(descriptors, &config).map_err(|error| error.to_string())?;
    serde_json::to_string(&LayoutDump::from_layout(&layout)).map_err(|error| error.to_string())
}

/// Lays out a pedigree given as a JSON array of vertex descriptors and
/// returns the layout dump as JSON.
#[wasm_bindgen]
pub fn layout_pedigree_json(descriptors: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<PedigreeLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        PedigreeLayoutOptions::default()
    };
    if options.debug_log == Some(true) {
        let _ = console_log::init_with_level(log::Level::Debug);
    }
    layout_json(descriptors, &options).map_err(|error| JsValue::from_str(&error))
}
