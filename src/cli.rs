use crate::config::{LayoutConfig, load_config};
use crate::layout_dump::write_output_json;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pedlay", version, about = "Lay out a pedigree graph given as JSON descriptors")]
pub struct Args {
    /// Input file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Seed for the lane optimizers
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Annealing step budget per component, for both lane passes
    #[arg(long = "maxSteps")]
    pub max_steps: Option<usize>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    let input = read_input(args.input.as_deref())?;
    let layout = crate::layout_from_json(&input, &config).context("failed to lay out pedigree")?;
    write_output_json(&layout, args.output.as_deref())
}

fn resolve_config(args: &Args) -> Result<LayoutConfig> {
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    if let Some(seed) = args.seed {
        config.optimizer.seed = seed;
        config.partner_optimizer.seed = seed;
    }
    if let Some(max_steps) = args.max_steps {
        config.optimizer.max_steps = max_steps;
        config.partner_optimizer.max_steps = max_steps;
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
