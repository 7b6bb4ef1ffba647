//! creative-orchestrator command-line binary.
//!
//! Runs one trip against a real backend and prints the refined variants.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY` / `XAI_API_KEY` / `ANTHROPIC_API_KEY`: provider credentials
//! - `CREATIVE_ORCHESTRATOR_CONFIG`: optional YAML configuration file
//! - `RUST_LOG`: log filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trip -- openai deep "Design a logo concept"
//! cargo run --bin trip -- anthropic surreal "Name a tea shop" --model claude-sonnet-4-20250514 --variants 8
//! cargo run --bin trip -- xai light "Summarise the report" --factual --anchor brevity
//! ```

use anyhow::{bail, Context};

use creative_orchestrator::llms::providers::{create_transport, ProviderKind};
use creative_orchestrator::persona::{EffectOverrides, IntensityLevel};
use creative_orchestrator::pipeline::RunOptions;
use creative_orchestrator::task::{CreativeTask, TaskType};
use creative_orchestrator::trip::CreativeTrip;
use creative_orchestrator::utilities::config::OrchestratorConfig;

const USAGE: &str = "usage: trip <provider> <intensity> <prompt> [--model NAME] [--variants N] [--anchor TEXT]... [--factual]";

struct Args {
    provider: ProviderKind,
    intensity: IntensityLevel,
    prompt: String,
    model: Option<String>,
    variants: Option<usize>,
    anchors: Vec<String>,
    factual: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut model = None;
    let mut variants = None;
    let mut anchors = Vec::new();
    let mut factual = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => model = Some(args.next().context("--model needs a value")?),
            "--variants" => {
                let value = args.next().context("--variants needs a value")?;
                variants = Some(value.parse().with_context(|| format!("invalid variant count '{}'", value))?);
            }
            "--anchor" => anchors.push(args.next().context("--anchor needs a value")?),
            "--factual" => factual = true,
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() != 3 {
        bail!(USAGE);
    }
    let prompt = positional.pop().unwrap_or_default();
    let intensity = positional.pop().unwrap_or_default();
    let provider = positional.pop().unwrap_or_default();

    Ok(Args {
        provider: provider.parse().map_err(anyhow::Error::msg)?,
        intensity: intensity.parse()?,
        prompt,
        model,
        variants,
        anchors,
        factual,
    })
}

fn load_config() -> anyhow::Result<OrchestratorConfig> {
    match std::env::var("CREATIVE_ORCHESTRATOR_CONFIG") {
        Ok(path) => {
            log::info!("Loading configuration from {}", path);
            OrchestratorConfig::from_file(&path).with_context(|| format!("failed to load configuration from {}", path))
        }
        Err(_) => Ok(OrchestratorConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = load_config()?;

    let transport = create_transport(args.provider, args.model, None);
    log::info!("Using {} / {}", transport.provider(), transport.model());

    let mut trip = CreativeTrip::from_config(transport, &config)?;

    let task_type = if args.factual { TaskType::Factual } else { TaskType::Creative };
    let task = CreativeTask::from_prompt(args.prompt)
        .with_anchors(args.anchors)
        .with_task_type(task_type);
    let options = RunOptions {
        variant_count: args.variants,
    };

    let result = trip
        .with_trip(args.intensity, &EffectOverrides::default(), task, options)
        .await?;

    for (i, text) in result.texts().iter().enumerate() {
        println!("--- Variant {} ---\n{}\n", i + 1, text);
    }

    let metrics = trip.agent().metrics();
    log::info!(
        "{} explore + {} converge calls, {} tokens",
        result.explore_calls,
        result.converge_calls,
        metrics.total_tokens_consumed
    );
    Ok(())
}
