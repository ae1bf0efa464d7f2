pub mod config;
pub mod model;
pub mod search;

pub use crate::config::{ForecastConfig, Overrides, SearchParams};
pub use crate::search::{evaluate_state, forecast, mix_seed, Forecast, SearchStatus};

use crate::model::ScenarioFile;
use anyhow::Context;
use battle_forecast_core::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub scenario_path: PathBuf,
    pub rules_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub overrides: Overrides,
    pub score_only: bool,
}

pub fn load_scenario(path: &Path) -> anyhow::Result<ScenarioFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file at {}", path.display()))?;
    let parsed: ScenarioFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    parsed
        .validate()
        .with_context(|| format!("Invalid scenario in {}", path.display()))?;
    Ok(parsed)
}

/// Rule data from `path`, or an empty catalog when none is given.
pub fn load_rules(path: Option<&Path>) -> anyhow::Result<RuleData> {
    match path {
        Some(path) => RuleData::load(path)
            .with_context(|| format!("Failed to load rule data from {}", path.display())),
        None => {
            tracing::warn!("no rule data given, every move falls back to an empty record");
            Ok(RuleData::new())
        }
    }
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    let scenario = load_scenario(&opts.scenario_path)?;
    let rules = load_rules(opts.rules_path.as_deref())?;
    let config = scenario.config.clone().apply(&opts.overrides);
    if config.search.max_depth == 0 {
        anyhow::bail!("--max-depth must be > 0");
    }
    let engine = Engine::new(rules, Box::new(LocalDamageCalc), config.engine.clone());
    let state = scenario.to_state();

    let rendered = if opts.score_only {
        let probs = ScoringModel::new(&engine)
            .score(&state, Side::Ai)
            .selection_probabilities();
        let entries: Vec<serde_json::Value> = probs
            .iter()
            .map(|(decision, p)| serde_json::json!({ "action": decision, "probability": p }))
            .collect();
        serde_json::to_string_pretty(&entries)?
    } else {
        let result = forecast(&engine, &state, &config.search);
        tracing::info!(
            best = ?result.best_action.as_ref().map(|d| d.to_string()),
            depth = result.final_depth,
            status = ?result.status,
            "forecast finished"
        );
        serde_json::to_string_pretty(&result)?
    };

    match &opts.output_path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write forecast to {}", path.display()))?;
            println!("Wrote forecast to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
