use battle_forecast_core::engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs for [`crate::search::forecast`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchParams {
    pub max_depth: u32,
    /// Consecutive depths the best action must hold before the search stops.
    pub convergence_window: usize,
    /// Turn cap for the greedy extension of reported branches.
    pub extension_cap: u32,
    /// Branches below this probability are reported as searched.
    pub report_threshold: f64,
    pub seed: u64,
    /// Wall-clock budget, checked between depths only.
    pub time_budget_ms: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: 20,
            convergence_window: 4,
            extension_cap: 50,
            report_threshold: 0.1,
            seed: 0,
            time_budget_ms: None,
        }
    }
}

impl SearchParams {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

/// The optional `config` object of a scenario file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub engine: EngineConfig,
    pub search: SearchParams,
}

/// Command-line values that win over the scenario's `config`.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub max_depth: Option<u32>,
    pub time_budget_ms: Option<u64>,
}

impl ForecastConfig {
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(seed) = overrides.seed {
            self.search.seed = seed;
        }
        if let Some(depth) = overrides.max_depth {
            self.search.max_depth = depth;
        }
        if overrides.time_budget_ms.is_some() {
            self.search.time_budget_ms = overrides.time_budget_ms;
        }
        self
    }
}
