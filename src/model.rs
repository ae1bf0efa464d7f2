use crate::config::ForecastConfig;
use battle_forecast_core::sim::{BattleState, Field, Party};
use serde::Deserialize;

/// A position to forecast, as read from a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFile {
    pub player: Party,
    pub ai: Party,
    #[serde(default)]
    pub field: Field,
    #[serde(default)]
    pub last_moves: LastMoves,
    #[serde(default)]
    pub config: ForecastConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastMoves {
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub ai: Option<String>,
}

impl ScenarioFile {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (label, party) in [("player", &self.player), ("ai", &self.ai)] {
            if party.members.is_empty() {
                anyhow::bail!("{label} party has no members");
            }
            if party.active >= party.members.len() {
                anyhow::bail!(
                    "{label} active index {} is out of range for {} members",
                    party.active,
                    party.members.len()
                );
            }
            if let Some(mon) = party.members.iter().find(|mon| mon.stats.hp == 0) {
                anyhow::bail!("{label} member {} has no HP stat", mon.species);
            }
        }
        Ok(())
    }

    pub fn to_state(&self) -> BattleState {
        let mut state = BattleState::new(self.player.clone(), self.ai.clone());
        state.field = self.field.clone();
        state.last_moves = [self.last_moves.player.clone(), self.last_moves.ai.clone()];
        state
    }
}
