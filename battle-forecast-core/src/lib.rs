//! Deterministic-given-seed battle engine and the heuristic move scorer
//! built on top of it.
//!
//! The main entry point is [`engine::Engine::apply_turn`], a pure transform
//! from a [`sim::BattleState`] plus one decision per side to the next state
//! and its log. [`ai::ScoringModel`] ranks an AI side's options.

pub mod ai;
pub mod battle_log;
pub mod data;
pub mod engine;
pub mod sim;

/// Commonly used exports for external consumers.
pub mod prelude {
    pub use crate::ai::{ScoreResult, ScoringModel};
    pub use crate::battle_log::BattleLog;
    pub use crate::data::RuleData;
    pub use crate::engine::{Engine, EngineConfig, TurnOutcome};
    pub use crate::sim::damage::{DamageCalculator, LocalDamageCalc};
    pub use crate::sim::{BattleState, Combatant, Decision, Party, Side};
}
