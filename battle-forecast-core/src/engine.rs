//! Turn resolution entry point: legal actions and the pure
//! `(state, decisions) -> (state, log)` transform.

use crate::battle_log::BattleLog;
use crate::data::RuleData;
use crate::sim::battle::{BattleState, Side};
use crate::sim::combatant::Volatile;
use crate::sim::damage::{DamageCalculator, LocalDamageCalc};
use crate::sim::decision::Decision;
use crate::sim::moves::lookup_move;
use crate::sim::resolver::modifier::{condition_applies, ConditionContext};
use crate::sim::resolver::residual::{end_of_turn, start_of_turn};
use crate::sim::resolver::stat::effective_speed;
use crate::sim::resolver::{effects_of, item_of};
use crate::sim::switching::{is_trapped, perform_switch, SwitchKind};
use crate::sim::turn::{committed_move, execute_action, TurnContext};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Priority bracket of any switch.
pub const SWITCH_PRIORITY: i8 = 6;

/// Chances for the engine's own random rolls.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub full_paralysis_chance: f64,
    pub thaw_chance: f64,
    pub confusion_self_hit_chance: f64,
    pub infatuation_chance: f64,
    /// Base of the success chance for back-to-back protection moves.
    pub consecutive_protect_success: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            full_paralysis_chance: 0.25,
            thaw_chance: 0.2,
            confusion_self_hit_chance: 0.33,
            infatuation_chance: 0.5,
            consecutive_protect_success: 0.0,
        }
    }
}

/// Result of a single turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub state: BattleState,
    pub log: BattleLog,
}

/// Turn engine over an injected rule catalog and damage calculator.
pub struct Engine {
    rules: RuleData,
    calc: Box<dyn DamageCalculator>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(rules: RuleData, calc: Box<dyn DamageCalculator>, config: EngineConfig) -> Self {
        Self { rules, calc, config }
    }

    /// Engine with the in-process damage formula and default chances.
    pub fn with_rules(rules: RuleData) -> Self {
        Self::new(rules, Box::new(LocalDamageCalc), EngineConfig::default())
    }

    pub fn rules(&self) -> &RuleData {
        &self.rules
    }

    pub fn calculator(&self) -> &dyn DamageCalculator {
        self.calc.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decisions `side` may take. Callers are expected to pick from this list;
    /// `apply_turn` does not re-validate.
    pub fn legal_actions(&self, state: &BattleState, side: Side) -> Vec<Decision> {
        let party = state.party(side);
        let mon = state.active(side);
        let switches = || -> Vec<Decision> {
            party
                .bench()
                .map(|(_, member)| Decision::switch(member.species.clone()))
                .collect()
        };
        if mon.is_fainted() || mon.must_switch {
            return switches();
        }
        if let Some(charging) = &mon.charging {
            return vec![Decision::use_move(charging.clone())];
        }

        let mut actions: Vec<Decision> = mon
            .moves
            .iter()
            .filter(|name| self.move_allowed(state, side, name))
            .map(|name| Decision::use_move(name.clone()))
            .collect();
        if actions.is_empty() {
            tracing::debug!(side = side.label(), species = %mon.species, "no usable moves, falling back to Struggle");
            actions.push(Decision::struggle());
        }
        if !is_trapped(state, side, &self.rules) {
            actions.extend(switches());
        }
        actions
    }

    fn move_allowed(&self, state: &BattleState, side: Side, name: &str) -> bool {
        let mon = state.active(side);
        let foe = state.active(side.opponent());
        let mv = lookup_move(&self.rules, name);
        let id = crate::data::normalize_id(name);
        let is = |other: Option<&str>| other.is_some_and(|other| crate::data::normalize_id(other) == id);

        if item_of(mon, &self.rules).choice_lock && mon.choice_lock.is_some() && !is(mon.choice_lock.as_deref()) {
            return false;
        }
        if mon.encore_move.is_some() && !is(mon.encore_move.as_deref()) {
            return false;
        }
        if is(mon.disabled_move.as_deref()) {
            return false;
        }
        if !mv.is_damaging() && (mon.has_volatile(Volatile::Taunt) || item_of(mon, &self.rules).blocks_status_moves) {
            return false;
        }
        if mv.flags.heal && mon.has_volatile(Volatile::HealBlock) {
            return false;
        }
        if mon.has_volatile(Volatile::Torment) && is(mon.last_move.as_deref()) {
            return false;
        }
        if foe.has_volatile(Volatile::Imprison) && foe.knows_move(name) {
            return false;
        }
        true
    }

    /// Priority bracket of a decision: a switch is 6, otherwise the move's
    /// priority plus any conditional ability or item boost.
    pub fn action_priority(&self, state: &BattleState, side: Side, decision: &Decision) -> i8 {
        let Some(mv) = committed_move(state, side, decision, &self.rules) else {
            return SWITCH_PRIORITY;
        };
        let mon = state.active(side);
        let ctx = ConditionContext {
            owner: mon,
            field: &state.field,
            mv: Some(mv),
            effectiveness: None,
            target: Some(state.active(side.opponent())),
        };
        let boost: i8 = effects_of(mon, &self.rules)
            .iter()
            .filter(|effect| effect.priority_boost != 0 && condition_applies(&effect.condition, &ctx))
            .map(|effect| effect.priority_boost)
            .sum();
        mv.priority.saturating_add(boost)
    }

    /// Which side acts first. Brackets compare first, then the once-per-turn
    /// speed-order modifier, then speed (inverted under trick room). The
    /// player wins absolute ties.
    pub fn turn_order(&self, state: &BattleState, player: &Decision, ai: &Decision) -> [Side; 2] {
        let player_key = (
            self.action_priority(state, Side::Player, player),
            state.active(Side::Player).turn_priority_mod,
        );
        let ai_key = (
            self.action_priority(state, Side::Ai, ai),
            state.active(Side::Ai).turn_priority_mod,
        );
        let player_first = if player_key != ai_key {
            player_key > ai_key
        } else {
            let p_speed = effective_speed(state.active(Side::Player), &state.field, Side::Player, &self.rules);
            let a_speed = effective_speed(state.active(Side::Ai), &state.field, Side::Ai, &self.rules);
            if state.field.trick_room_active() {
                p_speed <= a_speed
            } else {
                p_speed >= a_speed
            }
        };
        if player_first {
            [Side::Player, Side::Ai]
        } else {
            [Side::Ai, Side::Player]
        }
    }

    /// Resolves one turn on a private copy of `state`.
    pub fn apply_turn(&self, state: &BattleState, player: &Decision, ai: &Decision, rng: &mut SmallRng) -> TurnOutcome {
        let mut next = state.clone();
        let mut log = BattleLog::new();
        next.turn = next.turn.saturating_add(1);
        let decisions = [player, ai];
        tracing::trace!(turn = next.turn, %player, %ai, "apply turn");

        let mut ctx = TurnContext {
            state: &mut next,
            rules: &self.rules,
            calc: self.calc.as_ref(),
            config: &self.config,
            rng,
            log: &mut log,
        };

        let forced: Vec<Side> = Side::BOTH
            .into_iter()
            .filter(|side| {
                let mon = ctx.state.active(*side);
                mon.is_fainted() || mon.must_switch
            })
            .collect();
        if !forced.is_empty() {
            for side in forced {
                forced_switch(&mut ctx, side, decisions[side.index()]);
            }
            return TurnOutcome { state: next, log };
        }

        ctx.state.field.clear_turn_flags();
        start_of_turn(ctx.state, decisions, ctx.rules, ctx.rng, ctx.log);
        let order = self.turn_order(ctx.state, player, ai);
        let starting = Side::BOTH.map(|side| ctx.state.party(side).active);
        for side in order {
            if ctx.state.is_total_ko() {
                break;
            }
            // A combatant dragged in mid-turn does not inherit the queued action.
            if ctx.state.party(side).active != starting[side.index()] {
                tracing::debug!(side = side.label(), "active replaced before acting, action skipped");
                continue;
            }
            execute_action(&mut ctx, side, decisions[side.index()]);
        }

        end_of_turn(ctx.state, ctx.rules, ctx.rng, ctx.log);
        for side in Side::BOTH {
            let mon = ctx.state.active_mut(side);
            if !mon.is_fainted() {
                mon.active_turns = mon.active_turns.saturating_add(1);
            }
            mon.remove_volatile(Volatile::Flinch);
            mon.remove_volatile(Volatile::Protect);
            mon.remove_volatile(Volatile::MagicCoat);
        }
        TurnOutcome { state: next, log }
    }

    /// The side whose opponent has been wiped out, if any. Simultaneous
    /// wipes report no winner.
    pub fn winner(state: &BattleState) -> Option<Side> {
        match (state.party(Side::Player).is_wiped(), state.party(Side::Ai).is_wiped()) {
            (false, true) => Some(Side::Player),
            (true, false) => Some(Side::Ai),
            _ => None,
        }
    }
}

/// Replaces a fainted or pivoting active. A non-switch decision falls back
/// to the first healthy bench member.
fn forced_switch(ctx: &mut TurnContext, side: Side, decision: &Decision) {
    let party = ctx.state.party(side);
    let chosen = match decision {
        Decision::Switch(target) => party.find_switch_target(target),
        Decision::UseMove(_) => None,
    };
    let Some(slot) = chosen.or_else(|| party.bench().next().map(|(idx, _)| idx)) else {
        ctx.state.active_mut(side).must_switch = false;
        return;
    };
    if let Decision::Switch(target) = decision {
        if party.has_duplicate_species(target) {
            ctx.log.push(format!(
                "[{}] More than one {target} in the party; switching to the first one available.",
                side.label()
            ));
        }
    }
    perform_switch(ctx.state, side, slot, SwitchKind::Forced, ctx.rules, ctx.rng, ctx.log);
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("moves", &self.rules.move_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::moves::{MoveCategory, MoveData, MoveEffect};
    use crate::data::types::Type;
    use crate::sim::battle::Party;
    use crate::sim::combatant::Combatant;
    use crate::sim::stats::StatBlock;
    use rand::SeedableRng;

    fn mon(species: &str, spe: u16, moves: &[&str]) -> Combatant {
        Combatant::new(species, 50, vec![Type::Normal], StatBlock::new(160, 100, 100, 100, 100, spe))
            .with_moves(moves.iter().copied())
    }

    fn rules() -> RuleData {
        RuleData::new()
            .with_move(MoveData::new("Tackle", Type::Normal, MoveCategory::Physical, 40))
            .with_move(MoveData::new("Quick Attack", Type::Normal, MoveCategory::Physical, 40).with_priority(1))
            .with_move(MoveData::status(
                "Growl",
                Type::Normal,
                MoveEffect::Boost {
                    boosts: [(crate::sim::stats::Stat::Atk, -1)].into_iter().collect(),
                    target_self: false,
                },
            ))
    }

    #[test]
    fn struggle_when_every_move_is_locked_out() {
        let engine = Engine::with_rules(rules());
        let mut state = BattleState::new(
            Party::new(vec![mon("Solo", 100, &["Growl"])]),
            Party::new(vec![mon("Foe", 100, &["Tackle"])]),
        );
        state.active_mut(Side::Player).add_volatile(Volatile::Taunt, 3);
        assert_eq!(engine.legal_actions(&state, Side::Player), vec![Decision::struggle()]);
    }

    #[test]
    fn priority_beats_speed() {
        let engine = Engine::with_rules(rules());
        let state = BattleState::new(
            Party::new(vec![mon("Slow", 10, &["Quick Attack"])]),
            Party::new(vec![mon("Fast", 200, &["Tackle"])]),
        );
        let order = engine.turn_order(&state, &Decision::use_move("Quick Attack"), &Decision::use_move("Tackle"));
        assert_eq!(order, [Side::Player, Side::Ai]);
        let order = engine.turn_order(&state, &Decision::use_move("Tackle"), &Decision::switch("Anyone"));
        assert_eq!(order, [Side::Ai, Side::Player]);
    }

    #[test]
    fn trick_room_inverts_and_ties_go_to_the_player() {
        let engine = Engine::with_rules(rules());
        let mut state = BattleState::new(
            Party::new(vec![mon("Slow", 50, &["Tackle"])]),
            Party::new(vec![mon("Fast", 100, &["Tackle"])]),
        );
        let tackle = Decision::use_move("Tackle");
        assert_eq!(engine.turn_order(&state, &tackle, &tackle), [Side::Ai, Side::Player]);
        state.field.trick_room = 3;
        assert_eq!(engine.turn_order(&state, &tackle, &tackle), [Side::Player, Side::Ai]);
        state.field.trick_room = 0;
        state.active_mut(Side::Player).stats.spe = 100;
        assert_eq!(engine.turn_order(&state, &tackle, &tackle), [Side::Player, Side::Ai]);
    }

    #[test]
    fn winner_needs_a_one_sided_wipe() {
        let mut state = BattleState::new(
            Party::new(vec![mon("A", 100, &["Tackle"])]),
            Party::new(vec![mon("B", 100, &["Tackle"])]),
        );
        assert_eq!(Engine::winner(&state), None);
        state.active_mut(Side::Ai).current_hp = 0;
        assert_eq!(Engine::winner(&state), Some(Side::Player));
        state.active_mut(Side::Player).current_hp = 0;
        assert_eq!(Engine::winner(&state), None);
    }

    #[test]
    fn apply_turn_leaves_the_input_untouched() {
        let engine = Engine::with_rules(rules());
        let state = BattleState::new(
            Party::new(vec![mon("A", 100, &["Tackle"])]),
            Party::new(vec![mon("B", 90, &["Tackle"])]),
        );
        let snapshot = state.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        let tackle = Decision::use_move("Tackle");
        let outcome = engine.apply_turn(&state, &tackle, &tackle, &mut rng);
        assert_eq!(state, snapshot);
        assert_eq!(outcome.state.turn, 1);
        assert!(outcome.state.active(Side::Ai).current_hp < 160);
    }
}
