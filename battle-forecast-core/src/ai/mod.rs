//! Heuristic opponent model: scores every option of one side over 16
//! damage-roll percentiles and 5 fixed variants, then turns the grid into
//! a selection distribution.

pub mod probability;
pub mod scoring;
pub mod tables;

use crate::data::moves::MoveData;
use crate::engine::Engine;
use crate::sim::battle::{BattleState, Side};
use crate::sim::combatant::Combatant;
use crate::sim::damage::{chain_multiplier, scale_roll, DamagePreview, DamageRequest, ROLL_COUNT};
use crate::sim::decision::Decision;
use crate::sim::moves::lookup_move;
use crate::sim::resolver::modifier::MoveContext;
use crate::sim::resolver::stat::effective_speed;
use scoring::{Candidate, Cell, ScoreContext, INEFFECTIVE, NEVER, SWITCH_SCORE};
use serde::Serialize;

pub const ROLL_ROWS: usize = ROLL_COUNT;
pub const VARIANT_COUNT: usize = 5;
pub const GRID_ROWS: usize = ROLL_ROWS * VARIANT_COUNT;
pub const VARIANT_WEIGHTS: [f64; VARIANT_COUNT] = [0.25, 0.25, 0.25, 0.05, 0.20];
/// Injected switches stay live in these variants only (50% of the weight).
const SWITCH_VARIANTS: usize = 2;

/// Scored options for one side. `grid[row][col]` is candidate `col`'s score
/// in row `roll * 5 + variant`.
#[derive(Clone, Debug, Serialize)]
pub struct ScoreResult {
    pub candidates: Vec<Decision>,
    pub grid: Vec<Vec<i32>>,
    pub variant_weights: [f64; VARIANT_COUNT],
    pub previews: Vec<DamagePreview>,
}

impl ScoreResult {
    fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            grid: Vec::new(),
            variant_weights: VARIANT_WEIGHTS,
            previews: Vec::new(),
        }
    }

    pub fn selection_probabilities(&self) -> Vec<(Decision, f64)> {
        probability::selection_probabilities(&self.candidates, &self.grid, &self.variant_weights)
    }

    pub fn max_score(&self) -> Option<i32> {
        self.grid.iter().flatten().copied().max()
    }

    /// Appends a column with one score per variant.
    fn push_column(&mut self, decision: Decision, score_for_variant: impl Fn(usize) -> i32) {
        if self.grid.is_empty() {
            self.grid = vec![Vec::new(); GRID_ROWS];
        }
        for (row_idx, row) in self.grid.iter_mut().enumerate() {
            row.push(score_for_variant(row_idx % VARIANT_COUNT));
        }
        self.candidates.push(decision);
    }
}

/// Scores decisions with the engine's rules and damage calculator.
pub struct ScoringModel<'e> {
    engine: &'e Engine,
}

impl<'e> ScoringModel<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    pub fn score(&self, state: &BattleState, side: Side) -> ScoreResult {
        let attacker = state.active(side);
        if attacker.is_fainted() || attacker.must_switch {
            return forced_switch(state, side);
        }
        let rules = self.engine.rules();
        let defender = state.active(side.opponent());

        let candidates: Vec<Decision> = self
            .engine
            .legal_actions(state, side)
            .into_iter()
            .filter(|decision| !decision.is_switch())
            .collect();
        let moves: Vec<&MoveData> = candidates
            .iter()
            .filter_map(Decision::move_name)
            .map(|name| lookup_move(rules, name))
            .collect();
        let previews = self.previews(state, side, &moves);

        let attacker_speed = effective_speed(attacker, &state.field, side, rules);
        let defender_speed = effective_speed(defender, &state.field, side.opponent(), rules);
        let ctx = ScoreContext {
            state,
            side,
            rules,
            attacker,
            defender,
            is_faster: attacker_speed >= defender_speed,
            first_turn: attacker.active_turns == 0,
            threatened: self.threatened(state, side),
        };

        let target_hp = defender.current_hp;
        let mut max_damage = [0u16; ROLL_ROWS];
        let mut any_kill = [false; ROLL_ROWS];
        for preview in &previews {
            for (roll, damage) in preview.damage_rolls.iter().enumerate() {
                max_damage[roll] = max_damage[roll].max(*damage);
                any_kill[roll] |= *damage > 0 && *damage >= target_hp;
            }
        }

        let mut result = ScoreResult::empty();
        result.grid = vec![Vec::with_capacity(candidates.len()); GRID_ROWS];
        for ((decision, mv), preview) in candidates.iter().zip(&moves).zip(&previews) {
            let priority = self.engine.action_priority(state, side, decision);
            let cand = Candidate::new(mv, priority, preview.effectiveness);
            if !scoring::is_valid(&ctx, &cand) {
                result.push_column(decision.clone(), |_| NEVER);
                continue;
            }
            for roll in 0..ROLL_ROWS {
                let damage = preview.roll(roll);
                let kills = damage > 0 && damage >= target_hp;
                let cell = Cell {
                    damage,
                    kills,
                    is_highest: (kills && any_kill[roll]) || (!any_kill[roll] && damage >= max_damage[roll]),
                };
                for variant in 0..VARIANT_COUNT {
                    result.grid[roll * VARIANT_COUNT + variant].push(scoring::score_cell(&ctx, &cand, variant, &cell));
                }
            }
            result.candidates.push(decision.clone());
            tracing::trace!(side = side.label(), candidate = %decision, "scored");
        }
        result.previews = previews;

        if side == Side::Ai {
            self.inject_switches(&ctx, &mut result);
        }
        result
    }

    /// Calculator rolls for `moves`, padded to 16 and passed through the
    /// resolver's damage chain. Status moves and data gaps read as zero.
    fn previews(&self, state: &BattleState, side: Side, moves: &[&MoveData]) -> Vec<DamagePreview> {
        let attacker = state.active(side);
        let defender = state.active(side.opponent());
        preview_moves(self.engine, state, attacker, defender, side, moves)
    }

    /// Any opposing move's top roll knocks `side`'s active out.
    fn threatened(&self, state: &BattleState, side: Side) -> bool {
        let rules = self.engine.rules();
        let foe_side = side.opponent();
        let foe = state.active(foe_side);
        let own = state.active(side);
        if foe.is_fainted() {
            return false;
        }
        let moves: Vec<&MoveData> = foe.moves.iter().map(|name| lookup_move(rules, name)).collect();
        preview_moves(self.engine, state, foe, own, foe_side, &moves)
            .iter()
            .any(|preview| preview.max_roll() >= own.current_hp && preview.max_roll() > 0)
    }

    /// Offers switches at a fixed 50% when every move is ineffective and the
    /// active is still healthy.
    fn inject_switches(&self, ctx: &ScoreContext, result: &mut ScoreResult) {
        if result.max_score().is_some_and(|best| best > INEFFECTIVE) || ctx.hp_fraction() <= 0.5 {
            return;
        }
        if !switch_scan(ctx) {
            return;
        }
        for (_, member) in ctx.state.party(ctx.side).bench() {
            result.push_column(Decision::switch(member.species.clone()), |variant| {
                if variant < SWITCH_VARIANTS {
                    SWITCH_SCORE
                } else {
                    NEVER
                }
            });
        }
        tracing::debug!(side = ctx.side.label(), "injected switch candidates");
    }
}

/// Party scan gating switch injection. Once one member reads as faster
/// than the foe every later member is taken as faster too, so the scan
/// reduces to having a healthy bench member at all.
fn switch_scan(ctx: &ScoreContext) -> bool {
    ctx.state.party(ctx.side).bench().next().is_some()
}

/// Replacement options for a fainted or pivoting active, all scored alike.
fn forced_switch(state: &BattleState, side: Side) -> ScoreResult {
    let mut result = ScoreResult::empty();
    for (_, member) in state.party(side).bench() {
        result.push_column(Decision::switch(member.species.clone()), |_| SWITCH_SCORE);
    }
    result
}

fn preview_moves(
    engine: &Engine,
    state: &BattleState,
    attacker: &Combatant,
    defender: &Combatant,
    attacker_side: Side,
    moves: &[&MoveData],
) -> Vec<DamagePreview> {
    let rules = engine.rules();
    let request = DamageRequest {
        attacker,
        defender,
        field: &state.field,
        attacker_side,
        rules,
    };
    let raw = engine.calculator().damage_rolls(&request, moves);
    if raw.is_empty() && !moves.is_empty() {
        tracing::debug!(attacker = %attacker.species, "damage calculator returned no data");
    }
    moves
        .iter()
        .enumerate()
        .map(|(idx, &mv)| {
            let found = raw
                .get(idx)
                .filter(|preview| crate::data::normalize_id(&preview.move_name) == crate::data::normalize_id(&mv.name))
                .cloned();
            let mut preview = found.unwrap_or_else(|| DamagePreview {
                move_name: mv.name.clone(),
                category: mv.category,
                move_type: mv.move_type,
                priority: mv.priority,
                damage_rolls: Vec::new(),
                crit_rolls: Vec::new(),
                effectiveness: 1.0,
                is_stab: false,
            });
            if !mv.is_damaging() {
                preview.damage_rolls = vec![0; ROLL_ROWS];
                return preview;
            }
            let last = preview.damage_rolls.last().copied().unwrap_or(0);
            preview.damage_rolls.resize(ROLL_ROWS, last);
            let ctx = MoveContext {
                mv,
                attacker,
                defender,
                ally: None,
                field: &state.field,
                effectiveness: preview.effectiveness,
                crit: false,
            };
            let multiplier = chain_multiplier(&ctx, attacker_side.opponent(), rules);
            for roll in preview.damage_rolls.iter_mut() {
                *roll = scale_roll(*roll, multiplier);
            }
            preview
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::moves::{MoveCategory, MoveEffect};
    use crate::data::types::Type;
    use crate::data::RuleData;
    use crate::sim::battle::Party;
    use crate::sim::stats::{Stat, StatBlock};
    use std::collections::BTreeMap;

    fn rules() -> RuleData {
        RuleData::new()
            .with_move(MoveData::new("Body Slam", Type::Normal, MoveCategory::Physical, 85))
            .with_move(MoveData::new("Splash Hit", Type::Normal, MoveCategory::Physical, 10))
            .with_move(MoveData {
                heal: Some(0.5),
                ..MoveData::status(
                    "Recover",
                    Type::Normal,
                    MoveEffect::Boost {
                        boosts: BTreeMap::new(),
                        target_self: true,
                    },
                )
            })
            .with_move(MoveData::status(
                "Swords Dance",
                Type::Normal,
                MoveEffect::Boost {
                    boosts: BTreeMap::from([(Stat::Atk, 2)]),
                    target_self: true,
                },
            ))
    }

    fn mon(species: &str, types: Vec<Type>, stats: StatBlock, moves: &[&str]) -> Combatant {
        Combatant::new(species, 50, types, stats).with_moves(moves.iter().copied())
    }

    fn total(probs: &[(Decision, f64)]) -> f64 {
        probs.iter().map(|(_, p)| p).sum()
    }

    #[test]
    fn threatened_setup_scores_the_floor_and_lethal_attack_the_top() {
        let engine = Engine::with_rules(rules());
        let mut ai = mon(
            "Setter",
            vec![Type::Normal],
            StatBlock::new(150, 200, 80, 80, 80, 50),
            &["Swords Dance", "Body Slam"],
        );
        ai.current_hp = 60;
        let mut player = mon("Bruiser", vec![Type::Normal], StatBlock::new(150, 200, 80, 80, 80, 120), &["Body Slam"]);
        player.current_hp = 20;
        let state = BattleState::new(Party::new(vec![player]), Party::new(vec![ai]));

        let result = ScoringModel::new(&engine).score(&state, Side::Ai);
        assert_eq!(result.grid.len(), GRID_ROWS);
        let dance = result.candidates.iter().position(|d| d == &Decision::use_move("Swords Dance"));
        let slam = result.candidates.iter().position(|d| d == &Decision::use_move("Body Slam"));
        let (Some(dance), Some(slam)) = (dance, slam) else {
            panic!("both moves should be candidates");
        };
        for row in &result.grid {
            assert_eq!(row[dance], NEVER);
            assert!(row[slam] >= 9);
        }
        let probs = result.selection_probabilities();
        assert_eq!(probs.len(), 1);
        assert_eq!(probs[0].0, Decision::use_move("Body Slam"));
        assert!((probs[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fainted_active_scores_only_switches() {
        let engine = Engine::with_rules(rules());
        let stats = StatBlock::new(100, 80, 80, 80, 80, 80);
        let mut lead = mon("Lead", vec![Type::Normal], stats, &["Body Slam"]);
        lead.current_hp = 0;
        let ai = Party::new(vec![
            lead,
            mon("Second", vec![Type::Normal], stats, &["Body Slam"]),
            mon("Third", vec![Type::Normal], stats, &["Body Slam"]),
        ]);
        let state = BattleState::new(Party::new(vec![mon("Foe", vec![Type::Normal], stats, &["Body Slam"])]), ai);
        let result = ScoringModel::new(&engine).score(&state, Side::Ai);
        assert_eq!(result.candidates, vec![Decision::switch("Second"), Decision::switch("Third")]);
        let probs = result.selection_probabilities();
        assert!((total(&probs) - 1.0).abs() < 1e-9);
        assert!((probs[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hopeless_matchup_injects_a_half_weight_switch() {
        let engine = Engine::with_rules(rules());
        let stats = StatBlock::new(100, 80, 80, 80, 80, 80);
        let mut healer = mon("Healer", vec![Type::Normal], stats, &["Recover"]);
        healer.current_hp = 90;
        let ai = Party::new(vec![
            healer,
            mon("Backup", vec![Type::Normal], stats, &["Body Slam"]),
        ]);
        let player = Party::new(vec![mon("Floater", vec![Type::Flying], stats, &["Body Slam"])]);
        let state = BattleState::new(player, ai);

        let result = ScoringModel::new(&engine).score(&state, Side::Ai);
        assert!(result.candidates.contains(&Decision::switch("Backup")));
        let probs = result.selection_probabilities();
        let switch = probs
            .iter()
            .find(|(decision, _)| decision.is_switch())
            .map(|(_, p)| *p)
            .unwrap_or_default();
        assert!((switch - 0.5).abs() < 1e-9);
        assert!((total(&probs) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn slower_backup_still_passes_the_switch_scan() {
        let engine = Engine::with_rules(rules());
        let stats = StatBlock::new(100, 80, 80, 80, 80, 80);
        let mut healer = mon("Healer", vec![Type::Normal], stats, &["Recover"]);
        healer.current_hp = 90;
        let slowpoke = mon("Slowpoke", vec![Type::Normal], StatBlock::new(100, 80, 80, 80, 80, 5), &["Body Slam"]);
        let state = BattleState::new(
            Party::new(vec![mon("Floater", vec![Type::Flying], stats, &["Body Slam"])]),
            Party::new(vec![healer, slowpoke]),
        );

        let result = ScoringModel::new(&engine).score(&state, Side::Ai);
        assert!(result.candidates.contains(&Decision::switch("Slowpoke")));
    }

    #[test]
    fn probabilities_sum_to_one_for_ordinary_states() {
        let engine = Engine::with_rules(rules());
        let stats = StatBlock::new(120, 90, 90, 90, 90, 90);
        let state = BattleState::new(
            Party::new(vec![mon("P", vec![Type::Normal], stats, &["Body Slam", "Splash Hit"])]),
            Party::new(vec![mon("A", vec![Type::Normal], stats, &["Body Slam", "Splash Hit", "Swords Dance"])]),
        );
        for side in Side::BOTH {
            let probs = ScoringModel::new(&engine).score(&state, side).selection_probabilities();
            assert!((total(&probs) - 1.0).abs() < 1e-9);
        }
    }
}
