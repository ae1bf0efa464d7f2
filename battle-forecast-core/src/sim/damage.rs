//! Damage-roll collaborator and the resolver chain applied on top of it.
//!
//! A [`DamageCalculator`] only does the arithmetic: stats, power, STAB and
//! type. Ability, item and field multipliers are layered afterwards by
//! [`chain_multiplier`] so the engine and the scoring model agree on them.

use crate::data::effects::Hook;
use crate::data::moves::{MoveCategory, MoveData};
use crate::data::types::{type_effectiveness, Type};
use crate::data::RuleData;
use crate::sim::battle::Side;
use crate::sim::combatant::Combatant;
use crate::sim::field::Field;
use crate::sim::resolver::modifier::{field_damage_modifier, modifier, MoveContext, Role};
use crate::sim::resolver::stat::effective_stat;
use crate::sim::resolver::{ability_of, effects_of, is_grounded};
use crate::sim::stats::Stat;
use serde::{Deserialize, Serialize};

pub const ROLL_COUNT: usize = 16;
pub const CRIT_MULTIPLIER: f32 = 1.5;

/// One move's damage spread against one defender.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DamagePreview {
    #[serde(rename = "move")]
    pub move_name: String,
    pub category: MoveCategory,
    #[serde(rename = "type")]
    pub move_type: Type,
    pub priority: i8,
    /// Rolls for the 85..=100 random factor, lowest first.
    pub damage_rolls: Vec<u16>,
    pub crit_rolls: Vec<u16>,
    pub effectiveness: f32,
    pub is_stab: bool,
}

impl DamagePreview {
    pub fn max_roll(&self) -> u16 {
        self.damage_rolls.iter().copied().max().unwrap_or(0)
    }

    pub fn roll(&self, index: usize) -> u16 {
        self.damage_rolls.get(index).copied().unwrap_or(0)
    }
}

/// Everything the arithmetic may read. The calculator never mutates it.
#[derive(Clone, Copy, Debug)]
pub struct DamageRequest<'a> {
    pub attacker: &'a Combatant,
    pub defender: &'a Combatant,
    pub field: &'a Field,
    pub attacker_side: Side,
    pub rules: &'a RuleData,
}

/// Pure damage-roll source. An empty result means "no data".
pub trait DamageCalculator {
    fn damage_rolls(&self, request: &DamageRequest, moves: &[&MoveData]) -> Vec<DamagePreview>;
}

/// In-process implementation of the standard formula.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalDamageCalc;

impl DamageCalculator for LocalDamageCalc {
    fn damage_rolls(&self, request: &DamageRequest, moves: &[&MoveData]) -> Vec<DamagePreview> {
        moves.iter().map(|mv| preview_move(request, mv)).collect()
    }
}

fn preview_move(request: &DamageRequest, mv: &MoveData) -> DamagePreview {
    let attacker = request.attacker;
    let effectiveness = move_effectiveness(mv, attacker, request.defender, request.field, request.rules);
    let is_stab = mv.move_type != Type::Typeless && attacker.has_type(mv.move_type);
    let mut preview = DamagePreview {
        move_name: mv.name.clone(),
        category: mv.category,
        move_type: mv.move_type,
        priority: mv.priority,
        damage_rolls: vec![0; ROLL_COUNT],
        crit_rolls: vec![0; ROLL_COUNT],
        effectiveness,
        is_stab,
    };
    if !mv.is_damaging() {
        return preview;
    }

    let fixed = if mv.level_damage {
        Some(attacker.level as u16)
    } else {
        mv.fixed_damage
    };
    if let Some(amount) = fixed {
        let amount = if effectiveness == 0.0 { 0 } else { amount };
        preview.damage_rolls = vec![amount; ROLL_COUNT];
        preview.crit_rolls = vec![amount; ROLL_COUNT];
        return preview;
    }
    if mv.power == 0 || effectiveness == 0.0 {
        return preview;
    }

    let defender_side = request.attacker_side.opponent();
    let (atk_stat, def_stat) = match mv.category {
        MoveCategory::Physical => (Stat::Atk, Stat::Def),
        _ => (Stat::Spa, Stat::Spd),
    };
    let attack = effective_stat(attacker, atk_stat, request.field, request.attacker_side, request.rules);
    let defense = effective_stat(request.defender, def_stat, request.field, defender_side, request.rules);
    let base = compute_base_damage(attacker.level, attack, defense, mv.power);
    let stab = if is_stab {
        ability_of(attacker, request.rules).stab_multiplier.unwrap_or(1.5)
    } else {
        1.0
    };

    for (idx, roll) in (85..=100u32).enumerate() {
        let mut damage = base * roll / 100;
        damage = (damage as f32 * stab).floor() as u32;
        damage = (damage as f32 * effectiveness).floor() as u32;
        let damage = damage.max(1);
        let crit = ((damage as f32 * CRIT_MULTIPLIER).floor() as u32).max(1);
        preview.damage_rolls[idx] = clamp_u16(damage);
        preview.crit_rolls[idx] = clamp_u16(crit);
    }
    preview
}

fn clamp_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

/// floor(floor(floor(2L/5 + 2) * P * A / D) / 50) + 2
pub fn compute_base_damage(level: u8, attack: u16, defense: u16, power: u16) -> u32 {
    let level_factor = 2 * level as u32 / 5 + 2;
    let raw = level_factor * power as u32 * attack as u32 / defense.max(1) as u32;
    raw / 50 + 2
}

/// Type multiplier including ability and item immunities, grounding and
/// Ghost-piercing abilities.
pub fn move_effectiveness(
    mv: &MoveData,
    attacker: &Combatant,
    defender: &Combatant,
    field: &Field,
    rules: &RuleData,
) -> f32 {
    if mv.move_type == Type::Typeless {
        return 1.0;
    }
    if mv.move_type == Type::Ground && !is_grounded(defender, field, rules) {
        return 0.0;
    }
    let attacker_ability = ability_of(attacker, rules);
    let pierces_ghost =
        attacker_ability.hits_ghost && matches!(mv.move_type, Type::Normal | Type::Fighting);
    let types: Vec<Type> = defender
        .types
        .iter()
        .copied()
        .filter(|ty| !(pierces_ghost && *ty == Type::Ghost))
        .filter(|ty| !(mv.move_type == Type::Ground && *ty == Type::Flying))
        .collect();
    let effectiveness = type_effectiveness(mv.move_type, &types);
    if effectiveness == 0.0 {
        return 0.0;
    }
    if mv.is_damaging() && absorbs_type(defender, mv.move_type, attacker_ability.ignores_abilities, rules) {
        return 0.0;
    }
    effectiveness
}

/// Ability or item that nullifies moves of `move_type`.
pub fn absorbs_type(defender: &Combatant, move_type: Type, ignore_ability: bool, rules: &RuleData) -> bool {
    effects_of(defender, rules)
        .iter()
        .enumerate()
        .filter(|(idx, _)| !(ignore_ability && *idx == 0))
        .any(|(_, effect)| effect.type_immunities.contains(&move_type))
}

pub(crate) fn chain_modifier(previous: f32, next: f32) -> f32 {
    let previous = (previous * 4096.0).floor() as u64;
    let next = (next * 4096.0).floor() as u64;
    let chained = (previous * next + 2048) >> 12;
    chained as f32 / 4096.0
}

pub(crate) fn apply_modifier(value: u32, modifier: f32) -> u32 {
    if modifier <= 0.0 {
        return 0;
    }
    let modifier = (modifier * 4096.0).floor() as u64;
    let value = value as u64;
    ((value * modifier + 2048 - 1) / 4096) as u32
}

/// Base-power, damage and field multipliers for one hit, chained in the
/// 4096 fixed-point scale.
pub fn chain_multiplier(ctx: &MoveContext, defender_side: Side, rules: &RuleData) -> f32 {
    [
        modifier(Role::Attacker, Hook::BasePower, ctx, rules),
        modifier(Role::Attacker, Hook::AllyBasePower, ctx, rules),
        modifier(Role::Attacker, Hook::ModifyDamage, ctx, rules),
        modifier(Role::Defender, Hook::SourceModifyDamage, ctx, rules),
        field_damage_modifier(ctx, defender_side, rules),
    ]
    .into_iter()
    .fold(1.0, chain_modifier)
}

/// Applies a chained multiplier to a raw roll. Non-zero rolls stay at least 1.
pub fn scale_roll(roll: u16, multiplier: f32) -> u16 {
    if roll == 0 {
        return 0;
    }
    clamp_u16(apply_modifier(roll as u32, multiplier).max(1))
}
