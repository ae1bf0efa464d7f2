//! Shared schema for abilities and held items.
//!
//! Both kinds of record carry conditional hook multipliers plus a set of
//! passive reactions. Everything defaults to "does nothing", so a record
//! only needs to spell out what it changes.

use crate::data::moves::{MoveCategory, MoveFlag};
use crate::data::types::Type;
use crate::sim::combatant::{Status, Volatile};
use crate::sim::field::{Terrain, Weather};
use crate::sim::stats::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Points in the damage and stat pipeline where a multiplier may apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    BasePower,
    ModifyDamage,
    /// Applied by the defender to damage it receives.
    SourceModifyDamage,
    AllyBasePower,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    /// Attacker-side multiplier on hit chance.
    Accuracy,
    /// Defender-side multiplier on the attacker's hit chance.
    Evasion,
}

impl Hook {
    pub fn for_stat(stat: Stat) -> Hook {
        match stat {
            Stat::Atk => Hook::Atk,
            Stat::Def => Hook::Def,
            Stat::Spa => Hook::Spa,
            Stat::Spd => Hook::Spd,
            Stat::Spe => Hook::Spe,
            Stat::Accuracy => Hook::Accuracy,
            Stat::Evasion => Hook::Evasion,
        }
    }
}

/// When a hook or passive applies. Empty fields impose no requirement.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Condition {
    pub move_types: Vec<Type>,
    pub category: Option<MoveCategory>,
    pub flag: Option<MoveFlag>,
    pub max_power: Option<u16>,
    pub requires_secondary: bool,
    pub hp_at_most: Option<f32>,
    pub full_hp: bool,
    pub statused: bool,
    pub status: Vec<Status>,
    pub weather: Vec<Weather>,
    pub terrain: Vec<Terrain>,
    pub super_effective: bool,
    pub not_very_effective: bool,
    pub species: Option<String>,
    pub target_statused: bool,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        *self == Condition::default()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConditionalModifier {
    pub hook: Hook,
    pub value: f32,
    #[serde(default)]
    pub condition: Condition,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeedOrder {
    /// Always acts last within its bracket.
    MoveLast,
    /// Acts first within its bracket `percent`% of the time.
    Chance { percent: u8 },
    /// One-shot berry that fires at or below `threshold` of max HP.
    LowHpBerry { threshold: f32 },
}

/// Reaction against the other side of a contact move.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactReaction {
    pub chance: u8,
    pub status: Option<Status>,
    pub volatile: Option<Volatile>,
    /// Fraction of the other side's max HP.
    pub damage: Option<f32>,
    pub boosts: BTreeMap<Stat, i8>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatDropReaction {
    RestoreStages,
    SwitchOut,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendTarget {
    Screens,
    Terrain,
    Weather(Weather),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Extension {
    pub target: ExtendTarget,
    pub turns: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct PinchHeal {
    pub threshold: f32,
    pub ratio: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EffectData {
    pub name: String,
    pub modifiers: BTreeMap<Hook, f32>,
    pub condition: Condition,
    pub conditional: Vec<ConditionalModifier>,

    pub residual_heal: Option<f32>,
    /// Holder must have this type to heal; otherwise `residual_damage` applies.
    pub residual_heal_type: Option<Type>,
    pub residual_damage: Option<f32>,
    pub residual_boosts: BTreeMap<Stat, i8>,
    pub residual_status: Option<Status>,
    pub speed_order: Option<SpeedOrder>,
    /// Added to a move's priority when `condition` holds for that move.
    pub priority_boost: i8,

    pub status_immunities: Vec<Status>,
    pub volatile_immunities: Vec<Volatile>,
    pub type_immunities: Vec<Type>,
    /// Fraction of max HP restored when a type immunity absorbs a move.
    pub immunity_heal: Option<f32>,

    pub block_stat_drops: bool,
    pub protected_stats: Vec<Stat>,
    pub invert_boosts: bool,
    pub stat_drop_reaction: Option<StatDropReaction>,

    pub secondary_chance_multiplier: Option<f32>,
    pub suppress_secondaries: bool,
    pub block_secondaries: bool,

    pub contact_reaction: Option<ContactReaction>,
    pub ko_boosts: BTreeMap<Stat, i8>,
    pub switch_out_heal: Option<f32>,
    pub switch_out_cure: bool,

    pub choice_lock: bool,
    pub blocks_status_moves: bool,
    pub traps_opponent: bool,
    pub always_hit: bool,
    pub suppresses_weather: bool,
    pub weather_immunities: Vec<Weather>,
    pub disables_items: bool,
    pub ignores_abilities: bool,
    pub no_indirect_damage: bool,
    pub poison_heal: bool,
    pub status_stat_exempt: bool,
    pub extends: Option<Extension>,
    pub charge_skip: bool,
    pub reflects_status: bool,
    pub maximize_hits: bool,
    /// Fraction of max HP lost after each damaging hit.
    pub attack_recoil: Option<f32>,
    pub pinch_heal: Option<PinchHeal>,
    /// Survives a hit from full HP with 1 HP left.
    pub endure_at_full: bool,
    pub stab_multiplier: Option<f32>,
    /// Normal and Fighting moves connect with Ghost-types.
    pub hits_ghost: bool,
    pub fast_wakeup: bool,
    pub truant: bool,
    pub blocks_explosions: bool,
    pub weather_on_entry: Option<Weather>,
    pub entry_boosts_opponent: BTreeMap<Stat, i8>,
    /// The item is used up once one of its reactions fires.
    pub single_use: bool,
}

impl EffectData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_modifier(mut self, hook: Hook, value: f32) -> Self {
        self.modifiers.insert(hook, value);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn immune_to_status(&self, status: Status) -> bool {
        self.status_immunities.contains(&status)
    }
}
