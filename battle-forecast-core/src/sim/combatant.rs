use crate::data::normalize_id;
use crate::data::types::Type;
use crate::sim::stats::{Stages, Stat, StatBlock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primary (persistent) ailment. At most one at a time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[serde(alias = "brn")]
    Burn,
    #[serde(alias = "par")]
    Paralysis,
    #[serde(alias = "psn")]
    Poison,
    #[serde(alias = "tox")]
    Toxic,
    #[serde(alias = "slp")]
    Sleep,
    #[serde(alias = "frz")]
    Freeze,
}

impl Status {
    pub fn is_poison(self) -> bool {
        matches!(self, Status::Poison | Status::Toxic)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Burn => "burned",
            Status::Paralysis => "paralyzed",
            Status::Poison => "poisoned",
            Status::Toxic => "badly poisoned",
            Status::Sleep => "asleep",
            Status::Freeze => "frozen",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Temporary per-combatant conditions. The stored counter is a remaining
/// duration for timed conditions and unused for plain flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatile {
    Confusion,
    Flinch,
    LeechSeed,
    AquaRing,
    Ingrain,
    PartiallyTrapped,
    Yawn,
    PerishSong,
    SaltCure,
    MagnetRise,
    Taunt,
    Encore,
    Disable,
    HealBlock,
    Torment,
    Attract,
    Substitute,
    Protect,
    MagicCoat,
    SemiInvulnerable,
    MustRecharge,
    FocusEnergy,
    DestinyBond,
    Nightmare,
    Imprison,
    Identified,
}

impl Volatile {
    /// Initial counter when the condition starts.
    pub fn initial_counter(self) -> u8 {
        match self {
            Volatile::Taunt | Volatile::Encore => 3,
            Volatile::Disable => 4,
            Volatile::HealBlock | Volatile::MagnetRise => 5,
            Volatile::PartiallyTrapped => 4,
            Volatile::Yawn => 2,
            Volatile::PerishSong => 4,
            _ => 0,
        }
    }

    /// Cleared at the end of every turn.
    pub fn is_one_turn(self) -> bool {
        matches!(self, Volatile::Flinch | Volatile::Protect | Volatile::MagicCoat)
    }
}

/// The parts of a combatant Transform overwrites.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BaseForm {
    pub types: Vec<Type>,
    pub moves: Vec<String>,
    pub ability: String,
    pub stats: StatBlock,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Combatant {
    pub species: String,
    pub level: u8,
    pub types: Vec<Type>,
    pub moves: Vec<String>,
    pub item: Option<String>,
    pub item_consumed: bool,
    pub ability: String,
    pub ability_suppressed: bool,
    pub stats: StatBlock,
    pub stages: Stages,
    pub current_hp: u16,
    pub status: Option<Status>,
    pub sleep_turns: u8,
    pub toxic_counter: u8,
    pub volatiles: BTreeMap<Volatile, u8>,
    pub substitute_hp: u16,
    pub last_move: Option<String>,
    pub must_switch: bool,
    pub choice_lock: Option<String>,
    pub protect_counter: u8,
    pub active_turns: u32,
    pub turn_priority_mod: i8,
    pub disabled_move: Option<String>,
    pub encore_move: Option<String>,
    pub charging: Option<String>,
    pub truant_idle: bool,
    /// Pre-Transform form, restored when the combatant leaves the field.
    pub transformed: Option<Box<BaseForm>>,
}

impl Default for Combatant {
    fn default() -> Self {
        Self {
            species: String::new(),
            level: 50,
            types: vec![Type::Normal],
            moves: Vec::new(),
            item: None,
            item_consumed: false,
            ability: String::new(),
            ability_suppressed: false,
            stats: StatBlock::default(),
            stages: Stages::default(),
            current_hp: 0,
            status: None,
            sleep_turns: 0,
            toxic_counter: 0,
            volatiles: BTreeMap::new(),
            substitute_hp: 0,
            last_move: None,
            must_switch: false,
            choice_lock: None,
            protect_counter: 0,
            active_turns: 0,
            turn_priority_mod: 0,
            disabled_move: None,
            encore_move: None,
            charging: None,
            truant_idle: false,
            transformed: None,
        }
    }
}

impl Combatant {
    pub fn new(species: impl Into<String>, level: u8, types: Vec<Type>, stats: StatBlock) -> Self {
        Self {
            species: species.into(),
            level,
            types,
            current_hp: stats.hp,
            stats,
            ..Self::default()
        }
    }

    pub fn with_moves<S: Into<String>>(mut self, moves: impl IntoIterator<Item = S>) -> Self {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = ability.into();
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.stats.hp == 0 {
            return 0.0;
        }
        self.current_hp as f32 / self.stats.hp as f32
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_full_hp(&self) -> bool {
        self.current_hp >= self.stats.hp
    }

    pub fn take_damage(&mut self, damage: u16) -> u16 {
        let dealt = damage.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    pub fn heal(&mut self, amount: u16) -> u16 {
        let healed = amount.min(self.stats.hp.saturating_sub(self.current_hp));
        self.current_hp += healed;
        healed
    }

    /// `ratio` of max HP, floored, at least 1.
    pub fn fraction_of_max(&self, ratio: f32) -> u16 {
        ((self.stats.hp as f32 * ratio).floor() as u16).max(1)
    }

    pub fn has_type(&self, ty: Type) -> bool {
        self.types.contains(&ty)
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        !self.ability_suppressed && normalize_id(&self.ability) == normalize_id(ability)
    }

    /// Held item that can still trigger.
    pub fn held_item(&self) -> Option<&str> {
        if self.item_consumed {
            return None;
        }
        self.item.as_deref()
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.held_item()
            .is_some_and(|held| normalize_id(held) == normalize_id(item))
    }

    pub fn consume_item(&mut self) {
        self.item_consumed = true;
    }

    pub fn has_volatile(&self, volatile: Volatile) -> bool {
        self.volatiles.contains_key(&volatile)
    }

    /// Adds the condition unless it is already present.
    pub fn add_volatile(&mut self, volatile: Volatile, counter: u8) -> bool {
        if self.volatiles.contains_key(&volatile) {
            return false;
        }
        self.volatiles.insert(volatile, counter);
        true
    }

    pub fn remove_volatile(&mut self, volatile: Volatile) -> bool {
        self.volatiles.remove(&volatile).is_some()
    }

    pub fn knows_move(&self, name: &str) -> bool {
        let id = normalize_id(name);
        self.moves.iter().any(|m| normalize_id(m) == id)
    }

    /// Immunities that come from typing alone.
    pub fn type_blocks_status(&self, status: Status) -> bool {
        match status {
            Status::Burn => self.has_type(Type::Fire),
            Status::Paralysis => self.has_type(Type::Electric),
            Status::Poison | Status::Toxic => {
                self.has_type(Type::Poison) || self.has_type(Type::Steel)
            }
            Status::Freeze => self.has_type(Type::Ice),
            Status::Sleep => false,
        }
    }

    /// Sets the ailment and its counters. Fails when another ailment is
    /// present or the typing is immune; ability and field checks happen in
    /// the resolver before this is called.
    pub fn apply_status(&mut self, status: Status, rng: &mut impl Rng) -> bool {
        if self.status.is_some() || self.is_fainted() || self.type_blocks_status(status) {
            return false;
        }
        match status {
            // 1-3 turns asleep; the counter is spent when the sleeper tries to act
            Status::Sleep => self.sleep_turns = rng.gen_range(2..=4),
            Status::Toxic => self.toxic_counter = 0,
            _ => {}
        }
        self.status = Some(status);
        true
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.sleep_turns = 0;
        self.toxic_counter = 0;
    }

    /// Copies `foe`'s types, moves, ability, non-HP stats and stages. The
    /// first base form is kept across repeated transforms.
    pub fn transform_into(&mut self, foe: &Combatant) {
        if self.transformed.is_none() {
            self.transformed = Some(Box::new(BaseForm {
                types: self.types.clone(),
                moves: self.moves.clone(),
                ability: self.ability.clone(),
                stats: self.stats,
            }));
        }
        let hp = self.stats.hp;
        self.types = foe.types.clone();
        self.moves = foe.moves.clone();
        self.ability = foe.ability.clone();
        self.stats = StatBlock { hp, ..foe.stats };
        self.stages = foe.stages;
    }

    pub fn revert_form(&mut self) {
        if let Some(base) = self.transformed.take() {
            self.types = base.types;
            self.moves = base.moves;
            self.ability = base.ability;
            self.stats = base.stats;
        }
    }

    /// Resets everything that does not survive leaving the field.
    pub fn clear_switch_state(&mut self) {
        self.revert_form();
        self.stages.reset();
        self.volatiles.clear();
        self.substitute_hp = 0;
        self.choice_lock = None;
        self.protect_counter = 0;
        self.must_switch = false;
        self.active_turns = 0;
        self.turn_priority_mod = 0;
        self.disabled_move = None;
        self.encore_move = None;
        self.charging = None;
        self.truant_idle = false;
        self.last_move = None;
        if self.status == Some(Status::Toxic) {
            self.toxic_counter = 0;
        }
    }

    pub fn stage(&self, stat: Stat) -> i8 {
        self.stages.get(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn make_mon(types: Vec<Type>) -> Combatant {
        Combatant::new("Testmon", 50, types, StatBlock::new(150, 100, 100, 100, 100, 100))
            .with_moves(["Tackle"])
            .with_ability("Blaze")
    }

    #[test]
    fn sleep_turns_are_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut mon = make_mon(vec![Type::Normal]);
        assert!(mon.apply_status(Status::Sleep, &mut rng));
        assert!((2..=4).contains(&mon.sleep_turns));
    }

    #[test]
    fn fire_types_cannot_be_burned() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut mon = make_mon(vec![Type::Fire, Type::Flying]);
        assert!(!mon.apply_status(Status::Burn, &mut rng));
        assert_eq!(mon.status, None);
    }

    #[test]
    fn second_status_is_rejected() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut mon = make_mon(vec![Type::Normal]);
        assert!(mon.apply_status(Status::Paralysis, &mut rng));
        assert!(!mon.apply_status(Status::Burn, &mut rng));
        assert_eq!(mon.status, Some(Status::Paralysis));
    }

    #[test]
    fn transform_reverts_on_switch_out() {
        let mut ditto = Combatant::new("Ditto", 50, vec![Type::Normal], StatBlock::new(108, 53, 53, 53, 53, 53))
            .with_moves(["Transform"]);
        let foe = make_mon(vec![Type::Fire]);
        ditto.transform_into(&foe);
        ditto.transform_into(&foe);
        assert_eq!(ditto.types, vec![Type::Fire]);
        assert_eq!(ditto.stats.hp, 108);
        assert_eq!(ditto.stats.atk, 100);

        ditto.clear_switch_state();
        assert_eq!(ditto.types, vec![Type::Normal]);
        assert_eq!(ditto.moves, vec!["Transform".to_string()]);
        assert_eq!(ditto.ability, "");
        assert_eq!(ditto.stats.atk, 53);
        assert!(ditto.transformed.is_none());
    }

    #[test]
    fn hp_stays_in_bounds() {
        let mut mon = make_mon(vec![Type::Normal]);
        assert_eq!(mon.take_damage(400), 150);
        assert_eq!(mon.current_hp, 0);
        assert_eq!(mon.heal(400), 150);
        assert_eq!(mon.current_hp, 150);
    }

    #[test]
    fn suppressed_ability_is_not_reported() {
        let mut mon = make_mon(vec![Type::Normal]);
        assert!(mon.has_ability("blaze"));
        mon.ability_suppressed = true;
        assert!(!mon.has_ability("Blaze"));
    }
}
