use crate::data::effects::{Condition, Hook};
use crate::data::types::Type;
use crate::sim::combatant::{Status, Volatile};
use crate::sim::field::{Terrain, Weather};
use crate::sim::stats::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
pub enum MoveCategory {
    Physical,
    Special,
    #[default]
    Status,
}

impl MoveCategory {
    pub fn is_damaging(self) -> bool {
        !matches!(self, MoveCategory::Status)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveFlag {
    Contact,
    Protect,
    Reflectable,
    Sound,
    Punch,
    Bite,
    Slicing,
    Pulse,
    Heal,
    Charge,
    Recharge,
    Defrost,
    Bullet,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct MoveFlags {
    pub contact: bool,
    pub protect: bool,
    pub reflectable: bool,
    pub sound: bool,
    pub punch: bool,
    pub bite: bool,
    pub slicing: bool,
    pub pulse: bool,
    pub heal: bool,
    pub charge: bool,
    pub recharge: bool,
    pub defrost: bool,
    pub bullet: bool,
}

impl MoveFlags {
    pub fn has(&self, flag: MoveFlag) -> bool {
        match flag {
            MoveFlag::Contact => self.contact,
            MoveFlag::Protect => self.protect,
            MoveFlag::Reflectable => self.reflectable,
            MoveFlag::Sound => self.sound,
            MoveFlag::Punch => self.punch,
            MoveFlag::Bite => self.bite,
            MoveFlag::Slicing => self.slicing,
            MoveFlag::Pulse => self.pulse,
            MoveFlag::Heal => self.heal,
            MoveFlag::Charge => self.charge,
            MoveFlag::Recharge => self.recharge,
            MoveFlag::Defrost => self.defrost,
            MoveFlag::Bullet => self.bullet,
        }
    }
}

/// A chance-based rider attached to a damaging move.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Secondary {
    /// Percent chance; 100 is guaranteed.
    pub chance: u8,
    pub status: Option<Status>,
    pub volatile: Option<Volatile>,
    pub boosts: BTreeMap<Stat, i8>,
    pub self_boosts: BTreeMap<Stat, i8>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectKind {
    #[default]
    Plain,
    KingsShield,
    SpikyShield,
    BanefulBunker,
    Obstruct,
    SilkTrap,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChange {
    Weather(Weather),
    Terrain(Terrain),
    TrickRoom,
    Tailwind,
    Reflect,
    LightScreen,
    AuroraVeil,
    Safeguard,
    Mist,
    Gravity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    StealthRock,
    Spikes,
    ToxicSpikes,
    StickyWeb,
}

impl HazardKind {
    pub fn max_layers(self) -> u8 {
        match self {
            HazardKind::Spikes => 3,
            HazardKind::ToxicSpikes => 2,
            HazardKind::StealthRock | HazardKind::StickyWeb => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomHandler {
    Transform,
    Metronome,
    Haze,
    Rest,
    PainSplit,
    BellyDrum,
}

/// Behavior of a status move, dispatched by kind.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveEffect {
    Status {
        status: Status,
    },
    Volatile {
        volatile: Volatile,
        #[serde(default)]
        target_self: bool,
        #[serde(default)]
        protect: Option<ProtectKind>,
    },
    Boost {
        boosts: BTreeMap<Stat, i8>,
        #[serde(default)]
        target_self: bool,
    },
    Field {
        change: FieldChange,
    },
    Hazard {
        hazard: HazardKind,
    },
    Custom {
        handler: CustomHandler,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MoveData {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    pub category: MoveCategory,
    pub power: u16,
    /// `None` never misses.
    pub accuracy: Option<u8>,
    pub priority: i8,
    pub crit_stage: u8,
    pub flags: MoveFlags,
    /// Inclusive hit range, e.g. `[2, 5]`.
    pub multihit: Option<[u8; 2]>,
    /// Fraction of damage dealt taken back as recoil.
    pub recoil: Option<f32>,
    /// Fraction of damage dealt restored to the user.
    pub drain: Option<f32>,
    /// Fraction of max HP restored to the user by a status move.
    pub heal: Option<f32>,
    pub self_switch: bool,
    pub force_switch: bool,
    pub ohko: bool,
    pub first_turn_only: bool,
    /// The user is out of reach while charging.
    pub semi_invulnerable: bool,
    /// Skips the charge turn under this weather.
    pub charge_weather: Option<Weather>,
    pub fixed_damage: Option<u16>,
    pub level_damage: bool,
    /// The user faints after using the move.
    pub self_destruct: bool,
    /// Fraction of the user's max HP lost after use.
    pub self_damage: Option<f32>,
    pub secondaries: Vec<Secondary>,
    pub self_boosts: BTreeMap<Stat, i8>,
    pub effect: Option<MoveEffect>,
    /// Conditional power or damage multipliers carried by the move itself.
    pub modifiers: BTreeMap<Hook, f32>,
    pub condition: Condition,
}

impl MoveData {
    pub fn new(name: impl Into<String>, move_type: Type, category: MoveCategory, power: u16) -> Self {
        Self {
            name: name.into(),
            move_type,
            category,
            power,
            accuracy: Some(100),
            flags: MoveFlags {
                protect: true,
                contact: matches!(category, MoveCategory::Physical),
                ..MoveFlags::default()
            },
            ..Self::default()
        }
    }

    pub fn status(name: impl Into<String>, move_type: Type, effect: MoveEffect) -> Self {
        let mut data = Self::new(name, move_type, MoveCategory::Status, 0);
        data.accuracy = None;
        data.effect = Some(effect);
        data
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_accuracy(mut self, accuracy: Option<u8>) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_secondary(mut self, secondary: Secondary) -> Self {
        self.secondaries.push(secondary);
        self
    }

    pub fn with_flags(mut self, flags: MoveFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_damaging(&self) -> bool {
        self.category.is_damaging()
    }

    pub fn has_secondaries(&self) -> bool {
        !self.secondaries.is_empty()
    }

    pub fn is_protection(&self) -> bool {
        matches!(
            self.effect,
            Some(MoveEffect::Volatile {
                volatile: Volatile::Protect,
                ..
            })
        )
    }

    /// Primary ailment a status move inflicts on its target.
    pub fn inflicted_status(&self) -> Option<Status> {
        match &self.effect {
            Some(MoveEffect::Status { status }) => Some(*status),
            _ => None,
        }
    }
}
