use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Battle stats that carry a stage. Accuracy and evasion use their own scale.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    #[serde(alias = "acc")]
    Accuracy,
    #[serde(alias = "eva")]
    Evasion,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Atk,
        Stat::Def,
        Stat::Spa,
        Stat::Spd,
        Stat::Spe,
        Stat::Accuracy,
        Stat::Evasion,
    ];

    fn index(self) -> usize {
        match self {
            Stat::Atk => 0,
            Stat::Def => 1,
            Stat::Spa => 2,
            Stat::Spd => 3,
            Stat::Spe => 4,
            Stat::Accuracy => 5,
            Stat::Evasion => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stat::Atk => "Attack",
            Stat::Def => "Defense",
            Stat::Spa => "Sp. Atk",
            Stat::Spd => "Sp. Def",
            Stat::Spe => "Speed",
            Stat::Accuracy => "accuracy",
            Stat::Evasion => "evasiveness",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw (unstaged) stat values of a combatant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
pub struct StatBlock {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spa: u16,
    pub spd: u16,
    pub spe: u16,
}

impl StatBlock {
    pub fn new(hp: u16, atk: u16, def: u16, spa: u16, spd: u16, spe: u16) -> Self {
        Self {
            hp,
            atk,
            def,
            spa,
            spd,
            spe,
        }
    }

    /// Accuracy and evasion have no raw value; they resolve to 1.
    pub fn get(&self, stat: Stat) -> u16 {
        match stat {
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
            Stat::Accuracy | Stat::Evasion => 1,
        }
    }
}

/// Seven independently clamped stage values in [-6, 6].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(from = "BTreeMap<Stat, i8>", into = "BTreeMap<Stat, i8>")]
pub struct Stages([i8; 7]);

pub const STAGE_MIN: i8 = -6;
pub const STAGE_MAX: i8 = 6;

impl Stages {
    pub fn get(&self, stat: Stat) -> i8 {
        self.0[stat.index()]
    }

    /// Stores `value` clamped to the legal range and returns what was stored.
    pub fn set(&mut self, stat: Stat, value: i8) -> i8 {
        let clamped = value.clamp(STAGE_MIN, STAGE_MAX);
        self.0[stat.index()] = clamped;
        clamped
    }

    pub fn reset(&mut self) {
        self.0 = [0; 7];
    }

    pub fn has_positive(&self) -> bool {
        self.0.iter().any(|s| *s > 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i8)> + '_ {
        Stat::ALL.iter().map(move |stat| (*stat, self.get(*stat)))
    }
}

impl From<BTreeMap<Stat, i8>> for Stages {
    fn from(map: BTreeMap<Stat, i8>) -> Self {
        let mut stages = Stages::default();
        for (stat, value) in map {
            stages.set(stat, value);
        }
        stages
    }
}

impl From<Stages> for BTreeMap<Stat, i8> {
    fn from(stages: Stages) -> Self {
        stages.iter().filter(|(_, v)| *v != 0).collect()
    }
}

pub fn stage_multiplier(stage: i8) -> f32 {
    if stage >= 0 {
        (2 + stage as i32) as f32 / 2.0
    } else {
        2.0 / (2 - stage as i32) as f32
    }
}

pub fn accuracy_multiplier(stage: i8) -> f32 {
    if stage >= 0 {
        (3 + stage as i32) as f32 / 3.0
    } else {
        3.0 / (3 - stage as i32) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_clamp_on_set() {
        let mut stages = Stages::default();
        assert_eq!(stages.set(Stat::Atk, 9), 6);
        assert_eq!(stages.set(Stat::Evasion, -8), -6);
        assert_eq!(stages.get(Stat::Atk), 6);
    }

    #[test]
    fn stage_tables_match_fractions() {
        assert_eq!(stage_multiplier(2), 2.0);
        assert_eq!(stage_multiplier(-2), 0.5);
        assert!((accuracy_multiplier(-3) - 0.5).abs() < f32::EPSILON);
        assert!((accuracy_multiplier(6) - 3.0).abs() < f32::EPSILON);
    }
}
