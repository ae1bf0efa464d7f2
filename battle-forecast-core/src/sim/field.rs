use crate::data::moves::{HazardKind, ProtectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sun,
    Rain,
    Sand,
    #[serde(alias = "snow")]
    Hail,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Weather::Sun => "harsh sunlight",
            Weather::Rain => "rain",
            Weather::Sand => "sandstorm",
            Weather::Hail => "hail",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Electric,
    Grassy,
    Misty,
    Psychic,
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Terrain::Electric => "Electric Terrain",
            Terrain::Grassy => "Grassy Terrain",
            Terrain::Misty => "Misty Terrain",
            Terrain::Psychic => "Psychic Terrain",
        };
        f.write_str(label)
    }
}

pub const WEATHER_TURNS: u8 = 5;
pub const TERRAIN_TURNS: u8 = 5;
pub const SCREEN_TURNS: u8 = 5;
pub const ROOM_TURNS: u8 = 5;
pub const TAILWIND_TURNS: u8 = 4;

/// Per-side hazards, screens and timers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct SideConditions {
    pub hazards: BTreeMap<HazardKind, u8>,
    pub tailwind: u8,
    pub reflect: u8,
    pub light_screen: u8,
    pub aurora_veil: u8,
    pub safeguard: u8,
    pub mist: u8,
}

impl SideConditions {
    pub fn layers(&self, hazard: HazardKind) -> u8 {
        self.hazards.get(&hazard).copied().unwrap_or(0)
    }

    /// Adds one layer. Returns false without changing anything at the cap.
    pub fn add_hazard(&mut self, hazard: HazardKind) -> bool {
        let layers = self.layers(hazard);
        if layers >= hazard.max_layers() {
            return false;
        }
        self.hazards.insert(hazard, layers + 1);
        true
    }

    pub fn clear_hazards(&mut self) {
        self.hazards.clear();
    }

    pub fn has_physical_screen(&self) -> bool {
        self.reflect > 0 || self.aurora_veil > 0
    }

    pub fn has_special_screen(&self) -> bool {
        self.light_screen > 0 || self.aurora_veil > 0
    }

    /// Decrements every running timer once and returns the ones that ran out.
    pub fn tick(&mut self) -> Vec<&'static str> {
        let mut expired = Vec::new();
        for (timer, label) in [
            (&mut self.tailwind, "tailwind"),
            (&mut self.reflect, "reflect"),
            (&mut self.light_screen, "light screen"),
            (&mut self.aurora_veil, "aurora veil"),
            (&mut self.safeguard, "safeguard"),
            (&mut self.mist, "mist"),
        ] {
            if *timer > 0 {
                *timer -= 1;
                if *timer == 0 {
                    expired.push(label);
                }
            }
        }
        expired
    }
}

/// State shared by both sides. A weather or terrain with a zero timer is
/// treated as permanent.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Field {
    pub weather: Option<Weather>,
    pub weather_turns: u8,
    pub terrain: Option<Terrain>,
    pub terrain_turns: u8,
    pub trick_room: u8,
    pub gravity: u8,
    pub sides: [SideConditions; 2],
    /// Set while an active combatant's ability negates weather.
    pub weather_suppressed: bool,
    /// Which side protected this turn, and how.
    #[serde(skip)]
    pub protected: [Option<ProtectKind>; 2],
}

impl Field {
    /// Weather as it affects battle effects.
    pub fn active_weather(&self) -> Option<Weather> {
        if self.weather_suppressed {
            return None;
        }
        self.weather
    }

    pub fn trick_room_active(&self) -> bool {
        self.trick_room > 0
    }

    pub fn gravity_active(&self) -> bool {
        self.gravity > 0
    }

    pub fn set_weather(&mut self, weather: Weather, turns: u8) -> bool {
        if self.weather == Some(weather) {
            return false;
        }
        self.weather = Some(weather);
        self.weather_turns = turns;
        true
    }

    pub fn set_terrain(&mut self, terrain: Terrain, turns: u8) -> bool {
        if self.terrain == Some(terrain) {
            return false;
        }
        self.terrain = Some(terrain);
        self.terrain_turns = turns;
        true
    }

    pub fn clear_turn_flags(&mut self) {
        self.protected = [None, None];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_spikes_layer_is_a_no_op() {
        let mut side = SideConditions::default();
        for _ in 0..3 {
            assert!(side.add_hazard(HazardKind::Spikes));
        }
        let before = side.clone();
        assert!(!side.add_hazard(HazardKind::Spikes));
        assert_eq!(side, before);
        assert_eq!(side.layers(HazardKind::Spikes), 3);
    }

    #[test]
    fn stealth_rock_has_one_layer() {
        let mut side = SideConditions::default();
        assert!(side.add_hazard(HazardKind::StealthRock));
        assert!(!side.add_hazard(HazardKind::StealthRock));
    }

    #[test]
    fn side_timers_expire_once() {
        let mut side = SideConditions {
            reflect: 1,
            tailwind: 2,
            ..SideConditions::default()
        };
        assert_eq!(side.tick(), vec!["reflect"]);
        assert_eq!(side.tick(), vec!["tailwind"]);
        assert!(side.tick().is_empty());
    }

    #[test]
    fn same_weather_is_redundant() {
        let mut field = Field::default();
        assert!(field.set_weather(Weather::Rain, 5));
        assert!(!field.set_weather(Weather::Rain, 5));
        assert!(field.set_weather(Weather::Sun, 5));
    }
}
