//! Rule tables for moves, abilities and items.

pub mod effects;
pub mod moves;
pub mod types;

use effects::EffectData;
use moves::MoveData;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised at the data boundary.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed decision '{0}'")]
    Decision(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

static EMPTY_MOVE: Lazy<MoveData> = Lazy::new(MoveData::default);
static EMPTY_EFFECT: Lazy<EffectData> = Lazy::new(EffectData::default);

/// Lowercase ASCII alphanumerics only: "King's Shield" -> "kingsshield".
pub fn normalize_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The neutral ability/item record.
pub fn empty_effect() -> &'static EffectData {
    &*EMPTY_EFFECT
}

/// Read-only rule catalog injected into the engine.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleData {
    moves: HashMap<String, MoveData>,
    abilities: HashMap<String, EffectData>,
    items: HashMap<String, EffectData>,
}

impl RuleData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RuleData = serde_json::from_str(text)?;
        Ok(raw.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn normalized(self) -> Self {
        let mut out = RuleData::default();
        for (key, mut data) in self.moves {
            if data.name.is_empty() {
                data.name = key.clone();
            }
            out.moves.insert(normalize_id(&key), data);
        }
        for (key, mut data) in self.abilities {
            if data.name.is_empty() {
                data.name = key.clone();
            }
            out.abilities.insert(normalize_id(&key), data);
        }
        for (key, mut data) in self.items {
            if data.name.is_empty() {
                data.name = key.clone();
            }
            out.items.insert(normalize_id(&key), data);
        }
        out
    }

    pub fn with_move(mut self, data: MoveData) -> Self {
        self.moves.insert(normalize_id(&data.name), data);
        self
    }

    pub fn with_ability(mut self, data: EffectData) -> Self {
        self.abilities.insert(normalize_id(&data.name), data);
        self
    }

    pub fn with_item(mut self, data: EffectData) -> Self {
        self.items.insert(normalize_id(&data.name), data);
        self
    }

    pub fn find_move(&self, name: &str) -> Option<&MoveData> {
        self.moves.get(&normalize_id(name))
    }

    /// Missing moves resolve to an inert zero-power status record.
    pub fn move_data(&self, name: &str) -> &MoveData {
        match self.find_move(name) {
            Some(data) => data,
            None => {
                tracing::debug!(name, "no move record, using inert fallback");
                &*EMPTY_MOVE
            }
        }
    }

    pub fn ability(&self, name: &str) -> &EffectData {
        self.abilities.get(&normalize_id(name)).unwrap_or(&*EMPTY_EFFECT)
    }

    pub fn item(&self, name: &str) -> &EffectData {
        self.items.get(&normalize_id(name)).unwrap_or(&*EMPTY_EFFECT)
    }

    /// Normalized move ids in a stable order.
    pub fn move_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.moves.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::effects::Hook;
    use crate::data::moves::MoveCategory;
    use crate::data::types::Type;

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_id("King's Shield"), "kingsshield");
        assert_eq!(normalize_id("U-turn"), "uturn");
        assert_eq!(normalize_id("Will-O-Wisp"), "willowisp");
    }

    #[test]
    fn missing_records_are_neutral() {
        let rules = RuleData::new();
        let mv = rules.move_data("Nonexistent Move");
        assert_eq!(mv.power, 0);
        assert_eq!(mv.category, MoveCategory::Status);
        assert!(mv.effect.is_none());
        assert!(rules.ability("Mystery").modifiers.is_empty());
        assert!(rules.item("Mystery").residual_heal.is_none());
    }

    #[test]
    fn json_keys_are_normalized() {
        let text = r#"{
            "moves": {
                "Thunder Punch": { "type": "Electric", "category": "Physical", "power": 75, "accuracy": 100,
                    "flags": { "contact": true, "punch": true, "protect": true },
                    "secondaries": [ { "chance": 10, "status": "par" } ] }
            },
            "abilities": {
                "Iron Fist": { "modifiers": { "base_power": 1.2 }, "condition": { "flag": "punch" } }
            },
            "items": {
                "Leftovers": { "residual_heal": 0.0625 }
            }
        }"#;
        let rules = RuleData::from_json_str(text).expect("rules parse");
        let punch = rules.move_data("thunderpunch");
        assert_eq!(punch.move_type, Type::Electric);
        assert_eq!(punch.name, "Thunder Punch");
        assert_eq!(punch.secondaries[0].chance, 10);
        assert_eq!(rules.ability("iron-fist").modifiers.get(&Hook::BasePower), Some(&1.2));
        assert_eq!(rules.item("LEFTOVERS").residual_heal, Some(0.0625));
    }
}
