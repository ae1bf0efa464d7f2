use crate::data::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MOVE_TAG: &str = "Move: ";
pub const SWITCH_TAG: &str = "Switch: ";
pub const STRUGGLE: &str = "Struggle";

/// A chosen action. Crosses the boundary as `"Move: <name>"` or `"Switch: <target>"`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Decision {
    UseMove(String),
    Switch(String),
}

impl Decision {
    pub fn use_move(name: impl Into<String>) -> Self {
        Decision::UseMove(name.into())
    }

    pub fn switch(target: impl Into<String>) -> Self {
        Decision::Switch(target.into())
    }

    pub fn struggle() -> Self {
        Decision::UseMove(STRUGGLE.to_string())
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Decision::Switch(_))
    }

    pub fn move_name(&self) -> Option<&str> {
        match self {
            Decision::UseMove(name) => Some(name),
            Decision::Switch(_) => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::UseMove(name) => write!(f, "{MOVE_TAG}{name}"),
            Decision::Switch(target) => write!(f, "{SWITCH_TAG}{target}"),
        }
    }
}

impl FromStr for Decision {
    type Err = DataError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix(MOVE_TAG) {
            return Ok(Decision::UseMove(name.trim().to_string()));
        }
        if let Some(target) = text.strip_prefix(SWITCH_TAG) {
            return Ok(Decision::Switch(target.trim().to_string()));
        }
        Err(DataError::Decision(text.to_string()))
    }
}

impl TryFrom<String> for Decision {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Decision> for String {
    fn from(value: Decision) -> Self {
        value.to_string()
    }
}
