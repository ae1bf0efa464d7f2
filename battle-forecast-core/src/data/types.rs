use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
    /// Used for typeless damage such as confusion self-hits.
    Typeless,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Normal => "Normal",
            Type::Fire => "Fire",
            Type::Water => "Water",
            Type::Electric => "Electric",
            Type::Grass => "Grass",
            Type::Ice => "Ice",
            Type::Fighting => "Fighting",
            Type::Poison => "Poison",
            Type::Ground => "Ground",
            Type::Flying => "Flying",
            Type::Psychic => "Psychic",
            Type::Bug => "Bug",
            Type::Rock => "Rock",
            Type::Ghost => "Ghost",
            Type::Dragon => "Dragon",
            Type::Dark => "Dark",
            Type::Steel => "Steel",
            Type::Fairy => "Fairy",
            Type::Typeless => "???",
        }
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::Typeless
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Type {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_type(&value).ok_or_else(|| format!("unknown type '{value}'"))
    }
}

impl From<Type> for String {
    fn from(value: Type) -> Self {
        value.name().to_string()
    }
}

pub fn parse_type(name: &str) -> Option<Type> {
    match name.to_ascii_lowercase().as_str() {
        "normal" => Some(Type::Normal),
        "fire" => Some(Type::Fire),
        "water" => Some(Type::Water),
        "electric" => Some(Type::Electric),
        "grass" => Some(Type::Grass),
        "ice" => Some(Type::Ice),
        "fighting" => Some(Type::Fighting),
        "poison" => Some(Type::Poison),
        "ground" => Some(Type::Ground),
        "flying" => Some(Type::Flying),
        "psychic" => Some(Type::Psychic),
        "bug" => Some(Type::Bug),
        "rock" => Some(Type::Rock),
        "ghost" => Some(Type::Ghost),
        "dragon" => Some(Type::Dragon),
        "dark" => Some(Type::Dark),
        "steel" => Some(Type::Steel),
        "fairy" => Some(Type::Fairy),
        "typeless" | "???" => Some(Type::Typeless),
        _ => None,
    }
}

/// Product of single-type multipliers against every defending type.
pub fn type_effectiveness(move_type: Type, target_types: &[Type]) -> f32 {
    target_types
        .iter()
        .map(|defending| single_type_effectiveness(move_type, *defending))
        .product()
}

pub fn single_type_effectiveness(attacking: Type, defending: Type) -> f32 {
    use Type::*;
    match attacking {
        Normal => match defending {
            Rock | Steel => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Fire => match defending {
            Fire | Water | Rock | Dragon => 0.5,
            Grass | Ice | Bug | Steel => 2.0,
            _ => 1.0,
        },
        Water => match defending {
            Water | Grass | Dragon => 0.5,
            Fire | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Electric => match defending {
            Electric | Grass | Dragon => 0.5,
            Water | Flying => 2.0,
            Ground => 0.0,
            _ => 1.0,
        },
        Grass => match defending {
            Fire | Grass | Poison | Flying | Bug | Dragon | Steel => 0.5,
            Water | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Ice => match defending {
            Fire | Water | Ice | Steel => 0.5,
            Grass | Ground | Flying | Dragon => 2.0,
            _ => 1.0,
        },
        Fighting => match defending {
            Normal | Ice | Rock | Dark | Steel => 2.0,
            Poison | Flying | Psychic | Bug | Fairy => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Poison => match defending {
            Grass | Fairy => 2.0,
            Poison | Ground | Rock | Ghost => 0.5,
            Steel => 0.0,
            _ => 1.0,
        },
        Ground => match defending {
            Fire | Electric | Poison | Rock | Steel => 2.0,
            Grass | Bug => 0.5,
            Flying => 0.0,
            _ => 1.0,
        },
        Flying => match defending {
            Grass | Fighting | Bug => 2.0,
            Electric | Rock | Steel => 0.5,
            _ => 1.0,
        },
        Psychic => match defending {
            Fighting | Poison => 2.0,
            Psychic | Steel => 0.5,
            Dark => 0.0,
            _ => 1.0,
        },
        Bug => match defending {
            Grass | Psychic | Dark => 2.0,
            Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy => 0.5,
            _ => 1.0,
        },
        Rock => match defending {
            Fire | Ice | Flying | Bug => 2.0,
            Fighting | Ground | Steel => 0.5,
            _ => 1.0,
        },
        Ghost => match defending {
            Ghost | Psychic => 2.0,
            Dark => 0.5,
            Normal => 0.0,
            _ => 1.0,
        },
        Dragon => match defending {
            Dragon => 2.0,
            Steel => 0.5,
            Fairy => 0.0,
            _ => 1.0,
        },
        Dark => match defending {
            Psychic | Ghost => 2.0,
            Fighting | Dark | Fairy => 0.5,
            _ => 1.0,
        },
        Steel => match defending {
            Rock | Ice | Fairy => 2.0,
            Fire | Water | Electric | Steel => 0.5,
            _ => 1.0,
        },
        Fairy => match defending {
            Fighting | Dragon | Dark => 2.0,
            Fire | Poison | Steel => 0.5,
            _ => 1.0,
        },
        Typeless => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_type_multipliers_stack() {
        assert_eq!(type_effectiveness(Type::Ice, &[Type::Dragon, Type::Ground]), 4.0);
        assert_eq!(type_effectiveness(Type::Electric, &[Type::Water, Type::Ground]), 0.0);
        assert_eq!(type_effectiveness(Type::Fire, &[Type::Water, Type::Rock]), 0.25);
    }

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!(parse_type("FIRE"), Some(Type::Fire));
        assert_eq!(parse_type("fairy"), Some(Type::Fairy));
        assert_eq!(parse_type("Shadow"), None);
    }
}
