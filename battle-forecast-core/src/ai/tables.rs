//! Named move and ability classes the scorer keys on, by normalized id.

use phf::phf_set;

pub static SPEED_CONTROL: phf::Set<&'static str> = phf_set! {
    "icywind", "electroweb", "rocktomb", "mudshot", "lowsweep", "bulldoze", "glaciate",
};

pub static STAT_DROP: phf::Set<&'static str> = phf_set! {
    "tropkick", "skittersmack", "lunge", "spiritbreak", "snarl", "strugglebug",
    "breakingswipe", "chillingwater", "mysticalfire",
};

/// Abilities that stop the drops above from landing.
pub static DROP_BLOCKERS: phf::Set<&'static str> = phf_set! {
    "contrary", "clearbody", "whitesmoke", "fullmetalbody",
};

pub static COUNTER_MOVES: phf::Set<&'static str> = phf_set! {
    "counter", "mirrorcoat", "metalburst",
};

pub static EXPLOSIONS: phf::Set<&'static str> = phf_set! {
    "explosion", "selfdestruct", "mistyexplosion",
};

/// Damaging moves that never collect the generic kill bonus.
pub static NO_KILL_BONUS: phf::Set<&'static str> = phf_set! {
    "explosion", "selfdestruct", "mistyexplosion", "finalgambit", "rollout",
    "relicsong", "meteorbeam", "futuresight", "doomdesire",
};

pub static KO_BOOST_ABILITIES: phf::Set<&'static str> = phf_set! {
    "moxie", "beastboost", "grimneigh", "chillingneigh",
};

pub static SLEEP_MOVES: phf::Set<&'static str> = phf_set! {
    "yawn", "spore", "sleeppowder", "hypnosis", "darkvoid", "sing", "grasswhistle", "lovelykiss",
};

pub static PARALYSIS_MOVES: phf::Set<&'static str> = phf_set! {
    "thunderwave", "glare", "stunspore",
};

pub static AILMENT_MOVES: phf::Set<&'static str> = phf_set! {
    "thunderwave", "glare", "stunspore", "willowisp", "toxic", "poisongas",
};

pub static PROTECT_MOVES: phf::Set<&'static str> = phf_set! {
    "protect", "detect", "kingsshield", "spikyshield", "banefulbunker", "obstruct", "silktrap",
};

pub static DISRUPT_MOVES: phf::Set<&'static str> = phf_set! {
    "taunt", "encore", "disable", "torment",
};

pub static IDENTIFY_MOVES: phf::Set<&'static str> = phf_set! {
    "odorsleuth", "foresight", "miracleeye",
};

pub static RECOVERY: phf::Set<&'static str> = phf_set! {
    "recover", "slackoff", "healorder", "softboiled", "roost", "strengthsap",
    "morningsun", "synthesis", "moonlight", "milkdrink", "shoreup",
};

/// Recovery that heals more in sun.
pub static SUN_RECOVERY: phf::Set<&'static str> = phf_set! {
    "morningsun", "synthesis", "moonlight",
};

pub static SETUP: phf::Set<&'static str> = phf_set! {
    "swordsdance", "dragondance", "calmmind", "bulkup", "coil", "honeclaws", "workup",
    "nastyplot", "tailglow", "shellsmash", "quiverdance", "noretreat", "agility",
    "rockpolish", "autotomize", "bellydrum", "acidarmor", "barrier", "cottonguard",
    "harden", "irondefense", "stockpile", "cosmicpower", "howl", "growth",
};

/// Setup still worth using into an Unaware target.
pub static UNAWARE_EXCEPTIONS: phf::Set<&'static str> = phf_set! {
    "swordsdance", "howl", "poweruppunch",
};

/// Mixed setup read as defensive against an all-physical target.
pub static PHYSICAL_HYBRID_SETUP: phf::Set<&'static str> = phf_set! {
    "coil", "bulkup", "noretreat",
};

/// Mixed setup read as defensive against an all-special target.
pub static SPECIAL_HYBRID_SETUP: phf::Set<&'static str> = phf_set! {
    "calmmind", "quiverdance",
};

pub static DEFENSIVE_SETUP: phf::Set<&'static str> = phf_set! {
    "acidarmor", "barrier", "cottonguard", "harden", "irondefense", "stockpile", "cosmicpower",
};

pub static SPEED_SETUP: phf::Set<&'static str> = phf_set! {
    "agility", "rockpolish", "autotomize",
};

pub static TRICK_MOVES: phf::Set<&'static str> = phf_set! {
    "trick", "switcheroo",
};

/// Items worth handing to the opponent.
pub static TRICK_ITEMS: phf::Set<&'static str> = phf_set! {
    "toxicorb", "flameorb", "blacksludge", "ironball", "laggingtail", "stickybarb",
};

pub static FLING_HEAVY_ITEMS: phf::Set<&'static str> = phf_set! {
    "ironball", "lightball",
};

pub static FOCUS_MOVES: phf::Set<&'static str> = phf_set! {
    "focusenergy", "laserfocus",
};

pub static CRIT_ABILITIES: phf::Set<&'static str> = phf_set! {
    "superluck", "sniper",
};

pub static CRIT_IMMUNE_ABILITIES: phf::Set<&'static str> = phf_set! {
    "shellarmor", "battlearmor",
};

/// Targets a flinch move cannot touch.
pub static FLINCH_IMMUNE_ABILITIES: phf::Set<&'static str> = phf_set! {
    "innerfocus", "shielddust",
};

pub static SURVIVAL_ABILITIES: phf::Set<&'static str> = phf_set! {
    "sturdy",
};

pub static SURVIVAL_ITEMS: phf::Set<&'static str> = phf_set! {
    "focussash",
};

pub static SCREEN_EXTENDERS: phf::Set<&'static str> = phf_set! {
    "lightclay",
};

pub static TERRAIN_EXTENDERS: phf::Set<&'static str> = phf_set! {
    "terrainextender",
};

pub static CRIT_ITEMS: phf::Set<&'static str> = phf_set! {
    "scopelens", "razorclaw",
};

pub static SLEEP_DEPENDENT: phf::Set<&'static str> = phf_set! {
    "dreameater", "nightmare",
};

pub static DELAYED_ATTACKS: phf::Set<&'static str> = phf_set! {
    "futuresight", "doomdesire",
};

/// True when `name` normalizes into `set`.
pub fn contains(set: &phf::Set<&'static str>, name: &str) -> bool {
    set.contains(crate::data::normalize_id(name).as_str())
}
