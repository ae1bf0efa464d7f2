//! Battle state and the mechanics that advance it.

pub mod battle;
pub mod combatant;
pub mod damage;
pub mod decision;
pub mod field;
pub mod moves;
pub mod resolver;
pub mod stats;
pub mod switching;
pub(crate) mod turn;

pub use battle::{BattleState, Party, Side};
pub use combatant::{Combatant, Status, Volatile};
pub use decision::Decision;
pub use field::Field;
