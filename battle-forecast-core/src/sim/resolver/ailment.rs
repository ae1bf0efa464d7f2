use crate::battle_log::BattleLog;
use crate::data::RuleData;
use crate::sim::battle::Side;
use crate::sim::combatant::{Combatant, Status};
use crate::sim::field::{Field, Terrain};
use crate::sim::resolver::{ability_of, is_grounded, item_of};
use rand::rngs::SmallRng;

/// Who is trying to inflict an ailment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusAttempt {
    pub from_opponent: bool,
    pub ignores_abilities: bool,
}

impl StatusAttempt {
    /// Orbs, Rest and other self-inflicted ailments.
    pub const OWN: StatusAttempt = StatusAttempt {
        from_opponent: false,
        ignores_abilities: false,
    };

    pub fn by(attacker: &Combatant, rules: &RuleData) -> Self {
        Self {
            from_opponent: true,
            ignores_abilities: ability_of(attacker, rules).ignores_abilities,
        }
    }
}

/// Whether anything other than an existing ailment would stop `status`.
pub fn status_blocked(
    target: &Combatant,
    status: Status,
    target_side: Side,
    field: &Field,
    attempt: StatusAttempt,
    rules: &RuleData,
) -> bool {
    if target.is_fainted() || target.type_blocks_status(status) {
        return true;
    }
    let immune = |effect: &crate::data::effects::EffectData| {
        effect.immune_to_status(status) || (status == Status::Toxic && effect.immune_to_status(Status::Poison))
    };
    if !attempt.ignores_abilities && immune(ability_of(target, rules)) {
        return true;
    }
    if immune(item_of(target, rules)) {
        return true;
    }
    if attempt.from_opponent && field.sides[target_side.index()].safeguard > 0 {
        return true;
    }
    if is_grounded(target, field, rules) {
        match field.terrain {
            Some(Terrain::Misty) => return true,
            Some(Terrain::Electric) if status == Status::Sleep => return true,
            _ => {}
        }
    }
    false
}

/// Single entry point for primary ailments. Logs only on success.
pub fn inflict_status(
    target: &mut Combatant,
    status: Status,
    target_side: Side,
    field: &Field,
    attempt: StatusAttempt,
    rules: &RuleData,
    rng: &mut SmallRng,
    log: &mut BattleLog,
) -> bool {
    if target.status.is_some() || status_blocked(target, status, target_side, field, attempt, rules) {
        return false;
    }
    if !target.apply_status(status, rng) {
        return false;
    }
    log.log_status(&target.species, status.label());
    true
}
