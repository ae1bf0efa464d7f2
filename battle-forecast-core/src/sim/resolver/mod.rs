//! Modifier resolution shared by the engine and the scoring model.
//!
//! Every "does this ability/item apply right now" decision goes through
//! [`modifier::condition_applies`]. The other modules build on it: effective
//! stats, boosts, accuracy and the residual passes that bracket each turn.

pub mod accuracy;
pub mod ailment;
pub mod boosts;
pub mod modifier;
pub mod residual;
pub mod stat;

pub use accuracy::{check_accuracy, hit_chance};
pub use ailment::{inflict_status, status_blocked, StatusAttempt};
pub use boosts::{apply_boosts, BoostOutcome, BoostSource};
pub use modifier::{
    condition_applies, field_damage_modifier, hook_value, modifier, ConditionContext, MoveContext, Role,
};
pub use residual::{end_of_turn, start_of_turn, trigger_pinch_item};
pub use stat::{effective_speed, effective_stat};

use crate::data::effects::EffectData;
use crate::data::types::Type;
use crate::data::{empty_effect, RuleData};
use crate::sim::combatant::{Combatant, Volatile};
use crate::sim::field::Field;

/// The combatant's ability record, neutral while suppressed.
pub fn ability_of<'r>(mon: &Combatant, rules: &'r RuleData) -> &'r EffectData {
    if mon.ability_suppressed {
        return empty_effect();
    }
    rules.ability(&mon.ability)
}

/// The held item record, neutral when consumed or disabled by the ability.
pub fn item_of<'r>(mon: &Combatant, rules: &'r RuleData) -> &'r EffectData {
    if ability_of(mon, rules).disables_items {
        return empty_effect();
    }
    match mon.held_item() {
        Some(item) => rules.item(item),
        None => empty_effect(),
    }
}

/// Ability then item, the order every pipeline step visits them in.
pub fn effects_of<'r>(mon: &Combatant, rules: &'r RuleData) -> [&'r EffectData; 2] {
    [ability_of(mon, rules), item_of(mon, rules)]
}

pub fn is_grounded(mon: &Combatant, field: &Field, rules: &RuleData) -> bool {
    if field.gravity_active() || mon.has_volatile(Volatile::Ingrain) {
        return true;
    }
    if mon.has_type(Type::Flying) || mon.has_volatile(Volatile::MagnetRise) {
        return false;
    }
    !effects_of(mon, rules)
        .iter()
        .any(|effect| effect.type_immunities.contains(&Type::Ground))
}

/// Weather negation follows whichever actives are on the field.
pub fn refresh_weather_suppression(field: &mut Field, actives: [&Combatant; 2], rules: &RuleData) {
    field.weather_suppressed = actives
        .iter()
        .any(|mon| !mon.is_fainted() && ability_of(mon, rules).suppresses_weather);
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::data::types::Type;
    use crate::sim::combatant::Combatant;
    use crate::sim::stats::StatBlock;

    pub fn make_mon(types: Vec<Type>) -> Combatant {
        Combatant::new("Testmon", 50, types, StatBlock::new(160, 100, 100, 100, 100, 100))
            .with_moves(["Tackle"])
    }
}
