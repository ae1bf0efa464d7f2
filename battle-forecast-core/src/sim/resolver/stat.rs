use crate::data::effects::Hook;
use crate::data::RuleData;
use crate::sim::battle::Side;
use crate::sim::combatant::{Combatant, Status};
use crate::sim::field::Field;
use crate::sim::resolver::modifier::{hook_value, ConditionContext};
use crate::sim::resolver::{ability_of, item_of};
use crate::sim::stats::{stage_multiplier, Stat};

/// Stat after stages, ability, item, status and field, floored to at least 1.
///
/// Order is fixed: base, stage, ability hook, item hook, status, field. Reads
/// only its arguments.
pub fn effective_stat(mon: &Combatant, stat: Stat, field: &Field, side: Side, rules: &RuleData) -> u16 {
    let base = mon.stats.get(stat) as f32;
    let mut value = base * stage_multiplier(mon.stage(stat));

    let ctx = ConditionContext::passive(mon, field);
    let hook = Hook::for_stat(stat);
    let ability = ability_of(mon, rules);
    value *= hook_value(ability, hook, &ctx);
    value *= hook_value(item_of(mon, rules), hook, &ctx);

    match (stat, mon.status) {
        (Stat::Atk, Some(Status::Burn)) if !ability.status_stat_exempt => value *= 0.5,
        (Stat::Spe, Some(Status::Paralysis)) if !ability.status_stat_exempt => value *= 0.25,
        _ => {}
    }

    if stat == Stat::Spe && field.sides[side.index()].tailwind > 0 {
        value *= 2.0;
    }
    (value.floor() as u16).max(1)
}

pub fn effective_speed(mon: &Combatant, field: &Field, side: Side, rules: &RuleData) -> u16 {
    effective_stat(mon, Stat::Spe, field, side, rules)
}
