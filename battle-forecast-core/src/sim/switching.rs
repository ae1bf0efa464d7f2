use crate::battle_log::BattleLog;
use crate::data::effects::{ExtendTarget, StatDropReaction};
use crate::data::moves::HazardKind;
use crate::data::types::{type_effectiveness, Type};
use crate::data::RuleData;
use crate::sim::battle::{BattleState, Party, Side};
use crate::sim::combatant::{Status, Volatile};
use crate::sim::field::WEATHER_TURNS;
use crate::sim::resolver::ailment::{inflict_status, StatusAttempt};
use crate::sim::resolver::boosts::{apply_boosts, BoostSource};
use crate::sim::resolver::residual::trigger_pinch_item;
use crate::sim::resolver::{ability_of, is_grounded, item_of, refresh_weather_suppression};
use crate::sim::stats::Stat;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwitchKind {
    /// Chosen as the turn's action.
    Voluntary,
    /// Replacing a fainted or pivoting active.
    Forced,
    /// Pulled in by an opposing move.
    Drag,
}

/// The active cannot leave by choice: bound, or facing a trapping ability.
/// Ghost-types always escape.
pub fn is_trapped(state: &BattleState, side: Side, rules: &RuleData) -> bool {
    let mon = state.active(side);
    if mon.has_type(Type::Ghost) {
        return false;
    }
    if mon.has_volatile(Volatile::PartiallyTrapped) {
        return true;
    }
    let foe = state.active(side.opponent());
    !foe.is_fainted() && ability_of(foe, rules).traps_opponent
}

pub fn pick_random_switch(party: &Party, rng: &mut SmallRng) -> Option<usize> {
    let options: Vec<usize> = party.bench().map(|(idx, _)| idx).collect();
    if options.is_empty() {
        return None;
    }
    Some(options[rng.gen_range(0..options.len())])
}

/// Swaps `target` in for `side`'s active, then runs entry hazards and
/// on-entry abilities for the newcomer.
pub fn perform_switch(
    state: &mut BattleState,
    side: Side,
    target: usize,
    kind: SwitchKind,
    rules: &RuleData,
    rng: &mut SmallRng,
    log: &mut BattleLog,
) {
    let outgoing = state.active_mut(side);
    if !outgoing.is_fainted() {
        let ability = ability_of(outgoing, rules);
        if let Some(ratio) = ability.switch_out_heal {
            let amount = outgoing.fraction_of_max(ratio);
            outgoing.heal(amount);
        }
        if ability.switch_out_cure {
            outgoing.clear_status();
        }
    }
    outgoing.clear_switch_state();
    let outgoing_name = outgoing.species.clone();

    state.party_mut(side).active = target;
    let incoming_name = state.active(side).species.clone();
    match kind {
        SwitchKind::Drag => log.push(format!("[{}] {incoming_name} was dragged out!", side.label())),
        SwitchKind::Voluntary | SwitchKind::Forced => log.log_switch(side, &outgoing_name, &incoming_name),
    }
    tracing::debug!(side = side.label(), from = %outgoing_name, to = %incoming_name, ?kind, "switch");

    apply_entry_hazards(state, side, rules, rng, log);
    if !state.active(side).is_fainted() {
        apply_entry_abilities(state, side, rules, log);
    }
    let [player, ai] = &state.parties;
    refresh_weather_suppression(&mut state.field, [player.active(), ai.active()], rules);
}

fn apply_entry_hazards(state: &mut BattleState, side: Side, rules: &RuleData, rng: &mut SmallRng, log: &mut BattleLog) {
    let field = state.field.clone();
    let conditions = &field.sides[side.index()];
    if conditions.hazards.is_empty() {
        return;
    }
    let grounded = is_grounded(state.active(side), &field, rules);
    let guarded = ability_of(state.active(side), rules).no_indirect_damage;

    if conditions.layers(HazardKind::StealthRock) > 0 && !guarded {
        let mon = state.active_mut(side);
        let effectiveness = type_effectiveness(Type::Rock, &mon.types);
        if effectiveness > 0.0 {
            let amount = mon.fraction_of_max(effectiveness / 8.0);
            let dealt = mon.take_damage(amount);
            log.push(format!("Pointed stones dug into {}!", mon.species));
            log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }
    }
    if grounded {
        let spikes = conditions.layers(HazardKind::Spikes);
        let mon = state.active_mut(side);
        if spikes > 0 && !guarded && !mon.is_fainted() {
            let ratio = match spikes {
                1 => 1.0 / 8.0,
                2 => 1.0 / 6.0,
                _ => 1.0 / 4.0,
            };
            let dealt = mon.take_damage(mon.fraction_of_max(ratio));
            log.push(format!("{} is hurt by the spikes!", mon.species));
            log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }

        let toxic_spikes = conditions.layers(HazardKind::ToxicSpikes);
        if toxic_spikes > 0 && !state.active(side).is_fainted() {
            if state.active(side).has_type(Type::Poison) {
                log.push(format!("{} absorbed the toxic spikes!", state.active(side).species));
                state.field.sides[side.index()].hazards.remove(&HazardKind::ToxicSpikes);
            } else {
                let status = if toxic_spikes >= 2 { Status::Toxic } else { Status::Poison };
                let attempt = StatusAttempt {
                    from_opponent: true,
                    ignores_abilities: false,
                };
                inflict_status(state.active_mut(side), status, side, &field, attempt, rules, rng, log);
            }
        }

        if conditions.layers(HazardKind::StickyWeb) > 0 && !state.active(side).is_fainted() {
            let mist = conditions.mist > 0;
            let mon = state.active_mut(side);
            log.push(format!("{} was caught in a sticky web!", mon.species));
            let drop: BTreeMap<Stat, i8> = [(Stat::Spe, -1)].into_iter().collect();
            let outcome = apply_boosts(mon, &drop, BoostSource::Opponent, mist, rules, log);
            if let Some(reaction) = outcome.reaction {
                apply_stat_drop_reaction(state, side, reaction, rules, log);
            }
        }
    }
    let mon = state.active(side);
    if mon.is_fainted() {
        log.log_faint(&mon.species);
    }
}

fn apply_entry_abilities(state: &mut BattleState, side: Side, rules: &RuleData, log: &mut BattleLog) {
    let mon = state.active(side);
    let ability = ability_of(mon, rules);
    let species = mon.species.clone();

    if let Some(weather) = ability.weather_on_entry {
        let extension = match item_of(mon, rules).extends {
            Some(ext) if ext.target == ExtendTarget::Weather(weather) => ext.turns,
            _ => 0,
        };
        if state.field.set_weather(weather, WEATHER_TURNS + extension) {
            log.push(format!("{species}'s {} summoned the {weather}!", ability.name));
        }
    }

    if !ability.entry_boosts_opponent.is_empty() {
        let foe_side = side.opponent();
        let mist = state.field.sides[foe_side.index()].mist > 0;
        let foe = state.active_mut(foe_side);
        if !foe.is_fainted() {
            log.push(format!("{species}'s {} affects {}!", ability.name, foe.species));
            let outcome = apply_boosts(foe, &ability.entry_boosts_opponent, BoostSource::Opponent, mist, rules, log);
            if let Some(reaction) = outcome.reaction {
                apply_stat_drop_reaction(state, foe_side, reaction, rules, log);
            }
        }
    }
    trigger_pinch_item(state.active_mut(side), rules, log);
}

/// Resolves a held item's reaction to lowered stats. A switch-out is queued
/// through `must_switch` and happens in the next forced-switch phase.
pub fn apply_stat_drop_reaction(
    state: &mut BattleState,
    side: Side,
    reaction: StatDropReaction,
    rules: &RuleData,
    log: &mut BattleLog,
) {
    let has_replacement = state.party(side).has_replacement();
    let mon = state.active_mut(side);
    if mon.is_fainted() {
        return;
    }
    let item_name = item_of(mon, rules).name.clone();
    match reaction {
        StatDropReaction::RestoreStages => {
            for stat in Stat::ALL {
                if mon.stage(stat) < 0 {
                    mon.stages.set(stat, 0);
                }
            }
            log.push(format!("{} returned its stats to normal using its {item_name}!", mon.species));
        }
        StatDropReaction::SwitchOut => {
            if !has_replacement {
                return;
            }
            mon.must_switch = true;
            log.push(format!("{} is switched out by its {item_name}!", mon.species));
        }
    }
    mon.consume_item();
}
