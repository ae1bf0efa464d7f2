//! Passes that bracket each turn: speed-order effects before anyone acts,
//! and the fixed-order residual sweep afterwards.

use crate::battle_log::BattleLog;
use crate::data::effects::SpeedOrder;
use crate::data::types::Type;
use crate::data::RuleData;
use crate::sim::battle::{BattleState, Side};
use crate::sim::combatant::{Combatant, Status, Volatile};
use crate::sim::decision::Decision;
use crate::sim::field::{Field, Terrain, Weather};
use crate::sim::resolver::ailment::{inflict_status, StatusAttempt};
use crate::sim::resolver::boosts::{apply_boosts, BoostSource};
use crate::sim::resolver::modifier::{condition_applies, ConditionContext};
use crate::sim::resolver::stat::effective_speed;
use crate::sim::resolver::{ability_of, effects_of, is_grounded, item_of};
use rand::rngs::SmallRng;
use rand::Rng;

/// Sets each active's once-per-turn speed-order modifier. The ability is
/// checked before the item and the first one that fires wins. Sides that
/// switch get none.
pub fn start_of_turn(
    state: &mut BattleState,
    decisions: [&Decision; 2],
    rules: &RuleData,
    rng: &mut SmallRng,
    log: &mut BattleLog,
) {
    for side in Side::BOTH {
        let mon = state.active_mut(side);
        mon.turn_priority_mod = 0;
        if mon.is_fainted() || decisions[side.index()].is_switch() {
            continue;
        }
        for (effect, is_item) in [(ability_of(mon, rules), false), (item_of(mon, rules), true)] {
            let Some(order) = effect.speed_order else {
                continue;
            };
            let fired = match order {
                SpeedOrder::MoveLast => Some(-1),
                SpeedOrder::Chance { percent } => (rng.gen_range(0..100u8) < percent).then_some(1),
                SpeedOrder::LowHpBerry { threshold } => (mon.hp_fraction() <= threshold).then_some(1),
            };
            let Some(modifier) = fired else {
                continue;
            };
            mon.turn_priority_mod = modifier;
            match order {
                SpeedOrder::MoveLast => {}
                SpeedOrder::Chance { .. } => {
                    log.push(format!("{}'s {} let it move first!", mon.species, effect.name));
                }
                SpeedOrder::LowHpBerry { .. } => {
                    log.push(format!("{} ate its {}! It can move first!", mon.species, effect.name));
                }
            }
            if is_item && effect.single_use {
                mon.consume_item();
            }
            tracing::debug!(species = %mon.species, modifier, "speed-order effect");
            break;
        }
    }
}

/// Residual sweep, in order: field timers, orbs, volatile ticks, weather
/// chip, status damage, passive heal/damage, passive boosts, grassy heal.
/// Actives are visited faster first; fainted ones are skipped throughout.
pub fn end_of_turn(state: &mut BattleState, rules: &RuleData, rng: &mut SmallRng, log: &mut BattleLog) {
    tick_field(&mut state.field, log);
    let order = speed_order(state, rules);

    for side in order {
        let field = state.field.clone();
        let mon = state.active_mut(side);
        if mon.is_fainted() {
            continue;
        }
        let item = item_of(mon, rules);
        if let Some(status) = item.residual_status {
            if inflict_status(mon, status, side, &field, StatusAttempt::OWN, rules, rng, log) && item.single_use {
                mon.consume_item();
            }
        }
    }

    for side in order {
        tick_volatiles(state, side, rules, rng, log);
    }
    for side in order {
        weather_chip(state, side, rules, log);
    }
    for side in order {
        status_damage(state.active_mut(side), rules, log);
    }
    for side in order {
        let field = state.field.clone();
        passive_heal(state.active_mut(side), &field, rules, log);
    }
    for side in order {
        let field = state.field.clone();
        let mon = state.active_mut(side);
        if mon.is_fainted() || mon.active_turns == 0 {
            continue;
        }
        for effect in effects_of(mon, rules) {
            if effect.residual_boosts.is_empty()
                || !condition_applies(&effect.condition, &ConditionContext::passive(mon, &field))
            {
                continue;
            }
            apply_boosts(mon, &effect.residual_boosts, BoostSource::Own, false, rules, log);
        }
    }
    if state.field.terrain == Some(Terrain::Grassy) {
        for side in order {
            let field = state.field.clone();
            let mon = state.active_mut(side);
            if mon.is_fainted() || !is_grounded(mon, &field, rules) || mon.has_volatile(Volatile::HealBlock) {
                continue;
            }
            restore(mon, 1.0 / 16.0, " is healed by the grassy terrain", log);
        }
    }
    for side in order {
        trigger_pinch_item(state.active_mut(side), rules, log);
    }
}

/// Sitrus-like items: heal once at or below the threshold.
pub fn trigger_pinch_item(mon: &mut Combatant, rules: &RuleData, log: &mut BattleLog) -> bool {
    if mon.is_fainted() {
        return false;
    }
    let item = item_of(mon, rules);
    let Some(pinch) = item.pinch_heal else {
        return false;
    };
    if mon.hp_fraction() > pinch.threshold {
        return false;
    }
    let amount = mon.fraction_of_max(pinch.ratio);
    let healed = mon.heal(amount);
    log.push(format!("{} restored HP using its {}!", mon.species, item.name));
    log.log_heal(&mon.species, healed, mon.current_hp, mon.max_hp());
    if item.single_use {
        mon.consume_item();
    }
    true
}

/// Faster active first; the player goes first on a tie.
fn speed_order(state: &BattleState, rules: &RuleData) -> [Side; 2] {
    let player = effective_speed(state.active(Side::Player), &state.field, Side::Player, rules);
    let ai = effective_speed(state.active(Side::Ai), &state.field, Side::Ai, rules);
    if ai > player {
        [Side::Ai, Side::Player]
    } else {
        [Side::Player, Side::Ai]
    }
}

fn tick_field(field: &mut Field, log: &mut BattleLog) {
    if let Some(weather) = field.weather {
        if field.weather_turns > 0 {
            field.weather_turns -= 1;
            if field.weather_turns == 0 {
                field.weather = None;
                log.push(format!("The {weather} subsided."));
            }
        }
    }
    if let Some(terrain) = field.terrain {
        if field.terrain_turns > 0 {
            field.terrain_turns -= 1;
            if field.terrain_turns == 0 {
                field.terrain = None;
                log.push(format!("The {terrain} disappeared."));
            }
        }
    }
    if field.trick_room > 0 {
        field.trick_room -= 1;
        if field.trick_room == 0 {
            log.push("The twisted dimensions returned to normal!");
        }
    }
    if field.gravity > 0 {
        field.gravity -= 1;
        if field.gravity == 0 {
            log.push("Gravity returned to normal!");
        }
    }
    for side in Side::BOTH {
        for label in field.sides[side.index()].tick() {
            log.push(format!("[{}] The {label} wore off!", side.label()));
        }
    }
}

/// Chip damage; logs the cause and any faint.
fn lose_hp(mon: &mut Combatant, ratio: f32, cause: &str, log: &mut BattleLog) -> u16 {
    let amount = mon.fraction_of_max(ratio);
    let dealt = mon.take_damage(amount);
    log.push(format!("{}{cause}!", mon.species));
    log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
    if mon.is_fainted() {
        log.log_faint(&mon.species);
    }
    dealt
}

fn restore(mon: &mut Combatant, ratio: f32, cause: &str, log: &mut BattleLog) -> u16 {
    if mon.is_full_hp() {
        return 0;
    }
    let healed = mon.heal(mon.fraction_of_max(ratio));
    log.push(format!("{}{cause}!", mon.species));
    log.log_heal(&mon.species, healed, mon.current_hp, mon.max_hp());
    healed
}

fn guarded(mon: &Combatant, rules: &RuleData) -> bool {
    ability_of(mon, rules).no_indirect_damage
}

fn tick_volatiles(state: &mut BattleState, side: Side, rules: &RuleData, rng: &mut SmallRng, log: &mut BattleLog) {
    let field = state.field.clone();
    let (mon, foe) = state.actives_mut(side);
    if mon.is_fainted() {
        return;
    }

    if mon.has_volatile(Volatile::LeechSeed) && !guarded(mon, rules) {
        let drained = lose_hp(mon, 1.0 / 8.0, "'s health is sapped by Leech Seed", log);
        if !foe.is_fainted() && !foe.has_volatile(Volatile::HealBlock) {
            let healed = foe.heal(drained);
            log.log_heal(&foe.species, healed, foe.current_hp, foe.max_hp());
        }
    }
    let healing_blocked = mon.has_volatile(Volatile::HealBlock);
    if mon.has_volatile(Volatile::AquaRing) && !healing_blocked && !mon.is_fainted() {
        restore(mon, 1.0 / 16.0, " restored HP with its veil of water", log);
    }
    if mon.has_volatile(Volatile::Ingrain) && !healing_blocked && !mon.is_fainted() {
        restore(mon, 1.0 / 16.0, " absorbed nutrients with its roots", log);
    }
    if mon.has_volatile(Volatile::PartiallyTrapped) && !mon.is_fainted() {
        if !guarded(mon, rules) {
            lose_hp(mon, 1.0 / 8.0, " is hurt by the bind", log);
        }
        if countdown(mon, Volatile::PartiallyTrapped) {
            log.push(format!("{} was freed from the bind!", mon.species));
        }
    }
    if mon.has_volatile(Volatile::SaltCure) && !mon.is_fainted() && !guarded(mon, rules) {
        let ratio = if mon.has_type(Type::Water) || mon.has_type(Type::Steel) {
            1.0 / 4.0
        } else {
            1.0 / 8.0
        };
        lose_hp(mon, ratio, " is hurt by Salt Cure", log);
    }
    if mon.has_volatile(Volatile::Nightmare) && !mon.is_fainted() {
        if mon.status == Some(Status::Sleep) {
            if !guarded(mon, rules) {
                lose_hp(mon, 1.0 / 4.0, " is locked in a nightmare", log);
            }
        } else {
            mon.remove_volatile(Volatile::Nightmare);
        }
    }
    if mon.has_volatile(Volatile::Yawn) && !mon.is_fainted() && countdown(mon, Volatile::Yawn) {
        inflict_status(mon, Status::Sleep, side, &field, StatusAttempt::OWN, rules, rng, log);
    }
    if mon.has_volatile(Volatile::PerishSong) && !mon.is_fainted() {
        let expired = countdown(mon, Volatile::PerishSong);
        let remaining = mon.volatiles.get(&Volatile::PerishSong).copied().unwrap_or(0);
        log.push(format!("{}'s perish count fell to {remaining}.", mon.species));
        if expired {
            mon.current_hp = 0;
            log.log_faint(&mon.species);
        }
    }
    if mon.is_fainted() {
        return;
    }
    for (volatile, label) in [
        (Volatile::MagnetRise, "electromagnetism"),
        (Volatile::Taunt, "taunt"),
        (Volatile::Encore, "encore"),
        (Volatile::Disable, "disable"),
        (Volatile::HealBlock, "heal block"),
    ] {
        if mon.has_volatile(volatile) && countdown(mon, volatile) {
            match volatile {
                Volatile::Encore => mon.encore_move = None,
                Volatile::Disable => mon.disabled_move = None,
                _ => {}
            }
            log.push(format!("{}'s {label} wore off!", mon.species));
        }
    }
}

/// Decrements a timed volatile and removes it at zero. Returns true when it
/// ran out this call.
fn countdown(mon: &mut Combatant, volatile: Volatile) -> bool {
    let Some(counter) = mon.volatiles.get_mut(&volatile) else {
        return false;
    };
    *counter = counter.saturating_sub(1);
    if *counter == 0 {
        mon.volatiles.remove(&volatile);
        return true;
    }
    false
}

fn weather_chip(state: &mut BattleState, side: Side, rules: &RuleData, log: &mut BattleLog) {
    let weather = state.field.active_weather();
    let mon = state.active_mut(side);
    let Some(weather) = weather else {
        return;
    };
    if mon.is_fainted() || guarded(mon, rules) {
        return;
    }
    let exempt_types: &[Type] = match weather {
        Weather::Sand => &[Type::Rock, Type::Ground, Type::Steel],
        Weather::Hail => &[Type::Ice],
        Weather::Sun | Weather::Rain => return,
    };
    if exempt_types.iter().any(|ty| mon.has_type(*ty)) {
        return;
    }
    if effects_of(mon, rules)
        .iter()
        .any(|effect| effect.weather_immunities.contains(&weather))
    {
        return;
    }
    lose_hp(mon, 1.0 / 16.0, &format!(" is buffeted by the {weather}"), log);
}

fn status_damage(mon: &mut Combatant, rules: &RuleData, log: &mut BattleLog) {
    if mon.is_fainted() {
        return;
    }
    let Some(status) = mon.status else {
        return;
    };
    if status == Status::Toxic {
        mon.toxic_counter = (mon.toxic_counter + 1).min(15);
    }
    let ability = ability_of(mon, rules);
    if status.is_poison() && ability.poison_heal {
        if !mon.has_volatile(Volatile::HealBlock) {
            restore(mon, 1.0 / 8.0, " is healed by poison", log);
        }
        return;
    }
    if ability.no_indirect_damage {
        return;
    }
    match status {
        Status::Poison => {
            lose_hp(mon, 1.0 / 8.0, " is hurt by poison", log);
        }
        Status::Toxic => {
            let ratio = mon.toxic_counter as f32 / 16.0;
            lose_hp(mon, ratio, " is hurt by poison", log);
        }
        Status::Burn => {
            lose_hp(mon, 1.0 / 16.0, " is hurt by its burn", log);
        }
        Status::Paralysis | Status::Sleep | Status::Freeze => {}
    }
}

fn passive_heal(mon: &mut Combatant, field: &Field, rules: &RuleData, log: &mut BattleLog) {
    for effect in effects_of(mon, rules) {
        if mon.is_fainted() {
            return;
        }
        if effect.residual_heal.is_none() && effect.residual_damage.is_none() {
            continue;
        }
        if !condition_applies(&effect.condition, &ConditionContext::passive(mon, field)) {
            continue;
        }
        let wrong_type = effect.residual_heal_type.is_some_and(|ty| !mon.has_type(ty));
        match (effect.residual_heal, effect.residual_damage) {
            (Some(ratio), _) if !wrong_type => {
                if !mon.has_volatile(Volatile::HealBlock) {
                    restore(mon, ratio, &format!(" restored a little HP using its {}", effect.name), log);
                }
            }
            (_, Some(ratio)) => {
                if !guarded(mon, rules) {
                    lose_hp(mon, ratio, &format!(" is hurt by its {}", effect.name), log);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::effects::{Condition, EffectData, PinchHeal};
    use crate::sim::battle::Party;
    use crate::sim::resolver::test_support::make_mon;
    use crate::sim::stats::Stat;
    use rand::SeedableRng;

    fn duel(player: Combatant, ai: Combatant) -> BattleState {
        BattleState::new(Party::new(vec![player]), Party::new(vec![ai]))
    }

    fn run(state: &mut BattleState, rules: &RuleData) -> BattleLog {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut log = BattleLog::new();
        end_of_turn(state, rules, &mut rng, &mut log);
        log
    }

    #[test]
    fn every_timer_decrements_once() {
        let rules = RuleData::new();
        let mut state = duel(make_mon(vec![Type::Normal]), make_mon(vec![Type::Normal]));
        state.field.set_weather(Weather::Rain, 2);
        state.field.set_terrain(Terrain::Psychic, 1);
        state.field.trick_room = 3;
        state.field.sides[0].reflect = 2;
        state.field.sides[1].tailwind = 1;
        let log = run(&mut state, &rules);
        assert_eq!(state.field.weather_turns, 1);
        assert_eq!(state.field.terrain, None);
        assert_eq!(state.field.trick_room, 2);
        assert_eq!(state.field.sides[0].reflect, 1);
        assert_eq!(state.field.sides[1].tailwind, 0);
        assert!(log.position("[AI] The tailwind wore off!").is_some());
    }

    #[test]
    fn permanent_weather_is_not_ticked() {
        let rules = RuleData::new();
        let mut state = duel(make_mon(vec![Type::Normal]), make_mon(vec![Type::Normal]));
        state.field.set_weather(Weather::Sun, 0);
        run(&mut state, &rules);
        assert_eq!(state.field.weather, Some(Weather::Sun));
    }

    #[test]
    fn sand_chips_all_but_exempt_types() {
        let rules = RuleData::new();
        let mut state = duel(make_mon(vec![Type::Normal]), make_mon(vec![Type::Rock]));
        state.field.set_weather(Weather::Sand, 5);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 150);
        assert_eq!(state.active(Side::Ai).current_hp, 160);
    }

    #[test]
    fn toxic_counter_climbs_before_damage() {
        let rules = RuleData::new();
        let mut poisoned = make_mon(vec![Type::Normal]);
        poisoned.status = Some(Status::Toxic);
        let mut state = duel(poisoned, make_mon(vec![Type::Normal]));
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 150);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 130);
        assert_eq!(state.active(Side::Player).toxic_counter, 2);
    }

    #[test]
    fn poison_heal_and_magic_guard() {
        let rules = RuleData::new()
            .with_ability(EffectData {
                poison_heal: true,
                ..EffectData::named("Poison Heal")
            })
            .with_ability(EffectData {
                no_indirect_damage: true,
                ..EffectData::named("Magic Guard")
            });
        let mut healer = make_mon(vec![Type::Grass]).with_ability("Poison Heal");
        healer.status = Some(Status::Poison);
        healer.current_hp = 100;
        let mut guard = make_mon(vec![Type::Psychic]).with_ability("Magic Guard");
        guard.status = Some(Status::Burn);
        let mut state = duel(healer, guard);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 120);
        assert_eq!(state.active(Side::Ai).current_hp, 160);
    }

    #[test]
    fn leech_seed_moves_hp_across() {
        let rules = RuleData::new();
        let mut seeded = make_mon(vec![Type::Normal]);
        seeded.add_volatile(Volatile::LeechSeed, 0);
        let mut seeder = make_mon(vec![Type::Grass]);
        seeder.current_hp = 100;
        let mut state = duel(seeded, seeder);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 140);
        assert_eq!(state.active(Side::Ai).current_hp, 120);
    }

    #[test]
    fn perish_count_faints_at_zero() {
        let rules = RuleData::new();
        let mut doomed = make_mon(vec![Type::Normal]);
        doomed.add_volatile(Volatile::PerishSong, 2);
        let mut state = duel(doomed, make_mon(vec![Type::Normal]));
        run(&mut state, &rules);
        assert!(!state.active(Side::Player).is_fainted());
        let log = run(&mut state, &rules);
        assert!(state.active(Side::Player).is_fainted());
        assert!(log.position("Testmon fainted!").is_some());
    }

    #[test]
    fn taunt_expiry_clears_volatile() {
        let rules = RuleData::new();
        let mut taunted = make_mon(vec![Type::Normal]);
        taunted.add_volatile(Volatile::Encore, 1);
        taunted.encore_move = Some("Tackle".to_string());
        let mut state = duel(taunted, make_mon(vec![Type::Normal]));
        run(&mut state, &rules);
        let mon = state.active(Side::Player);
        assert!(!mon.has_volatile(Volatile::Encore));
        assert_eq!(mon.encore_move, None);
    }

    #[test]
    fn leftovers_and_black_sludge() {
        let rules = RuleData::new()
            .with_item(EffectData {
                residual_heal: Some(1.0 / 16.0),
                ..EffectData::named("Leftovers")
            })
            .with_item(EffectData {
                residual_heal: Some(1.0 / 16.0),
                residual_heal_type: Some(Type::Poison),
                residual_damage: Some(1.0 / 8.0),
                ..EffectData::named("Black Sludge")
            });
        let mut holder = make_mon(vec![Type::Normal]).with_item("Leftovers");
        holder.current_hp = 100;
        let sludge = make_mon(vec![Type::Water]).with_item("Black Sludge");
        let mut state = duel(holder, sludge);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 110);
        assert_eq!(state.active(Side::Ai).current_hp, 140);
    }

    #[test]
    fn rain_dish_needs_rain() {
        let rules = RuleData::new().with_ability(EffectData {
            residual_heal: Some(1.0 / 16.0),
            ..EffectData::named("Rain Dish").with_condition(Condition {
                weather: vec![Weather::Rain],
                ..Condition::default()
            })
        });
        let mut dish = make_mon(vec![Type::Water]).with_ability("Rain Dish");
        dish.current_hp = 100;
        let mut state = duel(dish, make_mon(vec![Type::Normal]));
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 100);
        state.field.set_weather(Weather::Rain, 5);
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 110);
    }

    #[test]
    fn speed_boost_waits_for_first_full_turn() {
        let rules = RuleData::new().with_ability(EffectData {
            residual_boosts: [(Stat::Spe, 1)].into_iter().collect(),
            ..EffectData::named("Speed Boost")
        });
        let mut state = duel(
            make_mon(vec![Type::Bug]).with_ability("Speed Boost"),
            make_mon(vec![Type::Normal]),
        );
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).stage(Stat::Spe), 0);
        state.active_mut(Side::Player).active_turns = 1;
        run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).stage(Stat::Spe), 1);
    }

    #[test]
    fn fainted_actives_are_skipped() {
        let rules = RuleData::new();
        let mut down = make_mon(vec![Type::Normal]);
        down.status = Some(Status::Burn);
        down.current_hp = 0;
        let mut state = duel(down, make_mon(vec![Type::Normal]));
        state.field.set_weather(Weather::Sand, 5);
        let log = run(&mut state, &rules);
        assert_eq!(state.active(Side::Player).current_hp, 0);
        assert!(log.position("fainted").is_none());
    }

    #[test]
    fn pinch_berry_fires_once() {
        let rules = RuleData::new().with_item(EffectData {
            pinch_heal: Some(PinchHeal {
                threshold: 0.5,
                ratio: 0.25,
            }),
            single_use: true,
            ..EffectData::named("Sitrus Berry")
        });
        let mut mon = make_mon(vec![Type::Normal]).with_item("Sitrus Berry");
        let mut log = BattleLog::new();
        mon.current_hp = 90;
        assert!(!trigger_pinch_item(&mut mon, &rules, &mut log));
        mon.current_hp = 80;
        assert!(trigger_pinch_item(&mut mon, &rules, &mut log));
        assert_eq!(mon.current_hp, 120);
        mon.current_hp = 10;
        assert!(!trigger_pinch_item(&mut mon, &rules, &mut log));
    }

    #[test]
    fn speed_order_berry_is_consumed() {
        let rules = RuleData::new().with_item(EffectData {
            speed_order: Some(SpeedOrder::LowHpBerry { threshold: 0.25 }),
            single_use: true,
            ..EffectData::named("Custap Berry")
        });
        let mut holder = make_mon(vec![Type::Normal]).with_item("Custap Berry");
        holder.current_hp = 40;
        let mut state = duel(holder, make_mon(vec![Type::Normal]));
        let mut rng = SmallRng::seed_from_u64(3);
        let mut log = BattleLog::new();
        let attack = Decision::use_move("Tackle");
        start_of_turn(&mut state, [&attack, &attack], &rules, &mut rng, &mut log);
        let mon = state.active(Side::Player);
        assert_eq!(mon.turn_priority_mod, 1);
        assert!(mon.item_consumed);
    }
}
