use crate::data::effects::ExtendTarget;
use crate::data::moves::{CustomHandler, FieldChange, HazardKind, MoveData, MoveEffect};
use crate::data::types::Type;
use crate::data::{normalize_id, RuleData};
use crate::sim::battle::Side;
use crate::sim::combatant::{Combatant, Status, Volatile};
use crate::sim::decision::STRUGGLE;
use crate::sim::field::{Weather, ROOM_TURNS, SCREEN_TURNS, TAILWIND_TURNS, TERRAIN_TURNS, WEATHER_TURNS};
use crate::sim::moves::{drag_out, lookup_move};
use crate::sim::resolver::ailment::{inflict_status, status_blocked, StatusAttempt};
use crate::sim::resolver::boosts::{apply_boosts, BoostSource};
use crate::sim::resolver::{ability_of, effects_of, item_of};
use crate::sim::stats::{Stat, STAGE_MAX};
use crate::sim::switching::apply_stat_drop_reaction;
use crate::sim::turn::{resolve_move, TurnContext};
use rand::Rng;

/// Applies a status move's effect on behalf of `user`. Target checks have
/// already passed; anything that fails from here logs "But it failed!".
pub(crate) fn resolve_status(ctx: &mut TurnContext, user: Side, mv: &MoveData) {
    let applied = match &mv.effect {
        Some(MoveEffect::Status { status }) => inflict(ctx, user, *status),
        Some(MoveEffect::Volatile {
            volatile, target_self, ..
        }) => add_volatile(ctx, user, *volatile, *target_self),
        Some(MoveEffect::Boost { boosts, target_self }) => {
            let target = if *target_self { user } else { user.opponent() };
            let source = if *target_self { BoostSource::Own } else { BoostSource::Opponent };
            let mist = !*target_self && ctx.state.field.sides[target.index()].mist > 0;
            let outcome = apply_boosts(ctx.state.active_mut(target), boosts, source, mist, ctx.rules, ctx.log);
            if let Some(reaction) = outcome.reaction {
                apply_stat_drop_reaction(ctx.state, target, reaction, ctx.rules, ctx.log);
            }
            !outcome.applied.is_empty()
        }
        Some(MoveEffect::Field { change }) => change_field(ctx, user, *change),
        Some(MoveEffect::Hazard { hazard }) => set_hazard(ctx, user, *hazard),
        Some(MoveEffect::Custom { handler }) => custom(ctx, user, *handler),
        None => mv.heal.is_some() || mv.force_switch,
    };
    let healed = match mv.heal {
        Some(ratio) => heal_user(ctx, user, ratio, mv.effect.is_none()),
        None => true,
    };
    let dragged = !mv.force_switch || drag_out(ctx, user.opponent());
    let succeeded = match (&mv.effect, mv.heal.is_some(), mv.force_switch) {
        (None, true, _) => healed,
        (None, false, true) => dragged,
        _ => applied,
    };
    // Boost moves log their own "won't go any higher" lines.
    if !succeeded && !matches!(mv.effect, Some(MoveEffect::Boost { .. })) {
        ctx.log.log_fail();
    }
}

fn inflict(ctx: &mut TurnContext, user: Side, status: Status) -> bool {
    let target_side = user.opponent();
    let attempt = StatusAttempt::by(ctx.state.active(user), ctx.rules);
    let field = ctx.state.field.clone();
    let target = ctx.state.active_mut(target_side);
    if target.status == Some(status) {
        ctx.log.push(format!("{} is already {}!", target.species, status.label()));
        return true;
    }
    inflict_status(target, status, target_side, &field, attempt, ctx.rules, ctx.rng, ctx.log)
}

/// Ability or item on the target that shrugs off this volatile.
fn volatile_immune(target: &Combatant, volatile: Volatile, ignore_ability: bool, rules: &RuleData) -> bool {
    effects_of(target, rules)
        .iter()
        .enumerate()
        .filter(|(idx, _)| !(ignore_ability && *idx == 0))
        .any(|(_, effect)| effect.volatile_immunities.contains(&volatile))
}

fn add_volatile(ctx: &mut TurnContext, user: Side, volatile: Volatile, target_self: bool) -> bool {
    if volatile == Volatile::PerishSong {
        return perish_song(ctx);
    }
    let target_side = if target_self { user } else { user.opponent() };
    let ignore_ability = !target_self && ability_of(ctx.state.active(user), ctx.rules).ignores_abilities;
    let target = ctx.state.active_mut(target_side);
    if target.is_fainted() || target.has_volatile(volatile) {
        return false;
    }
    if !target_self && volatile_immune(target, volatile, ignore_ability, ctx.rules) {
        ctx.log.push(format!("It doesn't affect {}...", target.species));
        return true;
    }

    let counter = match volatile {
        Volatile::Substitute => {
            let cost = target.max_hp() / 4;
            if cost == 0 || target.current_hp <= cost {
                return false;
            }
            target.take_damage(cost);
            target.substitute_hp = cost;
            0
        }
        Volatile::LeechSeed => {
            if target.has_type(Type::Grass) {
                ctx.log.push(format!("It doesn't affect {}...", target.species));
                return true;
            }
            0
        }
        Volatile::Encore => {
            let Some(last) = target.last_move.clone() else {
                return false;
            };
            if normalize_id(&last) == normalize_id(STRUGGLE) {
                return false;
            }
            target.encore_move = Some(last);
            volatile.initial_counter()
        }
        Volatile::Disable => {
            let Some(last) = target.last_move.clone() else {
                return false;
            };
            target.disabled_move = Some(last);
            volatile.initial_counter()
        }
        Volatile::Yawn => {
            let field = ctx.state.field.clone();
            let attempt = StatusAttempt {
                from_opponent: true,
                ignores_abilities: ignore_ability,
            };
            let target = ctx.state.active(target_side);
            if target.status.is_some() || status_blocked(target, Status::Sleep, target_side, &field, attempt, ctx.rules) {
                return false;
            }
            volatile.initial_counter()
        }
        Volatile::Nightmare => {
            if target.status != Some(Status::Sleep) {
                return false;
            }
            0
        }
        Volatile::Confusion => ctx.rng.gen_range(2..=5),
        _ => volatile.initial_counter(),
    };

    let target = ctx.state.active_mut(target_side);
    target.add_volatile(volatile, counter);
    let line = volatile_message(volatile, &target.species);
    ctx.log.push(line);
    true
}

fn perish_song(ctx: &mut TurnContext) -> bool {
    let mut affected = false;
    for side in Side::BOTH {
        let mon = ctx.state.active_mut(side);
        if mon.is_fainted() {
            continue;
        }
        affected |= mon.add_volatile(Volatile::PerishSong, Volatile::PerishSong.initial_counter());
    }
    if affected {
        ctx.log.push("All Pokemon that hear the song will faint in three turns!");
    }
    affected
}

/// Log line for a volatile condition taking hold.
pub fn volatile_message(volatile: Volatile, species: &str) -> String {
    match volatile {
        Volatile::Confusion => format!("{species} became confused!"),
        Volatile::LeechSeed => format!("{species} was seeded!"),
        Volatile::AquaRing => format!("{species} surrounded itself with a veil of water!"),
        Volatile::Ingrain => format!("{species} planted its roots!"),
        Volatile::PartiallyTrapped => format!("{species} was trapped!"),
        Volatile::Yawn => format!("{species} grew drowsy!"),
        Volatile::SaltCure => format!("{species} is being salt cured!"),
        Volatile::MagnetRise => format!("{species} levitated with electromagnetism!"),
        Volatile::Taunt => format!("{species} fell for the taunt!"),
        Volatile::Encore => format!("{species} received an encore!"),
        Volatile::Disable => format!("{species}'s move was disabled!"),
        Volatile::HealBlock => format!("{species} was prevented from healing!"),
        Volatile::Torment => format!("{species} was subjected to torment!"),
        Volatile::Attract => format!("{species} fell in love!"),
        Volatile::Substitute => format!("{species} put in a substitute!"),
        Volatile::MagicCoat => format!("{species} shrouded itself with Magic Coat!"),
        Volatile::FocusEnergy => format!("{species} is getting pumped!"),
        Volatile::DestinyBond => format!("{species} is hoping to take its attacker down with it!"),
        Volatile::Nightmare => format!("{species} began having a nightmare!"),
        Volatile::Imprison => format!("{species} sealed any moves its target shares with it!"),
        Volatile::Identified => format!("{species} was identified!"),
        Volatile::Protect => format!("{species} protected itself!"),
        Volatile::Flinch
        | Volatile::PerishSong
        | Volatile::SemiInvulnerable
        | Volatile::MustRecharge => format!("{species} is affected by {volatile:?}."),
    }
}

/// Extra turns granted by the user's held item for this field change.
fn extension(ctx: &TurnContext, user: Side, target: ExtendTarget) -> u8 {
    match item_of(ctx.state.active(user), ctx.rules).extends {
        Some(ext) if ext.target == target => ext.turns,
        _ => 0,
    }
}

fn change_field(ctx: &mut TurnContext, user: Side, change: FieldChange) -> bool {
    let label = user.label();
    let species = ctx.state.active(user).species.clone();
    match change {
        FieldChange::Weather(weather) => {
            let turns = WEATHER_TURNS + extension(ctx, user, ExtendTarget::Weather(weather));
            if !ctx.state.field.set_weather(weather, turns) {
                return false;
            }
            let line = match weather {
                Weather::Sun => "The sunlight turned harsh!",
                Weather::Rain => "It started to rain!",
                Weather::Sand => "A sandstorm kicked up!",
                Weather::Hail => "It started to hail!",
            };
            ctx.log.push(line);
        }
        FieldChange::Terrain(terrain) => {
            let turns = TERRAIN_TURNS + extension(ctx, user, ExtendTarget::Terrain);
            if !ctx.state.field.set_terrain(terrain, turns) {
                return false;
            }
            ctx.log.push(format!("{terrain} covered the battlefield!"));
        }
        FieldChange::TrickRoom => {
            if ctx.state.field.trick_room_active() {
                ctx.state.field.trick_room = 0;
                ctx.log.push("The twisted dimensions returned to normal!");
            } else {
                ctx.state.field.trick_room = ROOM_TURNS;
                ctx.log.push(format!("{species} twisted the dimensions!"));
            }
        }
        FieldChange::Gravity => {
            if ctx.state.field.gravity_active() {
                return false;
            }
            ctx.state.field.gravity = ROOM_TURNS;
            ctx.log.push("Gravity intensified!");
        }
        FieldChange::Tailwind => {
            let side = &mut ctx.state.field.sides[user.index()];
            if side.tailwind > 0 {
                return false;
            }
            side.tailwind = TAILWIND_TURNS;
            ctx.log.push(format!("[{label}] The tailwind blew from behind the team!"));
        }
        FieldChange::Reflect | FieldChange::LightScreen | FieldChange::AuroraVeil => {
            if change == FieldChange::AuroraVeil && ctx.state.field.active_weather() != Some(Weather::Hail) {
                return false;
            }
            let turns = SCREEN_TURNS + extension(ctx, user, ExtendTarget::Screens);
            let side = &mut ctx.state.field.sides[user.index()];
            let (timer, name) = match change {
                FieldChange::Reflect => (&mut side.reflect, "Reflect"),
                FieldChange::LightScreen => (&mut side.light_screen, "Light Screen"),
                _ => (&mut side.aurora_veil, "Aurora Veil"),
            };
            if *timer > 0 {
                return false;
            }
            *timer = turns;
            ctx.log.push(format!("[{label}] {name} raised the team's defenses!"));
        }
        FieldChange::Safeguard | FieldChange::Mist => {
            let side = &mut ctx.state.field.sides[user.index()];
            let (timer, line) = match change {
                FieldChange::Safeguard => (&mut side.safeguard, "is cloaked in a mystical veil!"),
                _ => (&mut side.mist, "became shrouded in mist!"),
            };
            if *timer > 0 {
                return false;
            }
            *timer = SCREEN_TURNS;
            ctx.log.push(format!("[{label}] The team {line}"));
        }
    }
    true
}

fn set_hazard(ctx: &mut TurnContext, user: Side, hazard: HazardKind) -> bool {
    let target = user.opponent();
    if !ctx.state.field.sides[target.index()].add_hazard(hazard) {
        return false;
    }
    let line = match hazard {
        HazardKind::StealthRock => "Pointed stones float in the air around the team!",
        HazardKind::Spikes => "Spikes were scattered around the team's feet!",
        HazardKind::ToxicSpikes => "Poison spikes were scattered around the team's feet!",
        HazardKind::StickyWeb => "A sticky web spreads out on the ground around the team!",
    };
    ctx.log.push(format!("[{}] {line}", target.label()));
    true
}

fn custom(ctx: &mut TurnContext, user: Side, handler: CustomHandler) -> bool {
    match handler {
        CustomHandler::Transform => {
            let (mon, foe) = ctx.state.actives_mut(user);
            if foe.is_fainted() {
                return false;
            }
            mon.transform_into(foe);
            ctx.log.push(format!("{} transformed into {}!", mon.species, foe.species));
            true
        }
        CustomHandler::Metronome => metronome(ctx, user),
        CustomHandler::Haze => {
            for side in Side::BOTH {
                ctx.state.active_mut(side).stages.reset();
            }
            ctx.log.push("All stat changes were eliminated!");
            true
        }
        CustomHandler::Rest => {
            let field = ctx.state.field.clone();
            let mon = ctx.state.active_mut(user);
            if mon.is_full_hp()
                || mon.status == Some(Status::Sleep)
                || status_blocked(mon, Status::Sleep, user, &field, StatusAttempt::OWN, ctx.rules)
            {
                return false;
            }
            mon.clear_status();
            mon.status = Some(Status::Sleep);
            mon.sleep_turns = 3;
            let healed = mon.heal(mon.max_hp());
            ctx.log.push(format!("{} slept and became healthy!", mon.species));
            ctx.log.log_heal(&mon.species, healed, mon.current_hp, mon.max_hp());
            true
        }
        CustomHandler::PainSplit => {
            let (mon, foe) = ctx.state.actives_mut(user);
            if foe.is_fainted() {
                return false;
            }
            let average = (mon.current_hp as u32 + foe.current_hp as u32) / 2;
            for target in [mon, foe] {
                target.current_hp = (average as u16).min(target.max_hp());
            }
            ctx.log.push("The battlers shared their pain!");
            true
        }
        CustomHandler::BellyDrum => {
            let mon = ctx.state.active_mut(user);
            let cost = mon.max_hp() / 2;
            if mon.current_hp <= cost || mon.stage(Stat::Atk) >= STAGE_MAX {
                return false;
            }
            mon.take_damage(cost);
            mon.stages.set(Stat::Atk, STAGE_MAX);
            ctx.log.push(format!("{} cut its own HP and maximized its Attack!", mon.species));
            true
        }
    }
}

/// Calls a random move from the whole table, never itself or Struggle.
fn metronome(ctx: &mut TurnContext, user: Side) -> bool {
    let rules = ctx.rules;
    let pool: Vec<&str> = rules
        .move_ids()
        .into_iter()
        .filter(|id| {
            let mv = lookup_move(rules, id);
            !matches!(mv.effect, Some(MoveEffect::Custom { handler: CustomHandler::Metronome }))
                && *id != normalize_id(STRUGGLE)
        })
        .collect();
    if pool.is_empty() {
        return false;
    }
    let picked = lookup_move(rules, pool[ctx.rng.gen_range(0..pool.len())]);
    ctx.log.push(format!("Waggling a finger let it use {}!", picked.name));
    resolve_move(ctx, user, picked, false);
    true
}

/// Heal payload of a status move. Fails at full HP only when healing is the
/// move's whole point.
fn heal_user(ctx: &mut TurnContext, user: Side, ratio: f32, heal_only: bool) -> bool {
    let mon = ctx.state.active_mut(user);
    if mon.is_fainted() || mon.has_volatile(Volatile::HealBlock) {
        return false;
    }
    if mon.is_full_hp() {
        return !heal_only;
    }
    let amount = mon.fraction_of_max(ratio);
    let healed = mon.heal(amount);
    ctx.log.log_heal(&mon.species, healed, mon.current_hp, mon.max_hp());
    true
}

#[cfg(test)]
mod tests {
    use crate::battle_log::BattleLog;
    use crate::data::effects::{EffectData, Extension};
    use crate::data::moves::{MoveData, MoveEffect};
    use crate::data::types::Type;
    use crate::data::RuleData;
    use crate::engine::EngineConfig;
    use crate::sim::battle::{BattleState, Party, Side};
    use crate::sim::combatant::{Combatant, Status, Volatile};
    use crate::sim::damage::LocalDamageCalc;
    use crate::sim::field::Weather;
    use crate::sim::stats::{Stat, StatBlock};
    use crate::sim::turn::TurnContext;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    use super::*;

    fn make_mon(species: &str, types: Vec<Type>) -> Combatant {
        Combatant::new(species, 50, types, StatBlock::new(160, 100, 100, 100, 100, 100)).with_moves(["Tackle"])
    }

    fn run(state: &mut BattleState, rules: &RuleData, mv: &MoveData) -> BattleLog {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut log = BattleLog::new();
        let config = EngineConfig::default();
        let mut ctx = TurnContext {
            state,
            rules,
            calc: &LocalDamageCalc,
            config: &config,
            rng: &mut rng,
            log: &mut log,
        };
        resolve_status(&mut ctx, Side::Player, mv);
        log
    }

    fn duel() -> BattleState {
        BattleState::new(
            Party::new(vec![make_mon("User", vec![Type::Normal])]),
            Party::new(vec![make_mon("Target", vec![Type::Normal])]),
        )
    }

    #[test]
    fn burn_fails_against_fire_types() {
        let rules = RuleData::new();
        let mut state = BattleState::new(
            Party::new(vec![make_mon("User", vec![Type::Normal])]),
            Party::new(vec![make_mon("Flame", vec![Type::Fire])]),
        );
        let wisp = MoveData::status("Will-O-Wisp", Type::Fire, MoveEffect::Status { status: Status::Burn });
        let log = run(&mut state, &rules, &wisp);
        let target = state.active(Side::Ai);
        assert_eq!(target.status, None);
        assert!(target.stages.iter().all(|(_, stage)| stage == 0));
        assert_eq!(log.lines(), ["But it failed!"]);
    }

    #[test]
    fn substitute_costs_a_quarter() {
        let rules = RuleData::new();
        let mut state = duel();
        let sub = MoveData::status(
            "Substitute",
            Type::Normal,
            MoveEffect::Volatile {
                volatile: Volatile::Substitute,
                target_self: true,
                protect: None,
            },
        );
        run(&mut state, &rules, &sub);
        let user = state.active(Side::Player);
        assert_eq!(user.current_hp, 120);
        assert_eq!(user.substitute_hp, 40);

        state.active_mut(Side::Player).remove_volatile(Volatile::Substitute);
        state.active_mut(Side::Player).current_hp = 40;
        let log = run(&mut state, &rules, &sub);
        assert_eq!(log.lines(), ["But it failed!"]);
    }

    #[test]
    fn encore_needs_a_previous_move() {
        let rules = RuleData::new();
        let mut state = duel();
        let encore = MoveData::status(
            "Encore",
            Type::Normal,
            MoveEffect::Volatile {
                volatile: Volatile::Encore,
                target_self: false,
                protect: None,
            },
        );
        let log = run(&mut state, &rules, &encore);
        assert_eq!(log.lines(), ["But it failed!"]);

        state.active_mut(Side::Ai).last_move = Some("Tackle".to_string());
        run(&mut state, &rules, &encore);
        let target = state.active(Side::Ai);
        assert_eq!(target.encore_move.as_deref(), Some("Tackle"));
        assert_eq!(target.volatiles.get(&Volatile::Encore), Some(&3));
    }

    #[test]
    fn weather_rock_extends_rain() {
        let rules = RuleData::new().with_item(EffectData {
            extends: Some(Extension {
                target: ExtendTarget::Weather(Weather::Rain),
                turns: 3,
            }),
            ..EffectData::named("Damp Rock")
        });
        let mut state = duel();
        state.active_mut(Side::Player).item = Some("Damp Rock".to_string());
        let rain = MoveData::status(
            "Rain Dance",
            Type::Water,
            MoveEffect::Field {
                change: FieldChange::Weather(Weather::Rain),
            },
        );
        run(&mut state, &rules, &rain);
        assert_eq!(state.field.weather, Some(Weather::Rain));
        assert_eq!(state.field.weather_turns, 8);

        let log = run(&mut state, &rules, &rain);
        assert_eq!(log.lines(), ["But it failed!"]);
    }

    #[test]
    fn trick_room_toggles() {
        let rules = RuleData::new();
        let mut state = duel();
        let room = MoveData::status("Trick Room", Type::Psychic, MoveEffect::Field { change: FieldChange::TrickRoom });
        run(&mut state, &rules, &room);
        assert_eq!(state.field.trick_room, ROOM_TURNS);
        run(&mut state, &rules, &room);
        assert_eq!(state.field.trick_room, 0);
    }

    #[test]
    fn fourth_spikes_layer_fails() {
        let rules = RuleData::new();
        let mut state = duel();
        let spikes = MoveData::status("Spikes", Type::Ground, MoveEffect::Hazard { hazard: HazardKind::Spikes });
        for _ in 0..3 {
            run(&mut state, &rules, &spikes);
        }
        let before = state.field.clone();
        let log = run(&mut state, &rules, &spikes);
        assert_eq!(state.field, before);
        assert_eq!(log.lines(), ["But it failed!"]);
    }

    #[test]
    fn rest_and_belly_drum() {
        let rules = RuleData::new();
        let mut state = duel();
        let rest = MoveData::status("Rest", Type::Psychic, MoveEffect::Custom { handler: CustomHandler::Rest });
        let log = run(&mut state, &rules, &rest);
        assert_eq!(log.lines(), ["But it failed!"]);

        state.active_mut(Side::Player).current_hp = 10;
        state.active_mut(Side::Player).status = Some(Status::Burn);
        run(&mut state, &rules, &rest);
        let user = state.active(Side::Player);
        assert_eq!(user.status, Some(Status::Sleep));
        assert_eq!(user.sleep_turns, 3);
        assert!(user.is_full_hp());

        let mut state = duel();
        let drum = MoveData::status("Belly Drum", Type::Normal, MoveEffect::Custom { handler: CustomHandler::BellyDrum });
        run(&mut state, &rules, &drum);
        let user = state.active(Side::Player);
        assert_eq!(user.current_hp, 80);
        assert_eq!(user.stage(Stat::Atk), 6);
    }

    #[test]
    fn pain_split_averages() {
        let rules = RuleData::new();
        let mut state = duel();
        state.active_mut(Side::Player).current_hp = 20;
        let split = MoveData::status("Pain Split", Type::Normal, MoveEffect::Custom { handler: CustomHandler::PainSplit });
        run(&mut state, &rules, &split);
        assert_eq!(state.active(Side::Player).current_hp, 90);
        assert_eq!(state.active(Side::Ai).current_hp, 90);
    }

    #[test]
    fn growl_respects_mist() {
        let rules = RuleData::new();
        let mut state = duel();
        let growl = MoveData::status(
            "Growl",
            Type::Normal,
            MoveEffect::Boost {
                boosts: [(Stat::Atk, -1)].into_iter().collect::<BTreeMap<_, _>>(),
                target_self: false,
            },
        );
        run(&mut state, &rules, &growl);
        assert_eq!(state.active(Side::Ai).stage(Stat::Atk), -1);
        state.field.sides[Side::Ai.index()].mist = 3;
        run(&mut state, &rules, &growl);
        assert_eq!(state.active(Side::Ai).stage(Stat::Atk), -1);
    }
}
