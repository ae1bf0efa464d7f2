//! One side's action within a turn: the applicability gate, charging and
//! protection, the target gate, then effect resolution.

use crate::battle_log::BattleLog;
use crate::data::moves::{MoveCategory, MoveData, MoveEffect, ProtectKind};
use crate::data::types::Type;
use crate::data::{normalize_id, RuleData};
use crate::engine::EngineConfig;
use crate::sim::battle::{BattleState, Side};
use crate::sim::combatant::{Status, Volatile};
use crate::sim::damage::{compute_base_damage, move_effectiveness, DamageCalculator};
use crate::sim::decision::{Decision, STRUGGLE};
use crate::sim::moves::attacking::resolve_damaging;
use crate::sim::moves::status::resolve_status;
use crate::sim::moves::{lookup_move, targets_opponent};
use crate::sim::resolver::accuracy::check_accuracy;
use crate::sim::resolver::ailment::{inflict_status, StatusAttempt};
use crate::sim::resolver::boosts::{apply_boosts, BoostSource};
use crate::sim::resolver::stat::effective_stat;
use crate::sim::resolver::{ability_of, effects_of, item_of};
use crate::sim::stats::Stat;
use crate::sim::switching::{apply_stat_drop_reaction, perform_switch, SwitchKind};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

/// Everything an action needs while it resolves.
pub(crate) struct TurnContext<'a> {
    pub state: &'a mut BattleState,
    pub rules: &'a RuleData,
    pub calc: &'a dyn DamageCalculator,
    pub config: &'a EngineConfig,
    pub rng: &'a mut SmallRng,
    pub log: &'a mut BattleLog,
}

fn same_move(a: &str, b: &str) -> bool {
    normalize_id(a) == normalize_id(b)
}

/// The move a decision will actually execute. A charging combatant is
/// committed to its stored move.
pub(crate) fn committed_move<'r>(state: &BattleState, side: Side, decision: &Decision, rules: &'r RuleData) -> Option<&'r MoveData> {
    let name = decision.move_name()?;
    let mon = state.active(side);
    let name = mon.charging.as_deref().unwrap_or(name);
    Some(lookup_move(rules, name))
}

pub(crate) fn execute_action(ctx: &mut TurnContext, side: Side, decision: &Decision) {
    match decision {
        Decision::Switch(target) => {
            let party = ctx.state.party(side);
            let Some(slot) = party.find_switch_target(target) else {
                tracing::debug!(side = side.label(), target = %target, "switch target unavailable");
                ctx.log.push(format!("[{}] {target} cannot be switched in.", side.label()));
                return;
            };
            if party.has_duplicate_species(target) {
                ctx.log.push(format!(
                    "[{}] More than one {target} in the party; switching to the first one available.",
                    side.label()
                ));
            }
            perform_switch(ctx.state, side, slot, SwitchKind::Voluntary, ctx.rules, ctx.rng, ctx.log);
        }
        Decision::UseMove(_) => execute_move(ctx, side, decision),
    }
}

fn execute_move(ctx: &mut TurnContext, side: Side, decision: &Decision) {
    let rules = ctx.rules;
    let attacker = ctx.state.active(side);
    if attacker.is_fainted() || attacker.must_switch {
        return;
    }
    let Some(mv) = committed_move(ctx.state, side, decision, rules) else {
        return;
    };
    let charging = attacker.charging.is_some();
    if !can_act(ctx, side, mv) {
        let mon = ctx.state.active_mut(side);
        if charging {
            mon.charging = None;
            mon.remove_volatile(Volatile::SemiInvulnerable);
        }
        return;
    }

    let label = side.label();
    if mv.flags.charge && !charging {
        let weather = ctx.state.field.active_weather();
        let mon = ctx.state.active_mut(side);
        let item = item_of(mon, rules);
        if item.charge_skip {
            ctx.log.push(format!("{} became fully charged due to its {}!", mon.species, item.name));
            mon.consume_item();
        } else if mv.charge_weather.is_none() || mv.charge_weather != weather {
            ctx.log.log_move(side, &mon.species, &mv.name);
            ctx.log.push(format!("[{label}] {} is charging up!", mon.species));
            mon.charging = Some(mv.name.clone());
            if mv.semi_invulnerable {
                mon.add_volatile(Volatile::SemiInvulnerable, 0);
            }
            return;
        }
    }
    let mon = ctx.state.active_mut(side);
    mon.charging = None;
    mon.remove_volatile(Volatile::SemiInvulnerable);

    ctx.log.log_move(side, &mon.species, &mv.name);
    mon.last_move = Some(mv.name.clone());
    ctx.state.last_moves[side.index()] = Some(mv.name.clone());
    let mon = ctx.state.active_mut(side);
    if item_of(mon, rules).choice_lock && mon.choice_lock.is_none() && !same_move(&mv.name, STRUGGLE) {
        mon.choice_lock = Some(mv.name.clone());
    }

    if mv.is_protection() {
        use_protection(ctx, side, mv);
        return;
    }
    mon.protect_counter = 0;

    if mv.first_turn_only && mon.active_turns > 0 {
        ctx.log.log_fail();
        return;
    }
    if mv.self_destruct {
        let damp = Side::BOTH
            .iter()
            .find(|s| ability_of(ctx.state.active(**s), rules).blocks_explosions);
        if let Some(holder) = damp {
            let holder = ctx.state.active(*holder);
            let ability = &ability_of(holder, rules).name;
            ctx.log.push(format!("{}'s {ability} prevents {} from being used!", holder.species, mv.name));
            return;
        }
    }
    resolve_move(ctx, side, mv, false);
}

/// Applicability gate. Logs the reason and returns false when the
/// combatant cannot act this turn.
fn can_act(ctx: &mut TurnContext, side: Side, mv: &MoveData) -> bool {
    let rules = ctx.rules;
    let config = ctx.config;
    let mon = ctx.state.active_mut(side);
    let species = mon.species.clone();
    let ability = ability_of(mon, rules);
    let struggling = same_move(&mv.name, STRUGGLE);

    if mon.remove_volatile(Volatile::MustRecharge) {
        ctx.log.log_cant_move(side, &species, "must recharge!");
        return false;
    }
    if ability.truant {
        if mon.truant_idle {
            mon.truant_idle = false;
            ctx.log.log_cant_move(side, &species, "is loafing around!");
            return false;
        }
        mon.truant_idle = true;
    }
    if mon.status == Some(Status::Sleep) {
        let spent = if ability.fast_wakeup { 2 } else { 1 };
        mon.sleep_turns = mon.sleep_turns.saturating_sub(spent);
        if mon.sleep_turns == 0 {
            mon.clear_status();
            mon.remove_volatile(Volatile::Nightmare);
            ctx.log.log_cant_move(side, &species, "woke up!");
        } else {
            ctx.log.log_cant_move(side, &species, "is fast asleep.");
            return false;
        }
    }
    if mon.status == Some(Status::Freeze) {
        if mv.flags.defrost || ctx.rng.gen::<f64>() < config.thaw_chance {
            mon.clear_status();
            ctx.log.log_cant_move(side, &species, "thawed out!");
        } else {
            ctx.log.log_cant_move(side, &species, "is frozen solid!");
            return false;
        }
    }
    if mon.status == Some(Status::Paralysis) && ctx.rng.gen::<f64>() < config.full_paralysis_chance {
        ctx.log.log_cant_move(side, &species, "is paralyzed! It can't move!");
        return false;
    }
    if mon.has_volatile(Volatile::Flinch) {
        ctx.log.log_cant_move(side, &species, "flinched and couldn't move!");
        return false;
    }
    if let Some(counter) = mon.volatiles.get_mut(&Volatile::Confusion) {
        *counter = counter.saturating_sub(1);
        if *counter == 0 {
            mon.remove_volatile(Volatile::Confusion);
            ctx.log.log_cant_move(side, &species, "snapped out of its confusion!");
        } else {
            ctx.log.log_cant_move(side, &species, "is confused!");
            if ctx.rng.gen::<f64>() < config.confusion_self_hit_chance {
                confusion_hit(ctx, side);
                return false;
            }
        }
    }

    let mon = ctx.state.active(side);
    let name = &mv.name;
    if !struggling {
        if mon.has_volatile(Volatile::Taunt) && mv.category == MoveCategory::Status {
            ctx.log.log_cant_move(side, &species, &format!("can't use {name} after the taunt!"));
            return false;
        }
        if mon.disabled_move.as_deref().is_some_and(|d| same_move(d, name)) {
            ctx.log.log_cant_move(side, &species, &format!("can't use {name} because it is disabled!"));
            return false;
        }
        if let Some(encore) = mon.encore_move.as_deref() {
            if !same_move(encore, name) {
                ctx.log.log_cant_move(side, &species, &format!("must use {encore} due to the encore!"));
                return false;
            }
        }
        if mon.has_volatile(Volatile::HealBlock) && mv.flags.heal {
            ctx.log.log_cant_move(side, &species, &format!("can't use {name} because of Heal Block!"));
            return false;
        }
        if mon.has_volatile(Volatile::Torment) && mon.last_move.as_deref().is_some_and(|last| same_move(last, name)) {
            ctx.log.log_cant_move(side, &species, &format!("can't use {name} twice in a row due to the torment!"));
            return false;
        }
    }
    if mon.has_volatile(Volatile::Attract) && ctx.rng.gen::<f64>() < config.infatuation_chance {
        ctx.log.log_cant_move(side, &species, "is immobilized by love!");
        return false;
    }
    if !struggling && item_of(mon, rules).choice_lock {
        if let Some(locked) = mon.choice_lock.as_deref() {
            if !same_move(locked, name) {
                ctx.log.log_cant_move(side, &species, &format!("is locked into {locked}!"));
                return false;
            }
        }
    }
    true
}

/// 40-power typeless physical hit against itself.
fn confusion_hit(ctx: &mut TurnContext, side: Side) {
    let field = ctx.state.field.clone();
    let mon = ctx.state.active(side);
    let attack = effective_stat(mon, Stat::Atk, &field, side, ctx.rules);
    let defense = effective_stat(mon, Stat::Def, &field, side, ctx.rules);
    let base = compute_base_damage(mon.level, attack, defense, 40);
    let roll = ctx.rng.gen_range(85..=100u32);
    let damage = ((base * roll / 100).max(1)).min(u16::MAX as u32) as u16;

    let mon = ctx.state.active_mut(side);
    let dealt = mon.take_damage(damage);
    ctx.log.push("It hurt itself in its confusion!");
    ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
    if mon.is_fainted() {
        ctx.log.log_faint(&mon.species);
    }
}

/// Success chance is `consecutive_protect_success ^ protect_counter`.
fn use_protection(ctx: &mut TurnContext, side: Side, mv: &MoveData) {
    let kind = match &mv.effect {
        Some(MoveEffect::Volatile { protect, .. }) => protect.unwrap_or_default(),
        _ => ProtectKind::Plain,
    };
    let mon = ctx.state.active_mut(side);
    let chance = ctx.config.consecutive_protect_success.powi(mon.protect_counter as i32);
    let succeeded = mon.protect_counter == 0 || ctx.rng.gen::<f64>() < chance;
    if !succeeded {
        mon.protect_counter = 0;
        ctx.log.log_fail();
        return;
    }
    mon.protect_counter = mon.protect_counter.saturating_add(1);
    mon.add_volatile(Volatile::Protect, 0);
    ctx.state.field.protected[side.index()] = Some(kind);
    let species = ctx.state.active(side).species.clone();
    ctx.log.push(format!("[{}] {species} protected itself!", side.label()));
}

/// Target gate followed by effect resolution. Re-entered with the sides
/// swapped when a status move is reflected.
pub(crate) fn resolve_move(ctx: &mut TurnContext, side: Side, mv: &MoveData, reflected: bool) {
    let foe = side.opponent();
    let rules = ctx.rules;
    let aimed = targets_opponent(mv);

    if aimed {
        let defender = ctx.state.active(foe);
        if defender.is_fainted() {
            ctx.log.push("But there was no target...");
            return;
        }
        if let Some(kind) = ctx.state.field.protected[foe.index()] {
            if mv.flags.protect && protection_blocks(kind, mv) {
                ctx.log.push(format!("[{}] {} protected itself!", foe.label(), defender.species));
                if mv.flags.contact {
                    punish_contact(ctx, side, kind);
                }
                return;
            }
        }
        if defender.has_volatile(Volatile::SemiInvulnerable) {
            ctx.log.push(format!("{} avoided the attack!", defender.species));
            return;
        }
        if !mv.is_damaging() && defender.has_volatile(Volatile::Substitute) && !mv.flags.sound {
            ctx.log.log_fail();
            return;
        }
    }

    if !reflected && !mv.is_damaging() && mv.flags.reflectable {
        let defender = ctx.state.active(foe);
        let ignores = ability_of(ctx.state.active(side), rules).ignores_abilities;
        let bounces = defender.has_volatile(Volatile::MagicCoat)
            || (!ignores && ability_of(defender, rules).reflects_status);
        if bounces && !defender.is_fainted() {
            ctx.log.push(format!("{} bounced the {} back!", defender.species, mv.name));
            resolve_move(ctx, foe, mv, true);
            return;
        }
    }

    if aimed {
        if !type_gate(ctx, side, mv) {
            return;
        }
        let hits = {
            let field = &ctx.state.field;
            check_accuracy(ctx.state.active(side), ctx.state.active(foe), mv, field, rules, ctx.rng)
        };
        if !hits {
            let species = ctx.state.active(side).species.clone();
            ctx.log.push(format!("[{}] {species}'s attack missed!", side.label()));
            return;
        }
    }

    if mv.is_damaging() {
        resolve_damaging(ctx, side, mv);
    } else {
        resolve_status(ctx, side, mv);
    }
}

/// King's Shield, Obstruct and Silk Trap only stop damaging moves.
fn protection_blocks(kind: ProtectKind, mv: &MoveData) -> bool {
    match kind {
        ProtectKind::KingsShield | ProtectKind::Obstruct | ProtectKind::SilkTrap => mv.is_damaging(),
        ProtectKind::Plain | ProtectKind::SpikyShield | ProtectKind::BanefulBunker => true,
    }
}

fn punish_contact(ctx: &mut TurnContext, side: Side, kind: ProtectKind) {
    let drop: BTreeMap<Stat, i8> = match kind {
        ProtectKind::KingsShield => [(Stat::Atk, -1)].into_iter().collect(),
        ProtectKind::Obstruct => [(Stat::Def, -2)].into_iter().collect(),
        ProtectKind::SilkTrap => [(Stat::Spe, -1)].into_iter().collect(),
        ProtectKind::SpikyShield => {
            let mon = ctx.state.active_mut(side);
            if !ability_of(mon, ctx.rules).no_indirect_damage {
                let dealt = mon.take_damage(mon.fraction_of_max(1.0 / 8.0));
                ctx.log.push(format!("{} was hurt by the spiky shield!", mon.species));
                ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
                if mon.is_fainted() {
                    ctx.log.log_faint(&mon.species);
                }
            }
            return;
        }
        ProtectKind::BanefulBunker => {
            let field = ctx.state.field.clone();
            let attempt = StatusAttempt {
                from_opponent: true,
                ignores_abilities: false,
            };
            inflict_status(ctx.state.active_mut(side), Status::Poison, side, &field, attempt, ctx.rules, ctx.rng, ctx.log);
            return;
        }
        ProtectKind::Plain => return,
    };
    let mist = ctx.state.field.sides[side.index()].mist > 0;
    let outcome = apply_boosts(ctx.state.active_mut(side), &drop, BoostSource::Opponent, mist, ctx.rules, ctx.log);
    if let Some(reaction) = outcome.reaction {
        apply_stat_drop_reaction(ctx.state, side, reaction, ctx.rules, ctx.log);
    }
}

/// Type and ability immunities. Absorbing abilities heal their holder.
fn type_gate(ctx: &mut TurnContext, side: Side, mv: &MoveData) -> bool {
    let foe = side.opponent();
    let rules = ctx.rules;
    let ignores = ability_of(ctx.state.active(side), rules).ignores_abilities;

    let absorbing = effects_of(ctx.state.active(foe), rules)
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !(ignores && *idx == 0))
        .map(|(_, effect)| effect)
        .find(|effect| effect.type_immunities.contains(&mv.move_type));
    if let Some(effect) = absorbing.filter(|_| mv.move_type != Type::Typeless) {
        let defender = ctx.state.active_mut(foe);
        match effect.immunity_heal {
            Some(ratio) if !defender.is_full_hp() => {
                let healed = defender.heal(defender.fraction_of_max(ratio));
                ctx.log.push(format!("{}'s {} restored its HP!", defender.species, effect.name));
                ctx.log.log_heal(&defender.species, healed, defender.current_hp, defender.max_hp());
            }
            _ => ctx.log.push(format!("{}'s {} made it immune!", defender.species, effect.name)),
        }
        return false;
    }

    let attacker = ctx.state.active(side);
    let defender = ctx.state.active(foe);
    if !mv.is_damaging() && !ignores && ability_of(defender, rules).blocks_status_moves {
        ctx.log.push(format!("It doesn't affect {}...", defender.species));
        return false;
    }
    if mv.is_damaging() && move_effectiveness(mv, attacker, defender, &ctx.state.field, rules) == 0.0 {
        ctx.log.push(format!("It doesn't affect {}...", defender.species));
        return false;
    }
    true
}
