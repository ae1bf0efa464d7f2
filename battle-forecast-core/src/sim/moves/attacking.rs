use crate::data::effects::ContactReaction;
use crate::data::moves::{MoveData, Secondary};
use crate::sim::battle::Side;
use crate::sim::combatant::Volatile;
use crate::sim::decision::STRUGGLE;
use crate::sim::damage::{chain_multiplier, scale_roll, DamagePreview, DamageRequest, ROLL_COUNT};
use crate::sim::moves::drag_out;
use crate::sim::moves::status::volatile_message;
use crate::sim::resolver::ailment::{inflict_status, StatusAttempt};
use crate::sim::resolver::boosts::{apply_boosts, BoostSource};
use crate::sim::resolver::modifier::MoveContext;
use crate::sim::resolver::residual::trigger_pinch_item;
use crate::sim::resolver::{ability_of, effects_of, item_of};
use crate::sim::stats::Stat;
use crate::sim::switching::apply_stat_drop_reaction;
use crate::sim::turn::TurnContext;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

/// Determine the number of hits for a multi-hit move. The 2-5 spread is
/// weighted 35/35/15/15.
pub fn multihit_count(mv: &MoveData, maximize: bool, rng: &mut SmallRng) -> u8 {
    let Some([min_hits, max_hits]) = mv.multihit else {
        return 1;
    };
    if min_hits >= max_hits {
        return min_hits.max(1);
    }
    if maximize {
        return max_hits;
    }
    if min_hits == 2 && max_hits == 5 {
        let roll = rng.gen_range(0..20);
        return match roll {
            0..=6 => 2,
            7..=13 => 3,
            14..=16 => 4,
            _ => 5,
        };
    }
    rng.gen_range(min_hits..=max_hits)
}

/// Critical hit roll for the given stage: 1/24, 1/8, 1/2, then always.
pub fn roll_crit(stage: u8, rng: &mut SmallRng) -> bool {
    match stage {
        0 => rng.gen_ratio(1, 24),
        1 => rng.gen_ratio(1, 8),
        2 => rng.gen_ratio(1, 2),
        _ => true,
    }
}

/// What one hit did to the defender.
#[derive(Clone, Copy, Debug, Default)]
struct HitResult {
    dealt: u16,
    substitute: bool,
}

/// Damaging-move pipeline: rolls, resolver chain, hits, then riders and
/// post-hit bookkeeping on both sides.
pub(crate) fn resolve_damaging(ctx: &mut TurnContext, side: Side, mv: &MoveData) {
    let foe = side.opponent();
    let preview = {
        let request = DamageRequest {
            attacker: ctx.state.active(side),
            defender: ctx.state.active(foe),
            field: &ctx.state.field,
            attacker_side: side,
            rules: ctx.rules,
        };
        ctx.calc.damage_rolls(&request, &[mv]).into_iter().next()
    };
    let Some(preview) = preview else {
        tracing::warn!(move_name = %mv.name, "damage calculator returned no data");
        ctx.log.log_fail();
        return;
    };
    if preview.effectiveness == 0.0 {
        ctx.log.push(format!("It doesn't affect {}...", ctx.state.active(foe).species));
        return;
    }

    let maximize = effects_of(ctx.state.active(side), ctx.rules)
        .iter()
        .any(|effect| effect.maximize_hits);
    let hits = multihit_count(mv, maximize, ctx.rng);
    let mut total = 0u16;
    let mut landed = 0u8;
    let mut connected = false;
    for _ in 0..hits {
        if ctx.state.active(side).is_fainted() || ctx.state.active(foe).is_fainted() {
            break;
        }
        let hit = land_hit(ctx, side, mv, &preview);
        landed += 1;
        total = total.saturating_add(hit.dealt);
        if !hit.substitute {
            connected = true;
            if mv.flags.contact {
                contact_reactions(ctx, side);
            }
        }
    }
    if landed > 0 && preview.effectiveness > 1.0 {
        ctx.log.push("It's super effective!");
    } else if landed > 0 && preview.effectiveness < 1.0 {
        ctx.log.push("It's not very effective...");
    }
    if mv.multihit.is_some() {
        let plural = if landed == 1 { "" } else { "s" };
        ctx.log.push(format!("Hit {landed} time{plural}!"));
    }

    after_damage(ctx, side, mv, total, connected);
}

fn land_hit(ctx: &mut TurnContext, side: Side, mv: &MoveData, preview: &DamagePreview) -> HitResult {
    let foe = side.opponent();
    let index = ctx.rng.gen_range(0..ROLL_COUNT);
    let focus = if ctx.state.active(side).has_volatile(Volatile::FocusEnergy) { 2 } else { 0 };
    let crit = !mv.ohko && roll_crit(mv.crit_stage + focus, ctx.rng);
    let rolls = if crit { &preview.crit_rolls } else { &preview.damage_rolls };
    let raw = rolls.get(index).copied().unwrap_or(0);

    let mut damage = if mv.ohko {
        ctx.state.active(foe).current_hp
    } else if mv.fixed_damage.is_some() || mv.level_damage {
        raw
    } else {
        let move_ctx = MoveContext {
            mv,
            attacker: ctx.state.active(side),
            defender: ctx.state.active(foe),
            ally: None,
            field: &ctx.state.field,
            effectiveness: preview.effectiveness,
            crit,
        };
        scale_roll(raw, chain_multiplier(&move_ctx, foe, ctx.rules))
    };
    if crit && damage > 0 {
        ctx.log.push("A critical hit!");
    }
    if mv.ohko {
        ctx.log.push("It's a one-hit KO!");
    }

    let rules = ctx.rules;
    let defender = ctx.state.active_mut(foe);
    if defender.has_volatile(Volatile::Substitute) && !mv.flags.sound {
        let absorbed = damage.min(defender.substitute_hp);
        defender.substitute_hp -= absorbed;
        if defender.substitute_hp == 0 {
            defender.remove_volatile(Volatile::Substitute);
            ctx.log.push(format!("{}'s substitute faded!", defender.species));
        } else {
            ctx.log.push(format!("The substitute took damage for {}!", defender.species));
        }
        return HitResult {
            dealt: absorbed,
            substitute: true,
        };
    }

    if defender.is_full_hp() && damage >= defender.current_hp {
        let ability = ability_of(defender, rules);
        let item = item_of(defender, rules);
        if ability.endure_at_full {
            damage = defender.current_hp - 1;
            ctx.log.push(format!("{} endured the hit with its {}!", defender.species, ability.name));
        } else if item.endure_at_full {
            damage = defender.current_hp - 1;
            ctx.log.push(format!("{} hung on using its {}!", defender.species, item.name));
            if item.single_use {
                defender.consume_item();
            }
        }
    }
    let dealt = defender.take_damage(damage);
    ctx.log.log_damage(&defender.species, dealt, defender.current_hp, defender.max_hp());
    HitResult {
        dealt,
        substitute: false,
    }
}

/// Contact punishes the attacker through the defender's ability and item,
/// and the defender through the attacker's ability.
fn contact_reactions(ctx: &mut TurnContext, side: Side) {
    let foe = side.opponent();
    let defender = ctx.state.active(foe);
    let reactions: Vec<(ContactReaction, Side)> = effects_of(defender, ctx.rules)
        .iter()
        .filter_map(|effect| effect.contact_reaction.clone())
        .map(|reaction| (reaction, side))
        .chain(
            ability_of(ctx.state.active(side), ctx.rules)
                .contact_reaction
                .clone()
                .map(|reaction| (reaction, foe)),
        )
        .collect();
    for (reaction, target) in reactions {
        apply_contact_reaction(ctx, &reaction, target);
    }
}

fn apply_contact_reaction(ctx: &mut TurnContext, reaction: &ContactReaction, target: Side) {
    if ctx.state.active(target).is_fainted() {
        return;
    }
    if reaction.chance < 100 && ctx.rng.gen_range(0..100u8) >= reaction.chance {
        return;
    }
    let rules = ctx.rules;
    let field = ctx.state.field.clone();
    if let Some(status) = reaction.status {
        let attempt = StatusAttempt {
            from_opponent: true,
            ignores_abilities: false,
        };
        inflict_status(ctx.state.active_mut(target), status, target, &field, attempt, rules, ctx.rng, ctx.log);
    }
    if let Some(volatile) = reaction.volatile {
        let mon = ctx.state.active_mut(target);
        if mon.add_volatile(volatile, volatile.initial_counter()) {
            ctx.log.push(volatile_message(volatile, &mon.species));
        }
    }
    if let Some(ratio) = reaction.damage {
        let mon = ctx.state.active_mut(target);
        if !ability_of(mon, rules).no_indirect_damage {
            let dealt = mon.take_damage(mon.fraction_of_max(ratio));
            ctx.log.push(format!("{} was hurt!", mon.species));
            ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }
    }
    if !reaction.boosts.is_empty() {
        let mist = field.sides[target.index()].mist > 0;
        let outcome = apply_boosts(
            ctx.state.active_mut(target),
            &reaction.boosts,
            BoostSource::Opponent,
            mist,
            rules,
            ctx.log,
        );
        if let Some(drop) = outcome.reaction {
            apply_stat_drop_reaction(ctx.state, target, drop, rules, ctx.log);
        }
    }
}

fn after_damage(ctx: &mut TurnContext, side: Side, mv: &MoveData, total: u16, connected: bool) {
    let foe = side.opponent();
    let rules = ctx.rules;

    if ctx.state.active(foe).is_fainted() {
        let (attacker, defender) = ctx.state.actives_mut(side);
        ctx.log.log_faint(&defender.species);
        if defender.has_volatile(Volatile::DestinyBond) && !attacker.is_fainted() {
            attacker.current_hp = 0;
            ctx.log.push(format!("{} took its attacker down with it!", defender.species));
            ctx.log.log_faint(&attacker.species);
        }
        for effect in effects_of(ctx.state.active(side), rules) {
            if !effect.ko_boosts.is_empty() {
                apply_boosts(ctx.state.active_mut(side), &effect.ko_boosts, BoostSource::Own, false, rules, ctx.log);
            }
        }
    } else if connected {
        trigger_pinch_item(ctx.state.active_mut(foe), rules, ctx.log);
    }

    if connected && total > 0 {
        apply_secondaries(ctx, side, mv);
    }
    if total > 0 && !mv.self_boosts.is_empty() {
        boost_with_reaction(ctx, side, &mv.self_boosts, BoostSource::Own);
    }
    user_bookkeeping(ctx, side, mv, total);

    let attacker = ctx.state.active(side);
    if !attacker.is_fainted() {
        if mv.self_switch && ctx.state.party(side).has_replacement() {
            ctx.state.active_mut(side).must_switch = true;
        }
        if mv.flags.recharge && total > 0 {
            ctx.state.active_mut(side).add_volatile(Volatile::MustRecharge, 0);
        }
    }
    if mv.force_switch && total > 0 && !ctx.state.active(foe).is_fainted() {
        drag_out(ctx, foe);
    }
}

/// Chance-based riders. Serene Grace-like abilities scale the chance,
/// Sheer Force-like abilities drop them entirely, and a Shield Dust-like
/// defender blocks the parts aimed at it.
fn apply_secondaries(ctx: &mut TurnContext, side: Side, mv: &MoveData) {
    let foe = side.opponent();
    let rules = ctx.rules;
    let attacker_ability = ability_of(ctx.state.active(side), rules);
    if attacker_ability.suppress_secondaries {
        return;
    }
    let multiplier = attacker_ability.secondary_chance_multiplier.unwrap_or(1.0);
    let shielded = (!attacker_ability.ignores_abilities && ability_of(ctx.state.active(foe), rules).block_secondaries)
        || item_of(ctx.state.active(foe), rules).block_secondaries;

    for secondary in &mv.secondaries {
        let chance = (secondary.chance as f32 * multiplier).min(100.0);
        if chance < 100.0 && ctx.rng.gen::<f32>() * 100.0 >= chance {
            continue;
        }
        if !shielded && !ctx.state.active(foe).is_fainted() {
            apply_secondary_to_target(ctx, side, secondary);
        }
        if !secondary.self_boosts.is_empty() {
            boost_with_reaction(ctx, side, &secondary.self_boosts, BoostSource::Own);
        }
    }
}

fn apply_secondary_to_target(ctx: &mut TurnContext, side: Side, secondary: &Secondary) {
    let foe = side.opponent();
    let rules = ctx.rules;
    let attempt = StatusAttempt::by(ctx.state.active(side), rules);
    if let Some(status) = secondary.status {
        let field = ctx.state.field.clone();
        inflict_status(ctx.state.active_mut(foe), status, foe, &field, attempt, rules, ctx.rng, ctx.log);
    }
    if let Some(volatile) = secondary.volatile {
        let immune = effects_of(ctx.state.active(foe), rules)
            .iter()
            .enumerate()
            .filter(|(idx, _)| !(attempt.ignores_abilities && *idx == 0))
            .any(|(_, effect)| effect.volatile_immunities.contains(&volatile));
        let counter = match volatile {
            Volatile::Confusion => ctx.rng.gen_range(2..=5),
            other => other.initial_counter(),
        };
        let mon = ctx.state.active_mut(foe);
        if !immune && mon.add_volatile(volatile, counter) && volatile != Volatile::Flinch {
            ctx.log.push(volatile_message(volatile, &mon.species));
        }
    }
    if !secondary.boosts.is_empty() {
        boost_with_reaction(ctx, foe, &secondary.boosts, BoostSource::Opponent);
    }
}

fn boost_with_reaction(ctx: &mut TurnContext, target: Side, boosts: &BTreeMap<Stat, i8>, source: BoostSource) {
    let mist = source == BoostSource::Opponent && ctx.state.field.sides[target.index()].mist > 0;
    let outcome = apply_boosts(ctx.state.active_mut(target), boosts, source, mist, ctx.rules, ctx.log);
    if let Some(reaction) = outcome.reaction {
        apply_stat_drop_reaction(ctx.state, target, reaction, ctx.rules, ctx.log);
    }
}

/// Drain, recoil, self-damage, life-orb recoil and self-destruction.
fn user_bookkeeping(ctx: &mut TurnContext, side: Side, mv: &MoveData, total: u16) {
    let rules = ctx.rules;
    let mon = ctx.state.active_mut(side);
    if mon.is_fainted() {
        return;
    }
    let guarded = ability_of(mon, rules).no_indirect_damage;

    if let Some(ratio) = mv.drain {
        if total > 0 && !mon.has_volatile(Volatile::HealBlock) {
            let healed = mon.heal(fraction_of(total, ratio));
            ctx.log.push(format!("{} had its energy drained!", mon.species));
            ctx.log.log_heal(&mon.species, healed, mon.current_hp, mon.max_hp());
        }
    }
    if let Some(ratio) = mv.recoil {
        if total > 0 && !guarded {
            let dealt = mon.take_damage(fraction_of(total, ratio));
            ctx.log.push(format!("{} is damaged by the recoil!", mon.species));
            ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }
    }
    if let Some(ratio) = mv.self_damage {
        if !guarded || mv.name == STRUGGLE {
            let dealt = mon.take_damage(mon.fraction_of_max(ratio));
            ctx.log.push(format!("{} lost some of its HP!", mon.species));
            ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }
    }
    if let Some(ratio) = item_of(mon, rules).attack_recoil {
        if total > 0 && !guarded && !mon.is_fainted() {
            let dealt = mon.take_damage(mon.fraction_of_max(ratio));
            ctx.log.push(format!("{} lost some of its HP!", mon.species));
            ctx.log.log_damage(&mon.species, dealt, mon.current_hp, mon.max_hp());
        }
    }
    if mv.self_destruct {
        mon.current_hp = 0;
    }
    if mon.is_fainted() {
        ctx.log.log_faint(&mon.species);
    }
}

/// `ratio` of damage dealt, rounded, at least 1.
fn fraction_of(total: u16, ratio: f32) -> u16 {
    ((total as f32 * ratio).round() as u16).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle_log::BattleLog;
    use crate::data::effects::EffectData;
    use crate::data::moves::{MoveCategory, MoveFlags};
    use crate::data::types::Type;
    use crate::data::RuleData;
    use crate::engine::EngineConfig;
    use crate::sim::battle::{BattleState, Party};
    use crate::sim::combatant::{Combatant, Status};
    use crate::sim::damage::LocalDamageCalc;
    use crate::sim::stats::StatBlock;
    use rand::SeedableRng;

    fn make_mon(species: &str, types: Vec<Type>) -> Combatant {
        Combatant::new(species, 50, types, StatBlock::new(160, 100, 100, 100, 100, 100)).with_moves(["Tackle"])
    }

    fn run(state: &mut BattleState, rules: &RuleData, mv: &MoveData, seed: u64) -> BattleLog {
        let mut rng = SmallRng::seed_from_u64(seed);
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
        resolve_damaging(&mut ctx, Side::Player, mv);
        log
    }

    fn duel() -> BattleState {
        BattleState::new(
            Party::new(vec![make_mon("User", vec![Type::Normal]), make_mon("Reserve", vec![Type::Normal])]),
            Party::new(vec![make_mon("Target", vec![Type::Normal]), make_mon("Backup", vec![Type::Normal])]),
        )
    }

    #[test]
    fn multihit_distribution_and_skill_link() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mv = MoveData {
            multihit: Some([2, 5]),
            ..MoveData::new("Bullet Seed", Type::Grass, MoveCategory::Physical, 25)
        };
        for _ in 0..50 {
            assert!((2..=5).contains(&multihit_count(&mv, false, &mut rng)));
        }
        assert_eq!(multihit_count(&mv, true, &mut rng), 5);
        let fixed = MoveData {
            multihit: Some([2, 2]),
            ..MoveData::new("Double Kick", Type::Fighting, MoveCategory::Physical, 30)
        };
        assert_eq!(multihit_count(&fixed, false, &mut rng), 2);
    }

    #[test]
    fn high_crit_stages_always_crit() {
        let mut rng = SmallRng::seed_from_u64(5);
        assert!((0..20).all(|_| roll_crit(3, &mut rng)));
    }

    #[test]
    fn pivot_sets_must_switch_after_damage() {
        let rules = RuleData::new();
        let mut state = duel();
        let u_turn = MoveData {
            self_switch: true,
            ..MoveData::new("U-turn", Type::Bug, MoveCategory::Physical, 70)
        };
        run(&mut state, &rules, &u_turn, 1);
        assert!(state.active(Side::Ai).current_hp < 160);
        assert!(state.active(Side::Player).must_switch);
    }

    #[test]
    fn dragon_tail_drags_in_the_backup() {
        let rules = RuleData::new();
        let mut state = duel();
        let tail = MoveData {
            force_switch: true,
            ..MoveData::new("Dragon Tail", Type::Dragon, MoveCategory::Physical, 60)
        };
        let log = run(&mut state, &rules, &tail, 2);
        assert_eq!(state.party(Side::Ai).active, 1);
        assert!(state.party(Side::Ai).members[0].current_hp < 160);
        assert!(log.position("was dragged out!").is_some());
    }

    #[test]
    fn recoil_and_drain_follow_damage_dealt() {
        let rules = RuleData::new();
        let mut state = duel();
        let edge = MoveData {
            recoil: Some(1.0 / 3.0),
            ..MoveData::new("Double-Edge", Type::Normal, MoveCategory::Physical, 120)
        };
        run(&mut state, &rules, &edge, 3);
        let dealt = 160 - state.active(Side::Ai).current_hp;
        let recoil = 160 - state.active(Side::Player).current_hp;
        assert_eq!(recoil, fraction_of(dealt, 1.0 / 3.0));

        let mut state = duel();
        state.active_mut(Side::Player).current_hp = 10;
        let drain = MoveData {
            drain: Some(0.5),
            ..MoveData::new("Giga Drain", Type::Grass, MoveCategory::Special, 75)
        };
        run(&mut state, &rules, &drain, 3);
        let dealt = 160 - state.active(Side::Ai).current_hp;
        assert_eq!(state.active(Side::Player).current_hp, 10 + fraction_of(dealt, 0.5));
    }

    #[test]
    fn sheer_force_drops_guaranteed_riders() {
        let rules = RuleData::new().with_ability(EffectData {
            suppress_secondaries: true,
            ..EffectData::named("Sheer Force")
        });
        let ember = MoveData::new("Ember", Type::Fire, MoveCategory::Special, 40).with_secondary(Secondary {
            chance: 100,
            status: Some(Status::Burn),
            ..Secondary::default()
        });
        let mut state = duel();
        run(&mut state, &rules, &ember, 4);
        assert_eq!(state.active(Side::Ai).status, Some(Status::Burn));

        let mut state = duel();
        state.active_mut(Side::Player).ability = "Sheer Force".to_string();
        run(&mut state, &rules, &ember, 4);
        assert_eq!(state.active(Side::Ai).status, None);
    }

    #[test]
    fn rough_skin_and_static_punish_contact() {
        let rules = RuleData::new().with_ability(EffectData {
            contact_reaction: Some(ContactReaction {
                chance: 100,
                damage: Some(0.125),
                ..ContactReaction::default()
            }),
            ..EffectData::named("Rough Skin")
        });
        let mut state = duel();
        state.active_mut(Side::Ai).ability = "Rough Skin".to_string();
        let tackle = MoveData::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        run(&mut state, &rules, &tackle, 6);
        assert_eq!(state.active(Side::Player).current_hp, 140);

        let mut state = duel();
        state.active_mut(Side::Ai).ability = "Rough Skin".to_string();
        let swift = MoveData::new("Swift", Type::Normal, MoveCategory::Special, 60).with_flags(MoveFlags {
            protect: true,
            ..MoveFlags::default()
        });
        run(&mut state, &rules, &swift, 6);
        assert_eq!(state.active(Side::Player).current_hp, 160);
    }

    #[test]
    fn sturdy_survives_from_full() {
        let rules = RuleData::new().with_ability(EffectData {
            endure_at_full: true,
            ..EffectData::named("Sturdy")
        });
        let mut state = duel();
        state.active_mut(Side::Ai).ability = "Sturdy".to_string();
        let nuke = MoveData {
            fixed_damage: Some(500),
            ..MoveData::new("Nuke", Type::Normal, MoveCategory::Special, 1)
        };
        let log = run(&mut state, &rules, &nuke, 7);
        assert_eq!(state.active(Side::Ai).current_hp, 1);
        assert!(log.position("endured the hit").is_some());
    }

    #[test]
    fn substitute_absorbs_and_breaks() {
        let rules = RuleData::new();
        let mut state = duel();
        let target = state.active_mut(Side::Ai);
        target.add_volatile(Volatile::Substitute, 0);
        target.substitute_hp = 30;
        let hit = MoveData {
            fixed_damage: Some(50),
            ..MoveData::new("Sonic Boom", Type::Normal, MoveCategory::Special, 1)
        };
        let log = run(&mut state, &rules, &hit, 8);
        let target = state.active(Side::Ai);
        assert_eq!(target.current_hp, 160);
        assert!(!target.has_volatile(Volatile::Substitute));
        assert!(log.position("substitute faded").is_some());
    }

    #[test]
    fn moxie_boosts_on_ko() {
        let rules = RuleData::new().with_ability(EffectData {
            ko_boosts: [(Stat::Atk, 1)].into_iter().collect(),
            ..EffectData::named("Moxie")
        });
        let mut state = duel();
        state.active_mut(Side::Player).ability = "Moxie".to_string();
        state.active_mut(Side::Ai).current_hp = 1;
        let hit = MoveData {
            fixed_damage: Some(20),
            ..MoveData::new("Sonic Boom", Type::Normal, MoveCategory::Special, 1)
        };
        let log = run(&mut state, &rules, &hit, 9);
        assert!(state.active(Side::Ai).is_fainted());
        assert_eq!(state.active(Side::Player).stage(Stat::Atk), 1);
        assert!(log.position("Target fainted!").is_some());
    }
}
