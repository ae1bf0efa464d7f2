use crate::battle_log::BattleLog;
use crate::data::effects::StatDropReaction;
use crate::data::RuleData;
use crate::sim::combatant::Combatant;
use crate::sim::resolver::{ability_of, item_of};
use crate::sim::stats::Stat;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoostSource {
    /// The combatant's own move or passive.
    Own,
    /// An opposing move or ability.
    Opponent,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoostOutcome {
    /// Stage deltas that actually landed, after clamping.
    pub applied: Vec<(Stat, i8)>,
    /// Held-item reaction the engine must resolve afterwards.
    pub reaction: Option<StatDropReaction>,
}

impl BoostOutcome {
    pub fn lowered_any(&self) -> bool {
        self.applied.iter().any(|(_, delta)| *delta < 0)
    }
}

fn describe(delta: i8) -> &'static str {
    match delta {
        d if d >= 3 => "rose drastically",
        2 => "rose sharply",
        1 => "rose",
        -1 => "fell",
        -2 => "harshly fell",
        _ => "severely fell",
    }
}

/// Mutates stages with clamping, honoring inversion and drop-blocking
/// abilities. Mist blocks opponent-sourced drops.
pub fn apply_boosts(
    mon: &mut Combatant,
    boosts: &BTreeMap<Stat, i8>,
    source: BoostSource,
    mist: bool,
    rules: &RuleData,
    log: &mut BattleLog,
) -> BoostOutcome {
    let mut outcome = BoostOutcome::default();
    if mon.is_fainted() {
        return outcome;
    }
    let ability = ability_of(mon, rules);
    for (&stat, &raw) in boosts {
        let delta = if ability.invert_boosts { -raw } else { raw };
        if delta == 0 {
            continue;
        }
        if delta < 0 && source == BoostSource::Opponent {
            if mist {
                log.push(format!("{} is protected by the mist!", mon.species));
                continue;
            }
            if ability.block_stat_drops || ability.protected_stats.contains(&stat) {
                log.push(format!(
                    "{}'s {} prevents its {} from being lowered!",
                    mon.species, ability.name, stat
                ));
                continue;
            }
        }
        let current = mon.stage(stat);
        let next = mon.stages.set(stat, current.saturating_add(delta));
        let landed = next - current;
        if landed == 0 {
            let direction = if delta > 0 { "higher" } else { "lower" };
            log.push(format!("{}'s {} won't go any {direction}!", mon.species, stat));
            continue;
        }
        log.push(format!("{}'s {} {}!", mon.species, stat, describe(landed)));
        outcome.applied.push((stat, landed));
    }
    if outcome.lowered_any() {
        outcome.reaction = item_of(mon, rules).stat_drop_reaction;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::effects::EffectData;
    use crate::data::types::Type;
    use crate::sim::resolver::test_support::make_mon;

    fn boosts(entries: &[(Stat, i8)]) -> BTreeMap<Stat, i8> {
        entries.iter().copied().collect()
    }

    #[test]
    fn stages_clamp_and_log_caps() {
        let rules = RuleData::new();
        let mut mon = make_mon(vec![Type::Normal]);
        let mut log = BattleLog::new();
        apply_boosts(&mut mon, &boosts(&[(Stat::Atk, 6)]), BoostSource::Own, false, &rules, &mut log);
        let outcome = apply_boosts(&mut mon, &boosts(&[(Stat::Atk, 2)]), BoostSource::Own, false, &rules, &mut log);
        assert_eq!(mon.stage(Stat::Atk), 6);
        assert!(outcome.applied.is_empty());
        assert!(log.lines().last().is_some_and(|l| l.contains("won't go any higher")));
    }

    #[test]
    fn contrary_inverts() {
        let rules = RuleData::new().with_ability(EffectData {
            invert_boosts: true,
            ..EffectData::named("Contrary")
        });
        let mut mon = make_mon(vec![Type::Grass]).with_ability("Contrary");
        let mut log = BattleLog::new();
        apply_boosts(&mut mon, &boosts(&[(Stat::Spa, -2)]), BoostSource::Own, false, &rules, &mut log);
        assert_eq!(mon.stage(Stat::Spa), 2);
    }

    #[test]
    fn clear_body_and_hyper_cutter_block_opponent_drops() {
        let rules = RuleData::new()
            .with_ability(EffectData {
                block_stat_drops: true,
                ..EffectData::named("Clear Body")
            })
            .with_ability(EffectData {
                protected_stats: vec![Stat::Atk],
                ..EffectData::named("Hyper Cutter")
            });
        let mut log = BattleLog::new();
        let mut body = make_mon(vec![Type::Steel]).with_ability("Clear Body");
        apply_boosts(&mut body, &boosts(&[(Stat::Def, -1)]), BoostSource::Opponent, false, &rules, &mut log);
        assert_eq!(body.stage(Stat::Def), 0);
        apply_boosts(&mut body, &boosts(&[(Stat::Def, -1)]), BoostSource::Own, false, &rules, &mut log);
        assert_eq!(body.stage(Stat::Def), -1);

        let mut cutter = make_mon(vec![Type::Water]).with_ability("Hyper Cutter");
        apply_boosts(
            &mut cutter,
            &boosts(&[(Stat::Atk, -1), (Stat::Def, -1)]),
            BoostSource::Opponent,
            false,
            &rules,
            &mut log,
        );
        assert_eq!(cutter.stage(Stat::Atk), 0);
        assert_eq!(cutter.stage(Stat::Def), -1);
    }

    #[test]
    fn drops_raise_item_reaction() {
        let rules = RuleData::new().with_item(EffectData {
            stat_drop_reaction: Some(StatDropReaction::RestoreStages),
            single_use: true,
            ..EffectData::named("White Herb")
        });
        let mut mon = make_mon(vec![Type::Normal]).with_item("White Herb");
        let mut log = BattleLog::new();
        let outcome = apply_boosts(&mut mon, &boosts(&[(Stat::Def, -1)]), BoostSource::Opponent, true, &rules, &mut log);
        assert_eq!(outcome.reaction, None);
        let outcome = apply_boosts(&mut mon, &boosts(&[(Stat::Def, -1)]), BoostSource::Opponent, false, &rules, &mut log);
        assert_eq!(outcome.reaction, Some(StatDropReaction::RestoreStages));
    }
}
