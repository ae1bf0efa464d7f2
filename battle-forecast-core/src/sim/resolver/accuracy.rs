use crate::data::effects::Hook;
use crate::data::moves::MoveData;
use crate::data::RuleData;
use crate::sim::combatant::{Combatant, Volatile};
use crate::sim::field::Field;
use crate::sim::resolver::modifier::{hook_value, ConditionContext};
use crate::sim::resolver::{ability_of, item_of};
use crate::sim::stats::{accuracy_multiplier, Stat};
use rand::rngs::SmallRng;
use rand::Rng;

/// Hit chance in percent, or `None` when the move cannot miss.
pub fn hit_chance(
    attacker: &Combatant,
    defender: &Combatant,
    mv: &MoveData,
    field: &Field,
    rules: &RuleData,
) -> Option<f32> {
    let accuracy = mv.accuracy?;
    if ability_of(attacker, rules).always_hit || ability_of(defender, rules).always_hit {
        return None;
    }
    let mut chance = accuracy as f32;
    if !mv.ohko {
        let mut evasion = defender.stage(Stat::Evasion);
        if defender.has_volatile(Volatile::Identified) {
            evasion = evasion.min(0);
        }
        let stage = (attacker.stage(Stat::Accuracy) as i16 - evasion as i16).clamp(-6, 6) as i8;
        chance *= accuracy_multiplier(stage);

        let own = ConditionContext {
            owner: attacker,
            field,
            mv: Some(mv),
            effectiveness: None,
            target: Some(defender),
        };
        chance *= hook_value(ability_of(attacker, rules), Hook::Accuracy, &own);
        chance *= hook_value(item_of(attacker, rules), Hook::Accuracy, &own);

        let theirs = ConditionContext {
            owner: defender,
            target: Some(attacker),
            ..own
        };
        if !ability_of(attacker, rules).ignores_abilities {
            chance *= hook_value(ability_of(defender, rules), Hook::Evasion, &theirs);
        }
        chance *= hook_value(item_of(defender, rules), Hook::Evasion, &theirs);
    }
    if field.gravity_active() {
        chance *= 5.0 / 3.0;
    }
    Some(chance)
}

pub fn check_accuracy(
    attacker: &Combatant,
    defender: &Combatant,
    mv: &MoveData,
    field: &Field,
    rules: &RuleData,
    rng: &mut SmallRng,
) -> bool {
    match hit_chance(attacker, defender, mv, field, rules) {
        None => true,
        Some(chance) if chance >= 100.0 => true,
        Some(chance) => rng.gen::<f32>() * 100.0 < chance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::effects::{Condition, EffectData};
    use crate::data::moves::MoveCategory;
    use crate::data::types::Type;
    use crate::sim::resolver::test_support::make_mon;
    use rand::SeedableRng;

    fn hypnosis() -> MoveData {
        MoveData::new("Hypnosis", Type::Psychic, MoveCategory::Status, 0).with_accuracy(Some(60))
    }

    #[test]
    fn no_guard_and_null_accuracy_always_hit() {
        let rules = RuleData::new().with_ability(EffectData {
            always_hit: true,
            ..EffectData::named("No Guard")
        });
        let field = Field::default();
        let attacker = make_mon(vec![Type::Psychic]);
        let defender = make_mon(vec![Type::Normal]).with_ability("No Guard");
        assert_eq!(hit_chance(&attacker, &defender, &hypnosis(), &field, &rules), None);
        let swift = MoveData::new("Swift", Type::Normal, MoveCategory::Special, 60).with_accuracy(None);
        let plain = make_mon(vec![Type::Normal]);
        assert_eq!(hit_chance(&attacker, &plain, &swift, &field, &rules), None);
    }

    #[test]
    fn stages_and_lens_multiply() {
        let rules = RuleData::new().with_item(
            EffectData::named("Wide Lens").with_modifier(Hook::Accuracy, 1.1),
        );
        let field = Field::default();
        let mut attacker = make_mon(vec![Type::Psychic]).with_item("Wide Lens");
        let mut defender = make_mon(vec![Type::Normal]);
        attacker.stages.set(Stat::Accuracy, 1);
        defender.stages.set(Stat::Evasion, 4);
        let chance = hit_chance(&attacker, &defender, &hypnosis(), &field, &rules).unwrap_or(0.0);
        assert!((chance - 60.0 * 0.5 * 1.1).abs() < 1e-3);
    }

    #[test]
    fn sand_veil_only_in_sand() {
        let rules = RuleData::new().with_ability(
            EffectData::named("Sand Veil")
                .with_modifier(Hook::Evasion, 0.8)
                .with_condition(Condition {
                    weather: vec![crate::sim::field::Weather::Sand],
                    ..Condition::default()
                }),
        );
        let mut field = Field::default();
        let attacker = make_mon(vec![Type::Psychic]);
        let defender = make_mon(vec![Type::Ground]).with_ability("Sand Veil");
        assert_eq!(hit_chance(&attacker, &defender, &hypnosis(), &field, &rules), Some(60.0));
        field.set_weather(crate::sim::field::Weather::Sand, 5);
        let chance = hit_chance(&attacker, &defender, &hypnosis(), &field, &rules).unwrap_or(0.0);
        assert!((chance - 48.0).abs() < 1e-3);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let rules = RuleData::new();
        let field = Field::default();
        let attacker = make_mon(vec![Type::Psychic]);
        let defender = make_mon(vec![Type::Normal]);
        let rolls = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            (0..20)
                .map(|_| check_accuracy(&attacker, &defender, &hypnosis(), &field, &rules, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(rolls(11), rolls(11));
    }
}
