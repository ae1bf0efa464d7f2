use crate::data::effects::{Condition, EffectData, Hook};
use crate::data::moves::{MoveCategory, MoveData};
use crate::data::normalize_id;
use crate::data::types::Type;
use crate::data::RuleData;
use crate::sim::battle::Side;
use crate::sim::combatant::Combatant;
use crate::sim::field::{Field, Terrain, Weather};
use crate::sim::resolver::{ability_of, is_grounded, item_of};

/// What a condition is evaluated against: the effect's owner plus the move in
/// flight, when there is one.
#[derive(Clone, Copy, Debug)]
pub struct ConditionContext<'a> {
    pub owner: &'a Combatant,
    pub field: &'a Field,
    pub mv: Option<&'a MoveData>,
    pub effectiveness: Option<f32>,
    pub target: Option<&'a Combatant>,
}

impl<'a> ConditionContext<'a> {
    /// Context with no move in flight (stat reads and residual effects).
    pub fn passive(owner: &'a Combatant, field: &'a Field) -> Self {
        Self {
            owner,
            field,
            mv: None,
            effectiveness: None,
            target: None,
        }
    }
}

/// Single applicability predicate for ability, item and move conditions.
/// Move-specific requirements fail when no move is in flight.
pub fn condition_applies(cond: &Condition, ctx: &ConditionContext) -> bool {
    let needs_move = !cond.move_types.is_empty()
        || cond.category.is_some()
        || cond.flag.is_some()
        || cond.max_power.is_some()
        || cond.requires_secondary
        || cond.super_effective
        || cond.not_very_effective;
    if needs_move {
        let Some(mv) = ctx.mv else {
            return false;
        };
        if !cond.move_types.is_empty() && !cond.move_types.contains(&mv.move_type) {
            return false;
        }
        if cond.category.is_some_and(|category| category != mv.category) {
            return false;
        }
        if cond.flag.is_some_and(|flag| !mv.flags.has(flag)) {
            return false;
        }
        if cond.max_power.is_some_and(|max| mv.power == 0 || mv.power > max) {
            return false;
        }
        if cond.requires_secondary && !mv.has_secondaries() {
            return false;
        }
        let effectiveness = ctx.effectiveness.unwrap_or(1.0);
        if cond.super_effective && effectiveness <= 1.0 {
            return false;
        }
        if cond.not_very_effective && (effectiveness >= 1.0 || effectiveness == 0.0) {
            return false;
        }
    }

    let owner = ctx.owner;
    if cond.hp_at_most.is_some_and(|ratio| owner.hp_fraction() > ratio) {
        return false;
    }
    if cond.full_hp && !owner.is_full_hp() {
        return false;
    }
    if cond.statused && owner.status.is_none() {
        return false;
    }
    if !cond.status.is_empty() && !owner.status.is_some_and(|s| cond.status.contains(&s)) {
        return false;
    }
    if !cond.weather.is_empty()
        && !ctx
            .field
            .active_weather()
            .is_some_and(|w| cond.weather.contains(&w))
    {
        return false;
    }
    if !cond.terrain.is_empty() && !ctx.field.terrain.is_some_and(|t| cond.terrain.contains(&t)) {
        return false;
    }
    if let Some(species) = &cond.species {
        if !normalize_id(&owner.species).contains(&normalize_id(species)) {
            return false;
        }
    }
    if cond.target_statused && !ctx.target.is_some_and(|t| t.status.is_some()) {
        return false;
    }
    true
}

/// Product of an effect's multipliers for `hook` whose conditions hold.
pub fn hook_value(effect: &EffectData, hook: Hook, ctx: &ConditionContext) -> f32 {
    let mut value = 1.0;
    if let Some(base) = effect.modifiers.get(&hook) {
        if condition_applies(&effect.condition, ctx) {
            value *= base;
        }
    }
    for extra in effect.conditional.iter().filter(|c| c.hook == hook) {
        if condition_applies(&extra.condition, ctx) {
            value *= extra.value;
        }
    }
    value
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Attacker,
    Defender,
}

/// A damaging move in flight.
#[derive(Clone, Copy, Debug)]
pub struct MoveContext<'a> {
    pub mv: &'a MoveData,
    pub attacker: &'a Combatant,
    pub defender: &'a Combatant,
    pub ally: Option<&'a Combatant>,
    pub field: &'a Field,
    pub effectiveness: f32,
    pub crit: bool,
}

impl<'a> MoveContext<'a> {
    fn condition_for(&self, role: Role) -> ConditionContext<'a> {
        let (owner, target) = match role {
            Role::Attacker => (self.attacker, self.defender),
            Role::Defender => (self.defender, self.attacker),
        };
        ConditionContext {
            owner,
            field: self.field,
            mv: Some(self.mv),
            effectiveness: Some(self.effectiveness),
            target: Some(target),
        }
    }
}

/// Combined multiplier for one damage-pipeline hook from the point of view
/// of `role`. Defender abilities are skipped against ability-ignoring attackers.
pub fn modifier(role: Role, hook: Hook, ctx: &MoveContext, rules: &RuleData) -> f32 {
    let cond_ctx = ctx.condition_for(role);
    let owner = cond_ctx.owner;
    let mut value = 1.0;

    if role == Role::Attacker && !ctx.mv.modifiers.is_empty() {
        if let Some(own) = ctx.mv.modifiers.get(&hook) {
            if condition_applies(&ctx.mv.condition, &cond_ctx) {
                value *= own;
            }
        }
    }

    let ignored = role == Role::Defender && ability_of(ctx.attacker, rules).ignores_abilities;
    if !ignored {
        value *= hook_value(ability_of(owner, rules), hook, &cond_ctx);
    }
    value *= hook_value(item_of(owner, rules), hook, &cond_ctx);

    if hook == Hook::AllyBasePower {
        if let Some(ally) = ctx.ally {
            let ally_ctx = ConditionContext { owner: ally, ..cond_ctx };
            value *= hook_value(ability_of(ally, rules), hook, &ally_ctx);
        }
    }
    value
}

/// Weather, screen and terrain multipliers on a damaging hit.
pub fn field_damage_modifier(ctx: &MoveContext, defender_side: Side, rules: &RuleData) -> f32 {
    let mv = ctx.mv;
    let mut value = 1.0;
    match (ctx.field.active_weather(), mv.move_type) {
        (Some(Weather::Sun), Type::Fire) | (Some(Weather::Rain), Type::Water) => value *= 1.5,
        (Some(Weather::Sun), Type::Water) | (Some(Weather::Rain), Type::Fire) => value *= 0.5,
        _ => {}
    }

    if !ctx.crit {
        let screens = &ctx.field.sides[defender_side.index()];
        let screened = match mv.category {
            MoveCategory::Physical => screens.has_physical_screen(),
            MoveCategory::Special => screens.has_special_screen(),
            MoveCategory::Status => false,
        };
        if screened {
            value *= 0.5;
        }
    }

    if let Some(terrain) = ctx.field.terrain {
        let attacker_grounded = is_grounded(ctx.attacker, ctx.field, rules);
        let defender_grounded = is_grounded(ctx.defender, ctx.field, rules);
        match (terrain, mv.move_type) {
            (Terrain::Electric, Type::Electric)
            | (Terrain::Grassy, Type::Grass)
            | (Terrain::Psychic, Type::Psychic)
                if attacker_grounded =>
            {
                value *= 1.3
            }
            (Terrain::Misty, Type::Dragon) if defender_grounded => value *= 0.5,
            (Terrain::Grassy, Type::Ground)
                if defender_grounded
                    && matches!(normalize_id(&mv.name).as_str(), "earthquake" | "bulldoze" | "magnitude") =>
            {
                value *= 0.5
            }
            _ => {}
        }
    }
    value
}
