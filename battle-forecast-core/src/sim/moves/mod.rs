//! Move effect resolution. Damaging moves run through [`attacking`], status
//! moves dispatch on their [`MoveEffect`] kind in [`status`].

pub mod attacking;
pub mod status;

use crate::data::moves::{CustomHandler, MoveCategory, MoveData, MoveEffect, MoveFlags};
use crate::data::types::Type;
use crate::data::{normalize_id, RuleData};
use crate::sim::battle::Side;
use crate::sim::decision::STRUGGLE;
use crate::sim::switching::{perform_switch, pick_random_switch, SwitchKind};
use crate::sim::turn::TurnContext;
use once_cell::sync::Lazy;

static STRUGGLE_MOVE: Lazy<MoveData> = Lazy::new(|| MoveData {
    name: STRUGGLE.to_string(),
    move_type: Type::Typeless,
    category: MoveCategory::Physical,
    power: 50,
    accuracy: None,
    flags: MoveFlags {
        contact: true,
        protect: true,
        ..MoveFlags::default()
    },
    self_damage: Some(0.25),
    ..MoveData::default()
});

/// Rule record for a move name. Struggle is always available even when the
/// tables leave it out.
pub fn lookup_move<'a>(rules: &'a RuleData, name: &str) -> &'a MoveData {
    if let Some(data) = rules.find_move(name) {
        return data;
    }
    if normalize_id(name) == normalize_id(STRUGGLE) {
        return &STRUGGLE_MOVE;
    }
    rules.move_data(name)
}

/// Whether the move is aimed at the opposing active, and so goes through
/// protection, immunity and accuracy checks.
pub fn targets_opponent(mv: &MoveData) -> bool {
    if mv.is_damaging() {
        return true;
    }
    match &mv.effect {
        Some(MoveEffect::Status { .. }) => true,
        Some(MoveEffect::Volatile { target_self, .. }) | Some(MoveEffect::Boost { target_self, .. }) => {
            !target_self
        }
        Some(MoveEffect::Custom { handler }) => {
            matches!(handler, CustomHandler::Transform | CustomHandler::PainSplit)
        }
        Some(MoveEffect::Field { .. }) | Some(MoveEffect::Hazard { .. }) => false,
        None => mv.force_switch,
    }
}

/// Pulls a random healthy member of `side` onto the field. Returns false
/// when nobody is left to drag in.
pub(crate) fn drag_out(ctx: &mut TurnContext, side: Side) -> bool {
    if ctx.state.active(side).is_fainted() {
        return false;
    }
    let Some(target) = pick_random_switch(ctx.state.party(side), ctx.rng) else {
        return false;
    };
    perform_switch(ctx.state, side, target, SwitchKind::Drag, ctx.rules, ctx.rng, ctx.log);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::moves::{FieldChange, HazardKind};
    use crate::sim::combatant::Status;
    use std::collections::BTreeMap;

    #[test]
    fn struggle_is_synthesized() {
        let rules = RuleData::new();
        let mv = lookup_move(&rules, "Struggle");
        assert_eq!(mv.power, 50);
        assert_eq!(mv.move_type, Type::Typeless);
        assert_eq!(mv.self_damage, Some(0.25));
        assert_eq!(lookup_move(&rules, "Unknown").power, 0);
    }

    #[test]
    fn self_and_field_moves_skip_the_target_gate() {
        let toxic = MoveData::status("Toxic", Type::Poison, MoveEffect::Status { status: Status::Toxic });
        let spikes = MoveData::status("Spikes", Type::Ground, MoveEffect::Hazard { hazard: HazardKind::Spikes });
        let rain = MoveData::status(
            "Rain Dance",
            Type::Water,
            MoveEffect::Field {
                change: FieldChange::Weather(crate::sim::field::Weather::Rain),
            },
        );
        let dance = MoveData::status(
            "Swords Dance",
            Type::Normal,
            MoveEffect::Boost {
                boosts: BTreeMap::new(),
                target_self: true,
            },
        );
        assert!(targets_opponent(&toxic));
        assert!(!targets_opponent(&spikes));
        assert!(!targets_opponent(&rain));
        assert!(!targets_opponent(&dance));
    }
}
