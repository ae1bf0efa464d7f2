//! Per-cell rules of the scoring grid.
//!
//! A cell is one (damage-roll percentile, variant) pair for one candidate
//! move. Scores are small integers; [`NEVER`] marks a move the AI will not
//! pick while anything else is available.

use super::tables::{self, contains};
use crate::data::effects::ExtendTarget;
use crate::data::moves::{CustomHandler, FieldChange, HazardKind, MoveCategory, MoveData, MoveEffect};
use crate::data::types::Type;
use crate::data::{normalize_id, RuleData};
use crate::sim::battle::{BattleState, Side};
use crate::sim::combatant::{Combatant, Status, Volatile};
use crate::sim::field::{Terrain, Weather};
use crate::sim::moves::lookup_move;
use crate::sim::resolver::{ability_of, item_of, status_blocked, StatusAttempt};
use crate::sim::stats::Stat;

pub const NEVER: i32 = -20;
pub const SWITCH_SCORE: i32 = 10;
/// Grid maximum at or below which every move counts as ineffective.
pub const INEFFECTIVE: i32 = -5;
pub const DESPERATION_BONUS: i32 = 11;

/// Facts about the matchup shared by every cell.
#[derive(Clone, Copy, Debug)]
pub struct ScoreContext<'a> {
    pub state: &'a BattleState,
    pub side: Side,
    pub rules: &'a RuleData,
    pub attacker: &'a Combatant,
    pub defender: &'a Combatant,
    /// Speed ties count as faster.
    pub is_faster: bool,
    pub first_turn: bool,
    /// The opponent has a move whose top roll knocks the attacker out.
    pub threatened: bool,
}

impl<'a> ScoreContext<'a> {
    pub fn hp_fraction(&self) -> f32 {
        self.attacker.hp_fraction()
    }

    fn defender_side(&self) -> Side {
        self.side.opponent()
    }

    fn target_incapacitated(&self) -> bool {
        matches!(self.defender.status, Some(Status::Sleep | Status::Freeze)) || self.defender.has_ability("Truant")
    }

    fn last_mon(&self) -> bool {
        self.state.party(self.side).alive_count() <= 1
    }
}

/// One candidate move with its resolved rule record.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    pub mv: &'a MoveData,
    pub id: String,
    /// Bracket including ability and item boosts.
    pub priority: i8,
    pub effectiveness: f32,
}

impl<'a> Candidate<'a> {
    pub fn new(mv: &'a MoveData, priority: i8, effectiveness: f32) -> Self {
        Self {
            mv,
            id: normalize_id(&mv.name),
            priority,
            effectiveness,
        }
    }

    fn is(&self, set: &phf::Set<&'static str>) -> bool {
        set.contains(self.id.as_str())
    }
}

/// One damage-roll percentile for one candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cell {
    pub damage: u16,
    pub kills: bool,
    /// Top damage in this percentile, or a co-maximal kill when any move kills.
    pub is_highest: bool,
}

fn ability_in(mon: &Combatant, set: &phf::Set<&'static str>) -> bool {
    !mon.ability_suppressed && contains(set, &mon.ability)
}

fn item_in(mon: &Combatant, set: &phf::Set<&'static str>) -> bool {
    mon.held_item().is_some_and(|item| contains(set, item))
}

fn last_move_is(mon: &Combatant, id: &str) -> bool {
    mon.last_move.as_deref().is_some_and(|last| normalize_id(last) == id)
}

/// Ailment a status move would put on its target, including Yawn's
/// delayed sleep.
fn intended_status(cand: &Candidate) -> Option<Status> {
    if let Some(status) = cand.mv.inflicted_status() {
        return Some(status);
    }
    if cand.is(&tables::SLEEP_MOVES) {
        return Some(Status::Sleep);
    }
    if cand.is(&tables::PARALYSIS_MOVES) {
        return Some(Status::Paralysis);
    }
    None
}

/// Whether the move's precondition holds. A failed check scores
/// [`NEVER`] in every cell.
pub fn is_valid(ctx: &ScoreContext, cand: &Candidate) -> bool {
    let mv = cand.mv;
    let defender = ctx.defender;
    let field = &ctx.state.field;

    if mv.is_damaging() && cand.effectiveness == 0.0 {
        return false;
    }
    if !mv.is_damaging() {
        if let Some(status) = intended_status(cand) {
            if defender.status.is_some() {
                return false;
            }
            let attempt = StatusAttempt::by(ctx.attacker, ctx.rules);
            if status_blocked(defender, status, ctx.defender_side(), field, attempt, ctx.rules) {
                return false;
            }
            if status == Status::Sleep && matches!(field.terrain, Some(Terrain::Electric | Terrain::Misty)) {
                return false;
            }
        }
        match &mv.effect {
            Some(MoveEffect::Field {
                change: FieldChange::Weather(weather),
            }) if field.weather == Some(*weather) => return false,
            Some(MoveEffect::Hazard { hazard }) => {
                let layers = field.sides[ctx.defender_side().index()].layers(*hazard);
                if layers >= hazard.max_layers() {
                    return false;
                }
            }
            _ => {}
        }
    }
    if mv.first_turn_only {
        if !ctx.first_turn {
            return false;
        }
        let attacker_ability = ability_of(ctx.attacker, ctx.rules);
        if !attacker_ability.ignores_abilities && ability_in(defender, &tables::FLINCH_IMMUNE_ABILITIES) {
            return false;
        }
        if defender.has_type(Type::Ghost) && !attacker_ability.hits_ghost {
            return false;
        }
    }
    true
}

/// Score of one cell for a move that passed [`is_valid`].
pub fn score_cell(ctx: &ScoreContext, cand: &Candidate, variant: usize, cell: &Cell) -> i32 {
    if cand.id == "suckerpunch" && last_move_is(ctx.attacker, "suckerpunch") {
        return NEVER;
    }
    let specific = specific_adjustment(ctx, cand);
    if specific == NEVER {
        return NEVER;
    }
    let base = if cand.mv.is_damaging() {
        score_damaging(ctx, cand, variant, cell)
    } else {
        score_status(ctx, cand, variant)
    };
    let mut score = base + specific;
    if ctx.threatened && !ctx.is_faster && cand.priority > 0 && cand.mv.is_damaging() {
        score += DESPERATION_BONUS;
    }
    score
}

/// Named exceptions added on top of the category score.
fn specific_adjustment(ctx: &ScoreContext, cand: &Candidate) -> i32 {
    if cand.id == "relicsong" {
        let species = normalize_id(&ctx.attacker.species);
        if species.contains("meloetta") {
            return if species.contains("pirouette") { NEVER } else { 10 };
        }
    }
    if cand.is(&tables::DELAYED_ATTACKS) {
        return if ctx.is_faster && ctx.threatened { 8 } else { 6 };
    }
    if cand.is(&tables::SLEEP_DEPENDENT) && ctx.defender.status != Some(Status::Sleep) {
        return NEVER;
    }
    0
}

fn score_damaging(ctx: &ScoreContext, cand: &Candidate, variant: usize, cell: &Cell) -> i32 {
    let mut score = 0;
    if cell.is_highest {
        score = if variant == 4 { 8 } else { 6 };
    } else {
        let blocked = ability_in(ctx.defender, &tables::DROP_BLOCKERS);
        if cand.is(&tables::SPEED_CONTROL) {
            return if blocked || ctx.is_faster { 5 } else { 6 };
        }
        if cand.is(&tables::STAT_DROP) {
            return if blocked { 5 } else { 6 };
        }
        if cand.id == "acidspray" {
            return 6;
        }
    }

    if cand.is(&tables::COUNTER_MOVES) {
        let mut score = score_counter(ctx);
        if variant == 0 && ctx.is_faster {
            score -= 1;
        }
        return score;
    }
    if cand.id == "fakeout" && ctx.first_turn {
        return 9;
    }

    if cell.kills && !cand.is(&tables::NO_KILL_BONUS) {
        score += if ctx.is_faster || cand.priority > 0 { 6 } else { 3 };
        if ability_in(ctx.attacker, &tables::KO_BOOST_ABILITIES) {
            score += 1;
        }
    }

    match cand.id.as_str() {
        "fellstinger" if cell.kills => {
            score = match (ctx.is_faster, variant == 4) {
                (true, true) => 23,
                (true, false) => 21,
                (false, true) => 17,
                (false, false) => 15,
            };
        }
        "rollout" => return 7,
        "fling" => {
            if item_in(ctx.attacker, &tables::FLING_HEAVY_ITEMS) {
                return 10;
            }
            if ctx.attacker.held_item().is_some_and(|item| normalize_id(item).ends_with("berry")) {
                return 7;
            }
        }
        "finalgambit" => return score_final_gambit(ctx),
        "pursuit" => score = score_pursuit(ctx, variant, cell.kills),
        "relicsong" if cell.kills => score += if ctx.is_faster { 6 } else { 3 },
        _ if cand.is(&tables::EXPLOSIONS) => score = score_explosion(ctx.hp_fraction(), variant),
        _ => {}
    }
    score
}

fn score_counter(ctx: &ScoreContext) -> i32 {
    if !ctx.threatened {
        return 6;
    }
    let safety = ctx.attacker.is_full_hp()
        && (item_in(ctx.attacker, &tables::SURVIVAL_ITEMS) || ability_in(ctx.attacker, &tables::SURVIVAL_ABILITIES));
    if safety {
        8
    } else {
        NEVER
    }
}

fn score_final_gambit(ctx: &ScoreContext) -> i32 {
    if !ctx.is_faster {
        return 6;
    }
    let own = ctx.attacker.current_hp;
    let target = ctx.defender.current_hp;
    if own > target {
        8
    } else if own == target {
        7
    } else {
        6
    }
}

fn score_pursuit(ctx: &ScoreContext, variant: usize, kills: bool) -> i32 {
    let mut score = 0;
    if kills {
        score = 10;
    } else {
        let target = ctx.defender.hp_fraction();
        if target < 0.20 {
            score = 10;
        } else if target < 0.40 && variant <= 1 {
            score = 8;
        }
    }
    if ctx.is_faster {
        score += 3;
    }
    score
}

fn score_explosion(hp_fraction: f32, variant: usize) -> i32 {
    if hp_fraction < 0.10 {
        10
    } else if hp_fraction < 0.33 {
        if variant <= 2 {
            8
        } else {
            0
        }
    } else if hp_fraction < 0.66 {
        if variant <= 1 {
            7
        } else {
            0
        }
    } else if variant == 0 {
        7
    } else {
        0
    }
}

fn score_status(ctx: &ScoreContext, cand: &Candidate, variant: usize) -> i32 {
    let mv = cand.mv;
    match &mv.effect {
        Some(MoveEffect::Hazard { hazard }) => return score_hazard(*hazard, variant, ctx.first_turn),
        Some(MoveEffect::Field {
            change: FieldChange::Reflect | FieldChange::LightScreen | FieldChange::AuroraVeil,
        }) => return score_screen(ctx, variant),
        Some(MoveEffect::Field {
            change: FieldChange::Terrain(_),
        }) => return score_terrain(ctx),
        Some(MoveEffect::Field {
            change: FieldChange::Tailwind | FieldChange::TrickRoom,
        }) => return if ctx.is_faster { 6 } else { 9 },
        Some(MoveEffect::Volatile {
            volatile: Volatile::Substitute,
            ..
        }) => return score_substitute(ctx),
        _ => {}
    }

    if mv.is_protection() || cand.is(&tables::PROTECT_MOVES) {
        return score_protect(ctx, variant);
    }
    if cand.is(&tables::DISRUPT_MOVES) {
        return match cand.id.as_str() {
            "taunt" => 8,
            "encore" if ctx.is_faster => 7,
            _ => 6,
        };
    }
    match intended_status(cand) {
        Some(Status::Sleep) => return if variant == 0 { 7 } else { 6 },
        Some(status) => return score_ailment(ctx, status),
        None => {}
    }
    if cand.id == "destinybond" {
        return if ctx.is_faster { 7 } else { 5 };
    }
    if cand.is(&tables::IDENTIFY_MOVES) {
        return score_identify(ctx, cand);
    }
    if cand.is(&tables::RECOVERY) || mv.heal.is_some() {
        return score_recovery(ctx, cand);
    }
    if is_setup(cand) {
        return score_setup(ctx, cand);
    }
    if cand.is(&tables::TRICK_MOVES) {
        return if item_in(ctx.attacker, &tables::TRICK_ITEMS) { 7 } else { 5 };
    }
    match cand.id.as_str() {
        "imprison" => score_imprison(ctx),
        "batonpass" => score_baton_pass(ctx),
        "memento" => score_memento(ctx),
        _ if cand.is(&tables::FOCUS_MOVES) => score_focus_energy(ctx),
        _ => 6,
    }
}

fn score_hazard(hazard: HazardKind, variant: usize, first_turn: bool) -> i32 {
    let low = variant == 0;
    match (hazard, first_turn) {
        (HazardKind::StickyWeb, true) => if low { 9 } else { 12 },
        (HazardKind::StickyWeb, false) => if low { 6 } else { 9 },
        (_, true) => if low { 8 } else { 9 },
        (_, false) => if low { 6 } else { 7 },
    }
}

fn extends(mon: &Combatant, rules: &RuleData, target: fn(&ExtendTarget) -> bool) -> bool {
    item_of(mon, rules).extends.as_ref().is_some_and(|ext| target(&ext.target))
}

fn score_screen(ctx: &ScoreContext, variant: usize) -> i32 {
    let mut score = 6;
    if item_in(ctx.attacker, &tables::SCREEN_EXTENDERS)
        || extends(ctx.attacker, ctx.rules, |t| matches!(t, ExtendTarget::Screens))
    {
        score += 1;
    }
    if variant <= 1 {
        score += 1;
    }
    score
}

fn score_terrain(ctx: &ScoreContext) -> i32 {
    if item_in(ctx.attacker, &tables::TERRAIN_EXTENDERS)
        || extends(ctx.attacker, ctx.rules, |t| matches!(t, ExtendTarget::Terrain))
    {
        9
    } else {
        8
    }
}

fn score_substitute(ctx: &ScoreContext) -> i32 {
    if ctx.defender.has_ability("Infiltrator") || ctx.hp_fraction() <= 0.5 {
        return NEVER;
    }
    let mut score = 6;
    if ctx.defender.status == Some(Status::Sleep) {
        score += 2;
    }
    if ctx.defender.has_volatile(Volatile::LeechSeed) && ctx.is_faster {
        score += 2;
    }
    score
}

fn score_protect(ctx: &ScoreContext, variant: usize) -> i32 {
    let repeated = ctx
        .attacker
        .last_move
        .as_deref()
        .is_some_and(|last| lookup_move(ctx.rules, last).is_protection() || contains(&tables::PROTECT_MOVES, last));
    if repeated && variant >= 2 {
        return NEVER;
    }
    let mut score = 6;
    if ctx.first_turn {
        score -= 1;
    }
    if ctx.attacker.status.is_some_and(|status| status != Status::Paralysis) {
        score -= 2;
    }
    if matches!(ctx.defender.status, Some(Status::Poison | Status::Toxic | Status::Burn)) {
        score += 1;
    }
    score
}

fn score_ailment(ctx: &ScoreContext, status: Status) -> i32 {
    match status {
        Status::Paralysis if !ctx.is_faster => 8,
        Status::Burn => 8,
        _ => 6,
    }
}

fn score_identify(ctx: &ScoreContext, cand: &Candidate) -> i32 {
    let defender = ctx.defender;
    let useful = defender.stage(Stat::Evasion) > 0
        || (cand.id != "miracleeye" && defender.has_type(Type::Ghost))
        || (cand.id == "miracleeye" && defender.has_type(Type::Dark));
    if useful {
        7
    } else {
        2
    }
}

fn score_recovery(ctx: &ScoreContext, cand: &Candidate) -> i32 {
    let hp = ctx.hp_fraction();
    if hp >= 1.0 {
        return NEVER;
    }
    if hp >= 0.85 {
        return -6;
    }
    let warranted = if ctx.is_faster { hp < 0.66 } else { hp < 0.70 };
    let sun = ctx.state.field.active_weather() == Some(Weather::Sun);
    if cand.is(&tables::SUN_RECOVERY) && sun && warranted {
        return 7;
    }
    if warranted {
        7
    } else {
        5
    }
}

fn is_setup(cand: &Candidate) -> bool {
    if cand.is(&tables::SETUP) {
        return true;
    }
    match &cand.mv.effect {
        Some(MoveEffect::Boost {
            boosts,
            target_self: true,
        }) => boosts.values().any(|delta| *delta > 0),
        Some(MoveEffect::Custom {
            handler: CustomHandler::BellyDrum,
        }) => true,
        _ => false,
    }
}

fn score_setup(ctx: &ScoreContext, cand: &Candidate) -> i32 {
    if ctx.threatened {
        return NEVER;
    }
    if ctx.defender.has_ability("Unaware") && !cand.is(&tables::UNAWARE_EXCEPTIONS) {
        return NEVER;
    }

    let categories: Vec<MoveCategory> = ctx
        .defender
        .moves
        .iter()
        .map(|name| lookup_move(ctx.rules, name).category)
        .collect();
    let has_physical = categories.contains(&MoveCategory::Physical);
    let has_special = categories.contains(&MoveCategory::Special);
    let defensive = cand.is(&tables::DEFENSIVE_SETUP)
        || (cand.is(&tables::PHYSICAL_HYBRID_SETUP) && has_physical && !has_special)
        || (cand.is(&tables::SPECIAL_HYBRID_SETUP) && has_special && !has_physical);

    let incapacitated = ctx.target_incapacitated();
    let mut score = 6;
    if defensive {
        if incapacitated {
            score += 2;
        }
        if ctx.attacker.stage(Stat::Def) < 2 || ctx.attacker.stage(Stat::Spd) < 2 {
            score += 2;
        }
        return score;
    }

    if incapacitated {
        score += 3;
    }
    if cand.is(&tables::SPEED_SETUP) {
        return if ctx.is_faster { NEVER } else { 7 };
    }
    match cand.id.as_str() {
        "shellsmash" if ctx.attacker.stage(Stat::Atk) >= 1 || ctx.attacker.stage(Stat::Spa) >= 6 => NEVER,
        "bellydrum" => {
            if incapacitated {
                9
            } else if ctx.attacker.has_item("Sitrus Berry") {
                8
            } else {
                4
            }
        }
        _ => score,
    }
}

fn score_imprison(ctx: &ScoreContext) -> i32 {
    let shared = ctx.attacker.moves.iter().any(|name| ctx.defender.knows_move(name));
    if shared {
        9
    } else {
        NEVER
    }
}

fn score_baton_pass(ctx: &ScoreContext) -> i32 {
    if ctx.last_mon() {
        return NEVER;
    }
    if ctx.attacker.has_volatile(Volatile::Substitute) || ctx.attacker.stages.has_positive() {
        14
    } else {
        0
    }
}

fn score_memento(ctx: &ScoreContext) -> i32 {
    if ctx.last_mon() {
        return NEVER;
    }
    let hp = ctx.hp_fraction();
    if hp < 0.10 {
        16
    } else if hp < 0.33 {
        14
    } else if hp < 0.66 {
        13
    } else {
        6
    }
}

fn score_focus_energy(ctx: &ScoreContext) -> i32 {
    if ability_in(ctx.defender, &tables::CRIT_IMMUNE_ABILITIES) {
        return NEVER;
    }
    if ability_in(ctx.attacker, &tables::CRIT_ABILITIES) || item_in(ctx.attacker, &tables::CRIT_ITEMS) {
        7
    } else {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::battle::Party;
    use crate::sim::stats::StatBlock;
    use std::collections::BTreeMap;

    fn make_mon(species: &str, types: Vec<Type>) -> Combatant {
        Combatant::new(species, 50, types, StatBlock::new(150, 100, 100, 100, 100, 100))
    }

    fn with_ctx<R>(attacker: Combatant, defender: Combatant, rules: &RuleData, f: impl FnOnce(ScoreContext) -> R) -> R {
        let state = BattleState::new(Party::new(vec![defender]), Party::new(vec![attacker]));
        let ctx = ScoreContext {
            state: &state,
            side: Side::Ai,
            rules,
            attacker: state.active(Side::Ai),
            defender: state.active(Side::Player),
            is_faster: true,
            first_turn: false,
            threatened: false,
        };
        f(ctx)
    }

    #[test]
    fn burn_into_fire_type_is_invalid() {
        let rules = RuleData::new();
        let wisp = MoveData::status("Will-O-Wisp", Type::Fire, MoveEffect::Status { status: Status::Burn });
        let attacker = make_mon("Ghostly", vec![Type::Ghost]);
        with_ctx(attacker.clone(), make_mon("Flamer", vec![Type::Fire]), &rules, |ctx| {
            assert!(!is_valid(&ctx, &Candidate::new(&wisp, 0, 1.0)));
        });
        with_ctx(attacker, make_mon("Plain", vec![Type::Normal]), &rules, |ctx| {
            let cand = Candidate::new(&wisp, 0, 1.0);
            assert!(is_valid(&ctx, &cand));
            assert_eq!(score_cell(&ctx, &cand, 0, &Cell::default()), 8);
        });
    }

    #[test]
    fn capped_hazard_is_invalid() {
        let rules = RuleData::new();
        let spikes = MoveData::status("Spikes", Type::Ground, MoveEffect::Hazard { hazard: HazardKind::Spikes });
        let mut state = BattleState::new(
            Party::new(vec![make_mon("Target", vec![Type::Normal])]),
            Party::new(vec![make_mon("Setter", vec![Type::Ground])]),
        );
        state.field.sides[Side::Player.index()].hazards.insert(HazardKind::Spikes, 3);
        let ctx = ScoreContext {
            state: &state,
            side: Side::Ai,
            rules: &rules,
            attacker: state.active(Side::Ai),
            defender: state.active(Side::Player),
            is_faster: true,
            first_turn: true,
            threatened: false,
        };
        assert!(!is_valid(&ctx, &Candidate::new(&spikes, 0, 1.0)));
    }

    #[test]
    fn setup_is_never_used_when_threatened() {
        let rules = RuleData::new();
        let dance = MoveData::status(
            "Swords Dance",
            Type::Normal,
            MoveEffect::Boost {
                boosts: BTreeMap::from([(Stat::Atk, 2)]),
                target_self: true,
            },
        );
        with_ctx(make_mon("A", vec![Type::Normal]), make_mon("B", vec![Type::Normal]), &rules, |ctx| {
            let ctx = ScoreContext { threatened: true, ..ctx };
            let cand = Candidate::new(&dance, 0, 1.0);
            for variant in 0..5 {
                assert_eq!(score_cell(&ctx, &cand, variant, &Cell::default()), NEVER);
            }
        });
    }

    #[test]
    fn kill_bonus_depends_on_speed_and_priority() {
        let rules = RuleData::new();
        let tackle = MoveData::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        let cell = Cell {
            damage: 200,
            kills: true,
            is_highest: true,
        };
        with_ctx(make_mon("A", vec![Type::Normal]), make_mon("B", vec![Type::Normal]), &rules, |ctx| {
            let cand = Candidate::new(&tackle, 0, 1.0);
            assert_eq!(score_cell(&ctx, &cand, 0, &cell), 12);
            assert_eq!(score_cell(&ctx, &cand, 4, &cell), 14);
            let slow = ScoreContext { is_faster: false, ..ctx };
            assert_eq!(score_cell(&slow, &cand, 0, &cell), 9);
            let quick = Candidate::new(&tackle, 1, 1.0);
            assert_eq!(score_cell(&slow, &quick, 0, &cell), 12);
        });
    }

    #[test]
    fn desperation_rewards_priority_when_slower_and_threatened() {
        let rules = RuleData::new();
        let shadow = MoveData::new("Shadow Sneak", Type::Ghost, MoveCategory::Physical, 40).with_priority(1);
        with_ctx(make_mon("A", vec![Type::Ghost]), make_mon("B", vec![Type::Psychic]), &rules, |ctx| {
            let ctx = ScoreContext {
                is_faster: false,
                threatened: true,
                ..ctx
            };
            let cand = Candidate::new(&shadow, 1, 2.0);
            assert_eq!(score_cell(&ctx, &cand, 0, &Cell::default()), DESPERATION_BONUS);
        });
    }

    #[test]
    fn recovery_thresholds() {
        let rules = RuleData::new();
        let recover = MoveData::status("Recover", Type::Normal, MoveEffect::Boost { boosts: BTreeMap::new(), target_self: true });
        let mut attacker = make_mon("A", vec![Type::Normal]);
        with_ctx(attacker.clone(), make_mon("B", vec![Type::Normal]), &rules, |ctx| {
            assert_eq!(score_cell(&ctx, &Candidate::new(&recover, 0, 1.0), 0, &Cell::default()), NEVER);
        });
        attacker.current_hp = 60;
        with_ctx(attacker, make_mon("B", vec![Type::Normal]), &rules, |ctx| {
            assert_eq!(score_cell(&ctx, &Candidate::new(&recover, 0, 1.0), 0, &Cell::default()), 7);
        });
    }

    #[test]
    fn repeated_protect_is_dropped_in_later_variants() {
        let rules = RuleData::new();
        let protect = MoveData::status(
            "Protect",
            Type::Normal,
            MoveEffect::Volatile {
                volatile: Volatile::Protect,
                target_self: true,
                protect: None,
            },
        );
        let mut attacker = make_mon("A", vec![Type::Normal]);
        attacker.last_move = Some("Protect".into());
        with_ctx(attacker, make_mon("B", vec![Type::Normal]), &rules, |ctx| {
            let cand = Candidate::new(&protect, 4, 1.0);
            assert_eq!(score_cell(&ctx, &cand, 0, &Cell::default()), 6);
            assert_eq!(score_cell(&ctx, &cand, 2, &Cell::default()), NEVER);
        });
    }
}
