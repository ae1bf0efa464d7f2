use crate::data::normalize_id;
use crate::sim::combatant::Combatant;
use crate::sim::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Ai,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player, Side::Ai];

    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Ai => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Ai,
            Side::Ai => Side::Player,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Player => "PLAYER",
            Side::Ai => "AI",
        }
    }
}

/// Ordered members; `active` indexes the one on the field.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Party {
    pub members: Vec<Combatant>,
    #[serde(default)]
    pub active: usize,
}

impl Party {
    pub fn new(members: Vec<Combatant>) -> Self {
        Self { members, active: 0 }
    }

    pub fn active(&self) -> &Combatant {
        &self.members[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Combatant {
        &mut self.members[self.active]
    }

    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| !m.is_fainted()).count()
    }

    pub fn is_wiped(&self) -> bool {
        self.members.iter().all(Combatant::is_fainted)
    }

    /// Alive members other than the active one, with their slot index.
    pub fn bench(&self) -> impl Iterator<Item = (usize, &Combatant)> {
        let active = self.active;
        self.members
            .iter()
            .enumerate()
            .filter(move |(idx, m)| *idx != active && !m.is_fainted())
    }

    pub fn has_replacement(&self) -> bool {
        self.bench().next().is_some()
    }

    /// First alive, non-active member with this species name.
    pub fn find_switch_target(&self, species: &str) -> Option<usize> {
        let id = normalize_id(species);
        self.bench()
            .find(|(_, m)| normalize_id(&m.species) == id)
            .map(|(idx, _)| idx)
    }

    /// More than one member carries this species name.
    pub fn has_duplicate_species(&self, species: &str) -> bool {
        let id = normalize_id(species);
        self.members
            .iter()
            .filter(|m| normalize_id(&m.species) == id)
            .count()
            > 1
    }

    pub fn hp_fraction(&self) -> f32 {
        let (current, max) = self.members.iter().fold((0u32, 0u32), |(c, m), mon| {
            (c + mon.current_hp as u32, m + mon.max_hp() as u32)
        });
        if max == 0 {
            return 0.0;
        }
        current as f32 / max as f32
    }
}

/// The unit of simulation: both parties, the field and each side's last move.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BattleState {
    pub parties: [Party; 2],
    #[serde(default)]
    pub field: Field,
    #[serde(default)]
    pub last_moves: [Option<String>; 2],
    #[serde(default)]
    pub turn: u32,
}

impl BattleState {
    pub fn new(player: Party, ai: Party) -> Self {
        Self {
            parties: [player, ai],
            ..Self::default()
        }
    }

    pub fn party(&self, side: Side) -> &Party {
        &self.parties[side.index()]
    }

    pub fn party_mut(&mut self, side: Side) -> &mut Party {
        &mut self.parties[side.index()]
    }

    pub fn active(&self, side: Side) -> &Combatant {
        self.parties[side.index()].active()
    }

    pub fn active_mut(&mut self, side: Side) -> &mut Combatant {
        self.parties[side.index()].active_mut()
    }

    /// Both actives at once, `side` first.
    pub fn actives_mut(&mut self, side: Side) -> (&mut Combatant, &mut Combatant) {
        let [player, ai] = &mut self.parties;
        match side {
            Side::Player => (player.active_mut(), ai.active_mut()),
            Side::Ai => (ai.active_mut(), player.active_mut()),
        }
    }

    pub fn last_move(&self, side: Side) -> Option<&str> {
        self.last_moves[side.index()].as_deref()
    }

    /// Either party has no combatant left standing.
    pub fn is_total_ko(&self) -> bool {
        self.parties.iter().any(Party::is_wiped)
    }

    pub fn needs_replacement(&self, side: Side) -> bool {
        let active = self.active(side);
        (active.is_fainted() || active.must_switch) && self.party(side).has_replacement()
    }

    /// Canonical summary used as the cycle-detection key. Only battle-relevant
    /// data feeds the hash; the turn counter does not.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for party in &self.parties {
            party.active.hash(&mut hasher);
            for mon in &party.members {
                mon.species.hash(&mut hasher);
                mon.current_hp.hash(&mut hasher);
                mon.types.hash(&mut hasher);
                mon.moves.hash(&mut hasher);
                mon.ability.hash(&mut hasher);
                mon.stats.hash(&mut hasher);
                mon.transformed.is_some().hash(&mut hasher);
                mon.status.hash(&mut hasher);
                mon.sleep_turns.hash(&mut hasher);
                mon.toxic_counter.hash(&mut hasher);
                mon.stages.hash(&mut hasher);
                for (volatile, counter) in &mon.volatiles {
                    volatile.hash(&mut hasher);
                    counter.hash(&mut hasher);
                }
                mon.item_consumed.hash(&mut hasher);
                mon.must_switch.hash(&mut hasher);
                mon.choice_lock.hash(&mut hasher);
                mon.protect_counter.hash(&mut hasher);
                mon.substitute_hp.hash(&mut hasher);
            }
        }
        self.field.hash(&mut hasher);
        self.last_moves.hash(&mut hasher);
        hasher.finish()
    }
}
