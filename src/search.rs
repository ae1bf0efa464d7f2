use crate::config::SearchParams;
use battle_forecast_core::ai::ScoringModel;
use battle_forecast_core::engine::Engine;
use battle_forecast_core::sim::{BattleState, Decision, Side};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// Magnitude of a decided battle; anything at or beyond it is terminal.
pub const TERMINAL_SCORE: f64 = 10_000.0;
const DEPTH_BIAS: f64 = 100.0;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SearchStatus {
    #[serde(rename = "Total KO")]
    TotalKo,
    Converged,
    #[serde(rename = "Max Depth")]
    MaxDepth,
    #[serde(rename = "Time Budget")]
    TimeBudget,
}

/// One AI reply to a player action, followed to the end of its line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Branch {
    pub ai_action: Decision,
    pub probability: f64,
    pub value: f64,
    pub path: Vec<Vec<String>>,
    pub actions: Vec<(Decision, Decision)>,
    #[serde(skip)]
    seed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionForecast {
    pub action: Decision,
    pub expected: f64,
    /// Sorted by probability, most likely first.
    pub branches: Vec<Branch>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub best_action: Option<Decision>,
    pub actions: Vec<ActionForecast>,
    pub final_depth: u32,
    pub status: SearchStatus,
    /// Evaluation of the starting position.
    pub static_value: f64,
}

impl Forecast {
    pub fn action(&self, decision: &Decision) -> Option<&ActionForecast> {
        self.actions.iter().find(|entry| &entry.action == decision)
    }
}

/// Derives an independent stream seed from a base seed and two indices.
pub fn mix_seed(base: u64, a: u64, b: u64) -> u64 {
    let mut x = base ^ a.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= b.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    x = (x ^ (x >> 33)).wrapping_mul(0xff51_afd7_ed55_8ccd);
    x = (x ^ (x >> 33)).wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

/// Static evaluation from the player's point of view. `depth` is the
/// remaining search depth and biases terminal scores toward quick wins and
/// slow losses.
pub fn evaluate_state(state: &BattleState, depth: u32) -> f64 {
    let player = state.party(Side::Player);
    let ai = state.party(Side::Ai);
    let bias = depth as f64 * DEPTH_BIAS;
    if player.is_wiped() {
        return -TERMINAL_SCORE - bias;
    }
    if ai.is_wiped() {
        return TERMINAL_SCORE + bias;
    }

    let p_active = player.active();
    let a_active = ai.active();
    let mut score = (p_active.hp_fraction() as f64 - a_active.hp_fraction() as f64) * 100.0;
    score += if p_active.is_fainted() { -1000.0 } else { 50.0 };
    score += (player.alive_count() as f64 - ai.alive_count() as f64) * 200.0;

    let party_hp = |side: Side| -> f64 {
        state
            .party(side)
            .members
            .iter()
            .map(|mon| mon.hp_fraction() as f64)
            .sum()
    };
    score += (party_hp(Side::Player) - party_hp(Side::Ai)) * 50.0;
    score
}

/// Iterative-deepening forecast of the player's best action against the
/// AI's selection distribution.
pub fn forecast(engine: &Engine, state: &BattleState, params: &SearchParams) -> Forecast {
    let searcher = Searcher::new(engine);
    let static_value = evaluate_state(state, 0);
    let player_actions = engine.legal_actions(state, Side::Player);
    if player_actions.is_empty() {
        tracing::debug!("no legal player actions, returning static evaluation");
        return Forecast {
            best_action: None,
            actions: Vec::new(),
            final_depth: 0,
            status: SearchStatus::MaxDepth,
            static_value,
        };
    }

    let ai_probs = searcher.model.score(state, Side::Ai).selection_probabilities();
    let root_fingerprint = state.fingerprint();
    let start = Instant::now();
    let window = params.convergence_window.max(1);

    let mut history: Vec<Decision> = Vec::new();
    let mut actions: Vec<ActionForecast> = Vec::new();
    let mut final_depth = 0;
    let mut status = SearchStatus::MaxDepth;

    for depth in 1..=params.max_depth.max(1) {
        actions = player_actions
            .iter()
            .enumerate()
            .map(|(p_idx, player)| {
                searcher.expand_action(state, player, p_idx, &ai_probs, depth, params.seed, root_fingerprint)
            })
            .collect();
        final_depth = depth;

        let Some(best) = best_entry(&actions) else {
            break;
        };
        tracing::info!(
            depth,
            best = %best.action,
            expected = best.expected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search depth complete"
        );
        history.push(best.action.clone());

        if best
            .branches
            .first()
            .is_some_and(|top| top.value.abs() >= TERMINAL_SCORE)
        {
            status = SearchStatus::TotalKo;
            break;
        }
        if history.len() >= window && history[history.len() - window..].iter().all(|a| a == &best.action) {
            status = SearchStatus::Converged;
            break;
        }
        if params.time_budget().is_some_and(|limit| start.elapsed() >= limit) {
            status = SearchStatus::TimeBudget;
            break;
        }
    }

    for entry in &mut actions {
        for branch in entry.branches.iter_mut() {
            if branch.probability >= params.report_threshold {
                searcher.finalize(state, branch, root_fingerprint, params.extension_cap);
            }
        }
    }

    Forecast {
        best_action: best_entry(&actions).map(|entry| entry.action.clone()),
        actions,
        final_depth,
        status,
        static_value,
    }
}

/// First entry with the highest expected value.
fn best_entry(actions: &[ActionForecast]) -> Option<&ActionForecast> {
    actions.iter().fold(None, |best: Option<&ActionForecast>, entry| match best {
        Some(current) if current.expected >= entry.expected => Some(current),
        _ => Some(entry),
    })
}

struct Searcher<'e> {
    engine: &'e Engine,
    model: ScoringModel<'e>,
}

impl<'e> Searcher<'e> {
    fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            model: ScoringModel::new(engine),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_action(
        &self,
        state: &BattleState,
        player: &Decision,
        p_idx: usize,
        ai_probs: &[(Decision, f64)],
        depth: u32,
        seed: u64,
        root_fingerprint: u64,
    ) -> ActionForecast {
        let mut expected = 0.0;
        let mut branches = Vec::with_capacity(ai_probs.len());
        for (a_idx, (ai_action, probability)) in ai_probs.iter().enumerate() {
            let branch_seed = mix_seed(seed, p_idx as u64, a_idx as u64);
            let mut rng = SmallRng::seed_from_u64(branch_seed);
            let outcome = self.engine.apply_turn(state, player, ai_action, &mut rng);
            let mut path = vec![outcome.log.into_lines()];
            let mut actions = vec![(player.clone(), ai_action.clone())];
            let mut visited = HashSet::from([root_fingerprint]);
            let value = self.follow_line(
                outcome.state,
                depth - 1,
                &mut rng,
                &mut visited,
                &mut path,
                &mut actions,
            );
            expected += value * probability;
            branches.push(Branch {
                ai_action: ai_action.clone(),
                probability: *probability,
                value,
                path,
                actions,
                seed: branch_seed,
            });
        }
        branches.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        ActionForecast {
            action: player.clone(),
            expected,
            branches,
        }
    }

    /// Plays the greedy player action against the AI's most likely reply
    /// until depth runs out, a side is wiped, or a position repeats.
    fn follow_line(
        &self,
        mut state: BattleState,
        depth: u32,
        rng: &mut SmallRng,
        visited: &mut HashSet<u64>,
        path: &mut Vec<Vec<String>>,
        actions: &mut Vec<(Decision, Decision)>,
    ) -> f64 {
        let mut remaining = depth;
        loop {
            if !visited.insert(state.fingerprint()) {
                tracing::trace!(remaining, "cycle, evaluating in place");
                return evaluate_state(&state, remaining);
            }
            if remaining == 0 || state.is_total_ko() {
                return evaluate_state(&state, remaining);
            }
            let Some(player) = self.greedy_action(&state, remaining, rng) else {
                return evaluate_state(&state, remaining);
            };
            let ai = self.likely_ai_action(&state);
            let outcome = self.engine.apply_turn(&state, &player, &ai, rng);
            path.push(outcome.log.into_lines());
            actions.push((player, ai));
            state = outcome.state;
            remaining -= 1;
        }
    }

    /// The player action whose immediate result evaluates best against a
    /// Struggle reply. Draws come from a copy so the line's stream is not
    /// advanced.
    fn greedy_action(&self, state: &BattleState, depth: u32, rng: &SmallRng) -> Option<Decision> {
        let reply = Decision::struggle();
        let mut best: Option<(Decision, f64)> = None;
        for action in self.engine.legal_actions(state, Side::Player) {
            let mut trial_rng = rng.clone();
            let outcome = self.engine.apply_turn(state, &action, &reply, &mut trial_rng);
            let value = evaluate_state(&outcome.state, depth);
            if best.as_ref().map_or(true, |(_, current)| value > *current) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    fn likely_ai_action(&self, state: &BattleState) -> Decision {
        let probs = self.model.score(state, Side::Ai).selection_probabilities();
        probs
            .into_iter()
            .fold(None, |best: Option<(Decision, f64)>, (decision, p)| match best {
                Some((current, cp)) if cp >= p => Some((current, cp)),
                _ => Some((decision, p)),
            })
            .map(|(decision, _)| decision)
            .unwrap_or_else(Decision::struggle)
    }

    /// Replays a branch under its own seed and extends it greedily to a
    /// decided battle, a repeated position, or the turn cap.
    fn finalize(&self, root: &BattleState, branch: &mut Branch, root_fingerprint: u64, cap: u32) {
        let mut rng = SmallRng::seed_from_u64(branch.seed);
        let mut visited = HashSet::from([root_fingerprint]);
        let mut state = root.clone();
        let mut path = Vec::with_capacity(branch.path.len());
        for (player, ai) in &branch.actions {
            let outcome = self.engine.apply_turn(&state, player, ai, &mut rng);
            path.push(outcome.log.into_lines());
            state = outcome.state;
            visited.insert(state.fingerprint());
        }

        let mut actions = branch.actions.clone();
        for _ in 0..cap {
            if state.is_total_ko() {
                break;
            }
            let Some(player) = self.greedy_action(&state, 0, &rng) else {
                break;
            };
            let ai = self.likely_ai_action(&state);
            let outcome = self.engine.apply_turn(&state, &player, &ai, &mut rng);
            path.push(outcome.log.into_lines());
            actions.push((player, ai));
            state = outcome.state;
            if !visited.insert(state.fingerprint()) {
                break;
            }
        }

        branch.value = evaluate_state(&state, 0);
        branch.path = path;
        branch.actions = actions;
    }
}
