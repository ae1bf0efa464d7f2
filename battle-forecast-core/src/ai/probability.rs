//! Collapses a scoring grid into a selection distribution.

use super::{ROLL_ROWS, VARIANT_COUNT};
use crate::sim::decision::Decision;

/// Shares at or below this are dropped as noise.
pub const MIN_PROBABILITY: f64 = 0.001;

/// Per distinct decision, the summed weight of the rows it wins. A row's
/// weight is `1/16 * variant_weight`; tied winners split it evenly.
/// Negligible shares are dropped and the rest renormalized.
pub fn selection_probabilities(
    candidates: &[Decision],
    grid: &[Vec<i32>],
    variant_weights: &[f64; VARIANT_COUNT],
) -> Vec<(Decision, f64)> {
    if candidates.is_empty() || grid.is_empty() {
        return vec![(Decision::struggle(), 1.0)];
    }
    let mut totals: Vec<(Decision, f64)> = Vec::new();
    for (row_idx, row) in grid.iter().enumerate() {
        let Some(best) = row.iter().copied().max() else {
            continue;
        };
        let row_weight = variant_weights[row_idx % VARIANT_COUNT] / ROLL_ROWS as f64;
        let winners: Vec<&Decision> = row
            .iter()
            .zip(candidates)
            .filter(|(score, _)| **score == best)
            .map(|(_, decision)| decision)
            .collect();
        let share = row_weight / winners.len() as f64;
        for decision in winners {
            match totals.iter_mut().find(|(seen, _)| seen == decision) {
                Some((_, total)) => *total += share,
                None => totals.push((decision.clone(), share)),
            }
        }
    }
    totals.retain(|(_, p)| *p > MIN_PROBABILITY);
    let kept: f64 = totals.iter().map(|(_, p)| p).sum();
    if kept <= 0.0 {
        return vec![(Decision::struggle(), 1.0)];
    }
    for (_, p) in totals.iter_mut() {
        *p /= kept;
    }
    totals
}
