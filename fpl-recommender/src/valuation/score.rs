// Composite player score: a weighted sum of form, output and fixture
// signals, minus a penalty for doubtful availability.

use crate::config::ScoreWeights;

/// Chance of playing (percent) at or above which no penalty applies.
pub const RISK_FREE_CHANCE: f64 = 60.0;

/// The per-player signals the composite score reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub form: f64,
    pub points_per_game: f64,
    pub fixture_outlook: f64,
    pub ict_index: f64,
    pub expected_points: f64,
    /// Percent chance of featuring next round; `None` means unknown.
    pub chance_of_playing: Option<f64>,
}

/// Minutes-risk penalty in `[-1, 0]`.
///
/// Unknown chance carries no penalty. Otherwise the penalty is
/// `-max(0, 60 - chance) / 60`: zero from 60% up, -1 at 0%. Chances outside
/// 0..=100 are clamped first, which keeps a bad negative feed value from
/// pushing the penalty below -1.
pub fn risk_penalty(chance_of_playing: Option<f64>) -> f64 {
    match chance_of_playing {
        Some(chance) if chance.is_finite() => {
            let chance = chance.clamp(0.0, 100.0);
            if chance >= RISK_FREE_CHANCE {
                return 0.0;
            }
            -(RISK_FREE_CHANCE - chance) / RISK_FREE_CHANCE
        }
        _ => 0.0,
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Weighted composite score. Non-finite inputs count as 0.
pub fn composite_score(inputs: &ScoreInputs, weights: &ScoreWeights) -> f64 {
    weights.form * finite_or_zero(inputs.form)
        + weights.points_per_game * finite_or_zero(inputs.points_per_game)
        + weights.fixture_outlook * finite_or_zero(inputs.fixture_outlook)
        + weights.ict_index * finite_or_zero(inputs.ict_index)
        + weights.expected_points * finite_or_zero(inputs.expected_points)
        + risk_penalty(inputs.chance_of_playing)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
