// Team strength normalization onto the fixed 1-5 band used by the fixture
// outlook.

use std::collections::HashMap;

/// Strength assumed for any team without a rating.
pub const NEUTRAL_STRENGTH: f64 = 3.0;

pub const MIN_STRENGTH: f64 = 1.0;
pub const MAX_STRENGTH: f64 = 5.0;

/// Spread below which every team is treated as equally strong.
const SPREAD_EPSILON: f64 = 1e-9;

/// Raw strength of one club: the mean of its home and away overall ratings,
/// with a missing side counted as neutral.
pub fn raw_team_strength(home: Option<f64>, away: Option<f64>) -> f64 {
    (home.unwrap_or(NEUTRAL_STRENGTH) + away.unwrap_or(NEUTRAL_STRENGTH)) / 2.0
}

/// Normalized team strengths keyed by team id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamStrengths {
    by_team: HashMap<u32, f64>,
}

impl TeamStrengths {
    /// Strength of `team`, or [`NEUTRAL_STRENGTH`] when unknown.
    pub fn get(&self, team: u32) -> f64 {
        self.by_team.get(&team).copied().unwrap_or(NEUTRAL_STRENGTH)
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.by_team.iter().map(|(&team, &s)| (team, s))
    }
}

/// Rescale raw strengths linearly so the weakest team lands on 1 and the
/// strongest on 5: `1 + 4 * (raw - min) / (max - min)`.
///
/// When every team has the same raw value the spread is zero and all teams
/// map to 3. A spread under 1e-9 counts as zero too, so ratings that differ
/// only by float noise do not blow up to the band edges. Empty input yields
/// an empty mapping.
pub fn normalize_team_strengths(raw: &HashMap<u32, f64>) -> TeamStrengths {
    if raw.is_empty() {
        return TeamStrengths::default();
    }

    let lo = raw.values().copied().fold(f64::INFINITY, f64::min);
    let hi = raw.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = hi - lo;

    let by_team = raw
        .iter()
        .map(|(&team, &value)| {
            let normalized = if spread < SPREAD_EPSILON {
                NEUTRAL_STRENGTH
            } else {
                MIN_STRENGTH + (MAX_STRENGTH - MIN_STRENGTH) * (value - lo) / spread
            };
            (team, normalized)
        })
        .collect();

    TeamStrengths { by_team }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
