// Fixture outlook: how kind a team's next few matches look.
//
// Each upcoming fixture is scored from the side's own difficulty rating and
// the opponent's normalized strength, both inverted so that higher means
// easier, plus a small bonus for playing at home.

use tracing::{debug, warn};

use crate::config::FixtureSettings;
use crate::source::raw::RawFixture;
use crate::valuation::strength::TeamStrengths;

/// Weight of the inverted fixture difficulty rating.
pub const FDR_WEIGHT: f64 = 0.6;
/// Weight of the inverted opponent strength.
pub const OPPONENT_WEIGHT: f64 = 0.3;

/// FDR and strength both live on 1..=5; `6 - x` flips them so 5 is easiest.
const INVERSION_BASE: f64 = 6.0;

/// A scheduled match with both sides' difficulty ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureRecord {
    pub home_team: u32,
    pub away_team: u32,
    pub home_difficulty: u32,
    pub away_difficulty: u32,
    pub finished: bool,
}

/// Convert raw fixtures into [`FixtureRecord`]s, keeping input order.
///
/// Returns `None` when the input is empty or any of the four required
/// fields (`team_h`, `team_a`, `team_h_difficulty`, `team_a_difficulty`) is
/// carried by no record at all; callers then disable the outlook. Individual
/// records that lack one of those values are skipped.
pub fn usable_fixtures(raw: &[RawFixture]) -> Option<Vec<FixtureRecord>> {
    if raw.is_empty() {
        return None;
    }

    let required: [(&str, fn(&RawFixture) -> bool); 4] = [
        ("team_h", |f| f.team_h.is_some()),
        ("team_a", |f| f.team_a.is_some()),
        ("team_h_difficulty", |f| f.team_h_difficulty.is_some()),
        ("team_a_difficulty", |f| f.team_a_difficulty.is_some()),
    ];
    for (field, present) in required {
        if !raw.iter().any(present) {
            warn!("fixtures carry no `{field}` values; fixture outlook disabled");
            return None;
        }
    }

    let mut skipped = 0usize;
    let records: Vec<FixtureRecord> = raw
        .iter()
        .filter_map(|f| {
            let record = complete_record(f);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "skipped incomplete fixture records");
    }
    Some(records)
}

fn complete_record(f: &RawFixture) -> Option<FixtureRecord> {
    Some(FixtureRecord {
        home_team: f.team_h?,
        away_team: f.team_a?,
        home_difficulty: f.team_h_difficulty?,
        away_difficulty: f.team_a_difficulty?,
        finished: f.finished,
    })
}

/// Mean per-fixture ease over the team's next `settings.horizon` unfinished
/// fixtures, taken in input order (no date sort is applied here).
///
/// Per fixture: `0.6 * (6 - fdr) + 0.3 * (6 - opponent_strength) + home_bonus`.
/// Returns 0.0 when the team has no unfinished fixtures.
pub fn fixture_outlook(
    team: u32,
    fixtures: &[FixtureRecord],
    strengths: &TeamStrengths,
    settings: &FixtureSettings,
) -> f64 {
    let scores: Vec<f64> = fixtures
        .iter()
        .filter(|f| !f.finished && (f.home_team == team || f.away_team == team))
        .take(settings.horizon)
        .map(|f| {
            let is_home = f.home_team == team;
            let (fdr, opponent) = if is_home {
                (f.home_difficulty, f.away_team)
            } else {
                (f.away_difficulty, f.home_team)
            };
            let inv_fdr = INVERSION_BASE - fdr as f64;
            let inv_opp = INVERSION_BASE - strengths.get(opponent);
            let home_bonus = if is_home { settings.home_bonus } else { 0.0 };
            FDR_WEIGHT * inv_fdr + OPPONENT_WEIGHT * inv_opp + home_bonus
        })
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::strength::normalize_team_strengths;
    use std::collections::HashMap;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn fx(home: u32, away: u32, hd: u32, ad: u32, finished: bool) -> FixtureRecord {
        FixtureRecord {
            home_team: home,
            away_team: away,
            home_difficulty: hd,
            away_difficulty: ad,
            finished,
        }
    }

    /// Team 1 weakest (1.0), team 2 strongest (5.0), team 3 at 4.0.
    fn strengths() -> TeamStrengths {
        let raw: HashMap<u32, f64> = [(1, 1000.0), (2, 1400.0), (3, 1300.0)].into_iter().collect();
        normalize_team_strengths(&raw)
    }

    #[test]
    fn home_fixture_against_strength_four() {
        let s = strengths();
        assert!(approx_eq(s.get(3), 4.0));
        // inv_fdr = 4, inv_opp = 2, home bonus 0.2 -> 2.4 + 0.6 + 0.2
        let out = fixture_outlook(1, &[fx(1, 3, 2, 4, false)], &s, &FixtureSettings::default());
        assert!(approx_eq(out, 3.2));
    }

    #[test]
    fn away_side_uses_away_difficulty_and_no_bonus() {
        let s = strengths();
        // Team 3 away at team 1: fdr 4 -> inv 2, opponent 1.0 -> inv 5.
        let out = fixture_outlook(3, &[fx(1, 3, 2, 4, false)], &s, &FixtureSettings::default());
        assert!(approx_eq(out, 0.6 * 2.0 + 0.3 * 5.0));
    }

    #[test]
    fn no_qualifying_fixtures_is_exactly_zero() {
        let s = strengths();
        let settings = FixtureSettings::default();
        assert_eq!(fixture_outlook(1, &[], &s, &settings), 0.0);
        assert_eq!(fixture_outlook(9, &[fx(1, 2, 3, 3, false)], &s, &settings), 0.0);
        assert_eq!(fixture_outlook(1, &[fx(1, 2, 3, 3, true)], &s, &settings), 0.0);
    }

    #[test]
    fn finished_fixtures_skipped_and_horizon_respected() {
        let s = TeamStrengths::default();
        let fixtures = [
            fx(1, 2, 5, 1, true),  // finished, ignored
            fx(1, 2, 1, 5, false), // 0.6*5 + 0.3*3 + 0.2 = 4.1
            fx(2, 1, 5, 3, false), // away: 0.6*3 + 0.3*3 = 2.7
            fx(1, 3, 2, 4, false), // 0.6*4 + 0.3*3 + 0.2 = 3.5
            fx(3, 1, 1, 1, false), // beyond horizon of 3
        ];
        let out = fixture_outlook(1, &fixtures, &s, &FixtureSettings::default());
        assert!(approx_eq(out, (4.1 + 2.7 + 3.5) / 3.0));

        let one = FixtureSettings { horizon: 1, ..FixtureSettings::default() };
        assert!(approx_eq(fixture_outlook(1, &fixtures, &s, &one), 4.1));
    }

    #[test]
    fn unknown_opponent_is_neutral() {
        let s = TeamStrengths::default();
        let out = fixture_outlook(1, &[fx(1, 77, 3, 3, false)], &s, &FixtureSettings::default());
        assert!(approx_eq(out, 0.6 * 3.0 + 0.3 * 3.0 + 0.2));
    }

    #[test]
    fn usable_fixtures_requires_all_columns() {
        let complete = RawFixture {
            team_h: Some(1),
            team_a: Some(2),
            team_h_difficulty: Some(2),
            team_a_difficulty: Some(4),
            ..RawFixture::default()
        };
        assert_eq!(usable_fixtures(&[complete.clone()]).map(|v| v.len()), Some(1));

        let no_away_difficulty = RawFixture {
            team_a_difficulty: None,
            ..complete.clone()
        };
        assert!(usable_fixtures(&[no_away_difficulty.clone()]).is_none());
        assert!(usable_fixtures(&[]).is_none());

        // Column present on some records: incomplete ones are skipped.
        let mixed = usable_fixtures(&[no_away_difficulty, complete]).unwrap();
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].away_difficulty, 4);
    }
}
