// Greedy constrained allocation of transfer targets.
//
// Positions are filled one at a time in request order. Within a position the
// best-scored candidates are walked in order and each is taken if it still
// fits the remaining budget and its club is under the per-team cap. There is
// no backtracking: a position processed early can spend budget that a later
// position would have used better, and a position that cannot be filled is
// reported as a shortfall rather than an error.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::squad::position::Position;
use crate::valuation::frame::{sort_by_score_desc, PlayerRecord};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What to buy: budget, ordered positional needs, players to skip and the
/// per-club cap.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    /// Money available for all picks combined.
    pub budget: f64,
    /// Most accepted players from any one club.
    pub max_per_team: usize,
    /// Player ids never to recommend (typically the current squad).
    pub excluded: HashSet<u32>,
    /// Approximation control: only the top `n` scored candidates of each
    /// position are considered. Candidates beyond the cutoff are never
    /// looked at, even when they would fit the budget. `None` considers all.
    pub candidate_cutoff: Option<usize>,
    needs: Vec<(Position, usize)>,
}

impl AllocationRequest {
    pub fn new(budget: f64, max_per_team: usize) -> Self {
        Self {
            budget,
            max_per_team,
            excluded: HashSet::new(),
            candidate_cutoff: None,
            needs: Vec::new(),
        }
    }

    /// Add `count` players needed at `position`. Zero counts are ignored; a
    /// position requested twice accumulates into its first slot in the order.
    pub fn with_need(mut self, position: Position, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        match self.needs.iter_mut().find(|(pos, _)| *pos == position) {
            Some((_, existing)) => *existing += count,
            None => self.needs.push((position, count)),
        }
        self
    }

    pub fn with_needs(self, needs: impl IntoIterator<Item = (Position, usize)>) -> Self {
        needs
            .into_iter()
            .fold(self, |req, (pos, count)| req.with_need(pos, count))
    }

    pub fn with_excluded(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.excluded.extend(ids);
        self
    }

    pub fn with_cutoff(mut self, cutoff: Option<usize>) -> Self {
        self.candidate_cutoff = cutoff;
        self
    }

    /// Needs in processing order.
    pub fn needs(&self) -> &[(Position, usize)] {
        &self.needs
    }

    pub fn total_needed(&self) -> usize {
        self.needs.iter().map(|(_, n)| n).sum()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// An accepted player with the running spend after adding them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    #[serde(flatten)]
    pub player: PlayerRecord,
    pub cumulative_spend: f64,
}

/// Requested versus delivered count for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionFill {
    pub position: Position,
    pub requested: usize,
    pub delivered: usize,
}

impl PositionFill {
    pub fn missing(&self) -> usize {
        self.requested - self.delivered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    /// Accepted players in selection order.
    pub picks: Vec<Pick>,
    /// One entry per requested position, in processing order.
    pub fills: Vec<PositionFill>,
    pub total_spend: f64,
}

impl AllocationResult {
    /// Positions that could not be filled completely.
    pub fn shortfall(&self) -> Vec<PositionFill> {
        self.fills.iter().filter(|f| f.missing() > 0).copied().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.fills.iter().all(|f| f.missing() == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Budget in whole tenths, rounded down so accepted spend never exceeds the
/// requested amount.
fn budget_in_tenths(budget: f64) -> i64 {
    if !budget.is_finite() {
        return 0;
    }
    (budget * 10.0 + 1e-9).floor() as i64
}

/// Greedily pick players for each requested position under the budget and
/// per-team cap. Deterministic: identical inputs give identical results.
pub fn allocate(players: &[PlayerRecord], request: &AllocationRequest) -> AllocationResult {
    let mut pool: Vec<PlayerRecord> = players
        .iter()
        .filter(|p| !request.excluded.contains(&p.id))
        .cloned()
        .collect();
    sort_by_score_desc(&mut pool);

    let budget_tenths = budget_in_tenths(request.budget);
    let cutoff = request.candidate_cutoff.unwrap_or(usize::MAX);

    let mut spent_tenths: i64 = 0;
    let mut team_counts: HashMap<u32, usize> = HashMap::new();
    let mut picks: Vec<Pick> = Vec::new();
    let mut fills: Vec<PositionFill> = Vec::with_capacity(request.needs.len());

    for &(position, requested) in request.needs() {
        let mut remaining = requested;

        for candidate in pool.iter().filter(|p| p.position == position).take(cutoff) {
            if remaining == 0 {
                break;
            }

            let price = i64::from(candidate.cost_tenths);
            if spent_tenths + price > budget_tenths {
                continue;
            }
            let held = team_counts.entry(candidate.team_id).or_insert(0);
            if *held >= request.max_per_team {
                continue;
            }

            *held += 1;
            spent_tenths += price;
            remaining -= 1;
            picks.push(Pick {
                player: candidate.clone(),
                cumulative_spend: spent_tenths as f64 / 10.0,
            });
        }

        let delivered = requested - remaining;
        debug!(%position, requested, delivered, "filled position");
        fills.push(PositionFill {
            position,
            requested,
            delivered,
        });
    }

    let result = AllocationResult {
        picks,
        fills,
        total_spend: spent_tenths as f64 / 10.0,
    };
    info!(
        picks = result.picks.len(),
        requested = request.total_needed(),
        total_spend = result.total_spend,
        "allocation complete"
    );
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u32, position: Position, team: u32, cost_tenths: u32, score: f64) -> PlayerRecord {
        let mut p = PlayerRecord::new(id, format!("P{id}"), team, position, cost_tenths);
        p.score = score;
        p
    }

    fn ids(result: &AllocationResult) -> Vec<u32> {
        result.picks.iter().map(|p| p.player.id).collect()
    }

    #[test]
    fn budget_blocks_later_position() {
        let players = vec![
            player(1, Position::Defender, 5, 60, 9.0),
            player(2, Position::Defender, 5, 50, 8.0),
            player(3, Position::Midfielder, 7, 50, 7.5),
        ];
        let request = AllocationRequest::new(10.0, 3)
            .with_need(Position::Defender, 1)
            .with_need(Position::Midfielder, 1);

        let result = allocate(&players, &request);
        assert_eq!(ids(&result), vec![1]);
        assert_eq!(result.picks[0].cumulative_spend, 6.0);
        assert_eq!(result.total_spend, 6.0);
        assert_eq!(
            result.shortfall(),
            vec![PositionFill {
                position: Position::Midfielder,
                requested: 1,
                delivered: 0,
            }]
        );
        assert!(!result.is_complete());
    }

    #[test]
    fn skipped_candidate_does_not_stop_the_walk() {
        let players = vec![
            player(1, Position::Forward, 1, 120, 9.0),
            player(2, Position::Forward, 2, 70, 8.0),
            player(3, Position::Forward, 3, 45, 7.0),
        ];
        let request = AllocationRequest::new(12.0, 3).with_need(Position::Forward, 2);
        let result = allocate(&players, &request);
        // 12.0 buys player 1 alone; 2 and 3 no longer fit after that.
        assert_eq!(ids(&result), vec![1]);

        let request = AllocationRequest::new(11.5, 3).with_need(Position::Forward, 2);
        let result = allocate(&players, &request);
        assert_eq!(ids(&result), vec![2, 3]);
        assert_eq!(result.picks[1].cumulative_spend, 11.5);
        assert!(result.is_complete());
    }

    #[test]
    fn team_cap_enforced_across_positions() {
        let players = vec![
            player(1, Position::Defender, 1, 40, 9.0),
            player(2, Position::Defender, 1, 40, 8.0),
            player(3, Position::Defender, 2, 40, 7.0),
            player(4, Position::Midfielder, 1, 40, 9.5),
            player(5, Position::Midfielder, 3, 40, 6.0),
        ];
        let request = AllocationRequest::new(100.0, 2)
            .with_need(Position::Defender, 2)
            .with_need(Position::Midfielder, 1);
        let result = allocate(&players, &request);
        // Team 1 reaches the cap with the two defenders; its midfielder is skipped.
        assert_eq!(ids(&result), vec![1, 2, 5]);
    }

    #[test]
    fn excluded_players_never_picked() {
        let players = vec![
            player(1, Position::Goalkeeper, 1, 50, 9.0),
            player(2, Position::Goalkeeper, 2, 45, 5.0),
        ];
        let request = AllocationRequest::new(100.0, 3)
            .with_need(Position::Goalkeeper, 1)
            .with_excluded([1]);
        assert_eq!(ids(&allocate(&players, &request)), vec![2]);
    }

    #[test]
    fn cutoff_hides_affordable_candidates() {
        let players = vec![
            player(1, Position::Midfielder, 1, 130, 9.0),
            player(2, Position::Midfielder, 2, 120, 8.0),
            player(3, Position::Midfielder, 3, 45, 4.0),
        ];
        let request = AllocationRequest::new(5.0, 3)
            .with_need(Position::Midfielder, 1)
            .with_cutoff(Some(2));
        let result = allocate(&players, &request);
        assert!(result.is_empty());
        assert_eq!(result.shortfall()[0].missing(), 1);

        let result = allocate(&players, &request.clone().with_cutoff(None));
        assert_eq!(ids(&result), vec![3]);
    }

    #[test]
    fn input_order_does_not_matter_but_ties_keep_it() {
        let players = vec![
            player(1, Position::Defender, 1, 40, 5.0),
            player(2, Position::Defender, 2, 40, 7.0),
            player(3, Position::Defender, 3, 40, 5.0),
        ];
        let request = AllocationRequest::new(100.0, 3).with_need(Position::Defender, 2);
        assert_eq!(ids(&allocate(&players, &request)), vec![2, 1]);
    }

    #[test]
    fn deterministic_across_runs() {
        let players: Vec<PlayerRecord> = (0..40)
            .map(|i| {
                let pos = Position::ALL[(i % 4) as usize];
                player(i, pos, i % 6, 40 + (i * 7) % 60, ((i * 13) % 10) as f64)
            })
            .collect();
        let request = AllocationRequest::new(45.0, 2)
            .with_needs([(Position::Midfielder, 3), (Position::Defender, 2), (Position::Forward, 2)])
            .with_cutoff(Some(8));
        assert_eq!(allocate(&players, &request), allocate(&players, &request));
    }

    #[test]
    fn needs_merge_and_skip_zero() {
        let request = AllocationRequest::new(10.0, 3)
            .with_need(Position::Midfielder, 1)
            .with_need(Position::Goalkeeper, 0)
            .with_need(Position::Defender, 1)
            .with_need(Position::Midfielder, 2);
        assert_eq!(
            request.needs(),
            &[(Position::Midfielder, 3), (Position::Defender, 1)]
        );
        assert_eq!(request.total_needed(), 4);
    }

    #[test]
    fn tenths_arithmetic_is_exact() {
        let players = vec![
            player(1, Position::Defender, 1, 1, 2.0),
            player(2, Position::Defender, 2, 2, 1.0),
        ];
        let request = AllocationRequest::new(0.3, 3).with_need(Position::Defender, 2);
        let result = allocate(&players, &request);
        assert_eq!(ids(&result), vec![1, 2]);
        assert_eq!(result.total_spend, 0.3);
    }

    #[test]
    fn no_candidates_is_a_shortfall_not_an_error() {
        let request = AllocationRequest::new(50.0, 3).with_need(Position::Forward, 3);
        let result = allocate(&[], &request);
        assert!(result.is_empty());
        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.shortfall()[0].missing(), 3);
    }

    #[test]
    fn invariants_hold_over_generated_inputs() {
        // Small LCG so the test stays deterministic without extra crates.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        for _ in 0..200 {
            let n = 1 + next(60) as u32;
            let players: Vec<PlayerRecord> = (0..n)
                .map(|id| {
                    player(
                        id,
                        Position::ALL[next(4) as usize],
                        next(8) as u32,
                        next(140) as u32,
                        next(1000) as f64 / 100.0,
                    )
                })
                .collect();
            let budget = next(1000) as f64 / 10.0;
            let cap = 1 + next(3) as usize;
            let request = AllocationRequest::new(budget, cap)
                .with_needs(Position::ALL.map(|p| (p, next(4) as usize)))
                .with_cutoff(if next(2) == 0 { None } else { Some(1 + next(10) as usize) });

            let result = allocate(&players, &request);

            if let Some(last) = result.picks.last() {
                assert!(last.cumulative_spend <= budget, "{} > {budget}", last.cumulative_spend);
                assert_eq!(last.cumulative_spend, result.total_spend);
            }
            let mut per_team: HashMap<u32, usize> = HashMap::new();
            for pick in &result.picks {
                *per_team.entry(pick.player.team_id).or_default() += 1;
            }
            assert!(per_team.values().all(|&c| c <= cap));
            for fill in &result.fills {
                let delivered = result
                    .picks
                    .iter()
                    .filter(|p| p.player.position == fill.position)
                    .count();
                assert_eq!(delivered, fill.delivered);
                assert!(fill.delivered <= fill.requested);
            }
        }
    }
}
