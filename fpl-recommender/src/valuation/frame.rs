// Player frame: joins raw players, teams, position labels and fixtures into
// the scored, eligibility-filtered record set the allocator consumes.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::source::raw::{RawBootstrap, RawElementType, RawFixture};
use crate::squad::position::Position;
use crate::valuation::outlook::{fixture_outlook, usable_fixtures};
use crate::valuation::score::{composite_score, risk_penalty, ScoreInputs};
use crate::valuation::strength::{normalize_team_strengths, raw_team_strength};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("player record {index} is missing required field `{field}`")]
    MissingRequiredField { index: usize, field: &'static str },
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// FPL availability status (`status` field of an element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
    NotInSquad,
    Unknown,
}

impl Availability {
    /// Parse the one-letter FPL status code.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "a" => Availability::Available,
            "d" => Availability::Doubtful,
            "i" => Availability::Injured,
            "s" => Availability::Suspended,
            "u" => Availability::Unavailable,
            "n" => Availability::NotInSquad,
            _ => Availability::Unknown,
        }
    }

    /// Only available and doubtful players are scored for selection;
    /// doubt is already priced in through the risk penalty.
    pub fn is_selectable(&self) -> bool {
        matches!(self, Availability::Available | Availability::Doubtful)
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// One eligible player with its derived risk, outlook and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub name: String,
    pub full_name: String,
    pub team_id: u32,
    pub team_name: String,
    pub team_short: String,
    pub position: Position,
    pub price: f64,
    /// Price in tenths of a currency unit; the allocator budgets in these.
    #[serde(skip)]
    pub cost_tenths: u32,
    pub form: f64,
    pub points_per_game: f64,
    pub selected_by_percent: f64,
    pub minutes: u32,
    pub status: Availability,
    pub chance_of_playing_next_round: Option<f64>,
    pub ict_index: f64,
    pub value_season: f64,
    pub expected_points: f64,
    pub goals_scored: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub risk_penalty: f64,
    pub fixture_outlook: f64,
    pub score: f64,
}

impl PlayerRecord {
    /// A record with the given identity and price and every signal at its
    /// neutral default.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        team_id: u32,
        position: Position,
        cost_tenths: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            full_name: String::new(),
            team_id,
            team_name: String::new(),
            team_short: String::new(),
            position,
            price: cost_tenths as f64 / 10.0,
            cost_tenths,
            form: 0.0,
            points_per_game: 0.0,
            selected_by_percent: 0.0,
            minutes: 0,
            status: Availability::Available,
            chance_of_playing_next_round: None,
            ict_index: 0.0,
            value_season: 0.0,
            expected_points: 0.0,
            goals_scored: 0,
            assists: 0,
            clean_sheets: 0,
            risk_penalty: 0.0,
            fixture_outlook: 0.0,
            score: 0.0,
        }
    }

    /// Points per game per unit of price; 0 for free players.
    pub fn value(&self) -> f64 {
        if self.price > 0.0 {
            self.points_per_game / self.price
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// Map `element_type` ids to positions from the label table, or from the
/// built-in {1: GK, 2: DEF, 3: MID, 4: FWD} table when no usable labels were
/// supplied. Labels outside the four positions map to nothing.
fn position_table(element_types: &[RawElementType]) -> HashMap<u32, Option<Position>> {
    let labelled: HashMap<u32, Option<Position>> = element_types
        .iter()
        .filter_map(|et| {
            let label = et.singular_name_short.as_deref()?;
            Some((et.id?, Position::from_str_pos(label)))
        })
        .collect();

    if !labelled.is_empty() {
        return labelled;
    }

    debug!("no usable position labels; using built-in element type table");
    Position::ALL
        .iter()
        .map(|&pos| (pos.element_type(), Some(pos)))
        .collect()
}

/// Sort by descending score. `sort_by` is stable, so ties keep input order.
pub fn sort_by_score_desc(players: &mut [PlayerRecord]) {
    players.sort_by(|a, b| b.score.total_cmp(&a.score));
}

// ---------------------------------------------------------------------------
// Frame builder
// ---------------------------------------------------------------------------

/// Build the scored, eligible player set from raw API records.
///
/// Missing fields fall back to neutral defaults, missing position labels to
/// the built-in table, missing team data to empty names and neutral
/// strength, and unusable fixtures disable the outlook (0.0 for everyone).
/// The only hard failure is a player record without a readable `id`.
///
/// Players whose position cannot be resolved, and players that are not
/// available or doubtful, are left out. The result is sorted by descending
/// score; ties keep input order.
pub fn build_player_frame(
    bootstrap: &RawBootstrap,
    fixtures: &[RawFixture],
    strategy: &StrategyConfig,
) -> Result<Vec<PlayerRecord>, FrameError> {
    let positions = position_table(&bootstrap.element_types);

    // Teams without an id are numbered by their 1-based position in the list.
    let mut team_names: HashMap<u32, (&str, &str)> = HashMap::new();
    let mut raw_strengths: HashMap<u32, f64> = HashMap::new();
    for (i, team) in bootstrap.teams.iter().enumerate() {
        let id = team.id.unwrap_or(i as u32 + 1);
        team_names.insert(id, (team.name.as_str(), team.short_name.as_str()));
        raw_strengths.insert(
            id,
            raw_team_strength(team.strength_overall_home, team.strength_overall_away),
        );
    }
    let strengths = normalize_team_strengths(&raw_strengths);

    let fixtures = usable_fixtures(fixtures);
    if fixtures.is_none() {
        info!("no usable fixtures; fixture outlook set to 0.0 for all players");
    }
    let mut outlook_by_team: HashMap<u32, f64> = HashMap::new();

    let mut players = Vec::with_capacity(bootstrap.elements.len());
    let mut unknown_position = 0usize;
    let mut unavailable = 0usize;

    for (index, raw) in bootstrap.elements.iter().enumerate() {
        let id = raw
            .id
            .ok_or(FrameError::MissingRequiredField { index, field: "id" })?;

        let status = Availability::from_code(raw.status.as_deref().unwrap_or("a"));
        if !status.is_selectable() {
            unavailable += 1;
            continue;
        }

        let Some(position) = positions.get(&raw.element_type).copied().flatten() else {
            unknown_position += 1;
            continue;
        };

        let outlook = match &fixtures {
            Some(fx) => *outlook_by_team.entry(raw.team).or_insert_with(|| {
                fixture_outlook(raw.team, fx, &strengths, &strategy.fixtures)
            }),
            None => 0.0,
        };

        let cost_tenths = raw.now_cost.max(0.0).round() as u32;
        let (team_name, team_short) = team_names.get(&raw.team).copied().unwrap_or(("", ""));

        let mut player = PlayerRecord::new(id, raw.web_name.clone(), raw.team, position, cost_tenths);
        player.full_name = format!("{} {}", raw.first_name, raw.second_name)
            .trim()
            .to_string();
        player.team_name = team_name.to_string();
        player.team_short = team_short.to_string();
        player.form = raw.form;
        player.points_per_game = raw.points_per_game;
        player.selected_by_percent = raw.selected_by_percent;
        player.minutes = raw.minutes;
        player.status = status;
        player.chance_of_playing_next_round = raw.chance_of_playing_next_round;
        player.ict_index = raw.ict_index;
        player.value_season = raw.value_season;
        player.expected_points = raw.expected_points;
        player.goals_scored = raw.goals_scored;
        player.assists = raw.assists;
        player.clean_sheets = raw.clean_sheets;
        player.fixture_outlook = outlook;
        player.risk_penalty = risk_penalty(raw.chance_of_playing_next_round);
        player.score = composite_score(
            &ScoreInputs {
                form: raw.form,
                points_per_game: raw.points_per_game,
                fixture_outlook: outlook,
                ict_index: raw.ict_index,
                expected_points: raw.expected_points,
                chance_of_playing: raw.chance_of_playing_next_round,
            },
            &strategy.weights,
        );

        players.push(player);
    }

    if unknown_position > 0 {
        warn!(unknown_position, "dropped players with an unmapped position");
    }
    debug!(unavailable, "dropped unavailable players");

    sort_by_score_desc(&mut players);
    info!(
        players = players.len(),
        teams = strengths.len(),
        "built player frame"
    );
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
