// Presentation of allocation results: aligned text table, CSV and JSON, plus
// the compact row shape the HTTP service returns by default.

use serde::Serialize;

use crate::squad::{AllocationResult, Pick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn round_dp(x: f64, dp: i32) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(dp);
    (x * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

/// Full per-pick row used by the table and CSV output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub id: u32,
    pub name: String,
    pub team: String,
    pub pos: String,
    pub price: f64,
    pub score: f64,
    pub form: f64,
    pub ppg: f64,
    pub outlook: f64,
    pub chance: Option<f64>,
    pub value: f64,
    pub cumulative_spend: f64,
}

impl DetailRow {
    pub fn from_pick(pick: &Pick) -> Self {
        let p = &pick.player;
        Self {
            id: p.id,
            name: p.name.clone(),
            team: p.team_name.clone(),
            pos: p.position.display_str().to_string(),
            price: round_dp(p.price, 2),
            score: round_dp(p.score, 2),
            form: round_dp(p.form, 2),
            ppg: round_dp(p.points_per_game, 2),
            outlook: round_dp(p.fixture_outlook, 2),
            chance: p.chance_of_playing_next_round,
            value: round_dp(p.value(), 3),
            cumulative_spend: round_dp(pick.cumulative_spend, 1),
        }
    }
}

/// Minimal row for UI consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactRow {
    pub id: u32,
    pub name: String,
    pub team: String,
    pub pos: String,
    pub price: f64,
    pub form: f64,
    pub ppg: f64,
    pub score: f64,
}

impl CompactRow {
    pub fn from_pick(pick: &Pick) -> Self {
        let p = &pick.player;
        let team = if p.team_short.is_empty() {
            p.team_name.clone()
        } else {
            p.team_short.clone()
        };
        Self {
            id: p.id,
            name: p.name.clone(),
            team,
            pos: p.position.display_str().to_string(),
            price: round_dp(p.price, 1),
            form: round_dp(p.form, 2),
            ppg: round_dp(p.points_per_game, 2),
            score: round_dp(p.score, 2),
        }
    }
}

pub fn detail_rows(result: &AllocationResult) -> Vec<DetailRow> {
    result.picks.iter().map(DetailRow::from_pick).collect()
}

pub fn compact_rows(result: &AllocationResult) -> Vec<CompactRow> {
    result.picks.iter().map(CompactRow::from_pick).collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Serialize rows as CSV with a header line. No rows gives an empty string.
pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

pub const NO_RECOMMENDATIONS: &str = "No valid recommendations under the given constraints.";

const TABLE_HEADERS: [&str; 11] = [
    "id", "name", "team", "pos", "price", "score", "form", "ppg", "outlook", "chance", "value",
];

/// Aligned text table followed by the total spend and any unmet needs.
pub fn render_table(result: &AllocationResult) -> String {
    let mut out = String::new();

    if result.is_empty() {
        out.push_str(NO_RECOMMENDATIONS);
        out.push('\n');
    } else {
        let cells: Vec<[String; 11]> = detail_rows(result)
            .into_iter()
            .map(|r| {
                [
                    r.id.to_string(),
                    r.name,
                    r.team,
                    r.pos,
                    format!("{:.2}", r.price),
                    format!("{:.2}", r.score),
                    format!("{:.2}", r.form),
                    format!("{:.2}", r.ppg),
                    format!("{:.2}", r.outlook),
                    r.chance.map(|c| format!("{c:.0}")).unwrap_or_default(),
                    format!("{:.3}", r.value),
                ]
            })
            .collect();

        let mut widths = TABLE_HEADERS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        // id and the text columns (name, team, pos) are left-aligned, the
        // measurements right-aligned.
        let line = |row: &[String]| -> String {
            row.iter()
                .enumerate()
                .map(|(i, cell)| match i {
                    0..=3 => format!("{cell:<width$}", width = widths[i]),
                    _ => format!("{cell:>width$}", width = widths[i]),
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let header: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
        out.push_str(&line(&header));
        out.push('\n');
        for row in &cells {
            out.push_str(&line(row));
            out.push('\n');
        }
    }

    out.push_str(&format!("\nTotal spend: {:.1}\n", result.total_spend));
    for fill in result.shortfall() {
        out.push_str(&format!(
            "Unmet need: {} {} of {} filled\n",
            fill.position, fill.delivered, fill.requested
        ));
    }
    out
}

pub fn render_json(result: &AllocationResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn render(result: &AllocationResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Csv => rows_to_csv(&detail_rows(result)),
        OutputFormat::Json => render_json(result),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
