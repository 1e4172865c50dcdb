// Raw FPL API records as delivered by a data source.
//
// Every field is optional on the wire. Numeric fields are read leniently: a
// JSON number, a numeric string ("5.3"), or null are all accepted, and
// anything unreadable collapses to the field's default instead of failing the
// whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// bootstrap-static
// ---------------------------------------------------------------------------

/// The `bootstrap-static` payload, reduced to the three tables the
/// recommender reads. Unknown top-level keys (events, phases, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBootstrap {
    pub elements: Vec<RawElement>,
    pub teams: Vec<RawTeam>,
    pub element_types: Vec<RawElementType>,
}

/// One player row (`elements[]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawElement {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub web_name: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub second_name: String,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub team: u32,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub element_type: u32,
    /// Price in tenths of a currency unit (55 = 5.5).
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub now_cost: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub form: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub points_per_game: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub selected_by_percent: f64,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub minutes: u32,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub chance_of_playing_next_round: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub expected_points: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub ict_index: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub value_season: f64,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub goals_scored: u32,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub assists: u32,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub clean_sheets: u32,
}

/// One club row (`teams[]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTeam {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub short_name: String,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub strength_overall_home: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub strength_overall_away: Option<f64>,
}

/// One position label row (`element_types[]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawElementType {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub singular_name_short: Option<String>,
}

// ---------------------------------------------------------------------------
// fixtures
// ---------------------------------------------------------------------------

/// One scheduled match from the `fixtures` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFixture {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub event: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub team_h: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub team_a: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub team_h_difficulty: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub team_a_difficulty: Option<u32>,
    #[serde(deserialize_with = "lenient::bool_or_false")]
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

pub(crate) mod lenient {
    use super::*;

    /// Read a JSON value as a finite number. Numeric strings are parsed;
    /// null, booleans, objects and non-finite values yield `None`.
    pub fn coerce_f64(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    /// Integral, non-negative numbers only.
    pub fn coerce_u32(value: &Value) -> Option<u32> {
        let n = coerce_f64(value)?;
        if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
            return None;
        }
        Some(n as u32)
    }

    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(coerce_f64(&value).unwrap_or(0.0))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(coerce_f64(&value))
    }

    /// Counts: negative values clamp to 0, fractional values round.
    pub fn u32_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(d)?;
        let n = coerce_f64(&value).unwrap_or(0.0).max(0.0).round();
        Ok(n.min(u32::MAX as f64) as u32)
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(coerce_u32(&value))
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
            _ => false,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
