// HTTP service exposing recommendations over a shared player pool.
//
// Routes:
//   GET  /health       -> { ok, data_loaded }
//   POST /reload-data  -> { ok, reloaded } or 500
//   GET  /recommend    -> { items, shortfall } as JSON, or CSV on request

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{error, info, warn};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::app::{recommend, PlayerPool, RecommendDefaults, RecommendParams};
use crate::render::{compact_rows, detail_rows, rows_to_csv};
use crate::squad::parse::{parse_exclude_ids_lenient, parse_needs_lenient};

pub const MAX_FROM_TEAM_RANGE: std::ops::RangeInclusive<usize> = 1..=3;
pub const TOP_PER_POS_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_reply(status: StatusCode, detail: impl Into<String>) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            detail: detail.into(),
        }),
        status,
    )
    .into_response()
}

/// A parsed `/recommend` query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendQuery {
    pub params: RecommendParams,
    pub csv: bool,
    pub compact: bool,
}

/// An explicit value must lie in `range`. The configured default is pulled
/// into the range rather than rejected.
fn parse_ranged(
    query: &HashMap<String, String>,
    key: &str,
    default: usize,
    range: &std::ops::RangeInclusive<usize>,
) -> Result<usize, String> {
    let Some(raw) = query.get(key) else {
        return Ok(default.clamp(*range.start(), *range.end()));
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if range.contains(&n) => Ok(n),
        _ => Err(format!(
            "{key} must be an integer between {} and {}",
            range.start(),
            range.end()
        )),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate the query string. `budget` and `need` are required; the needs and
/// exclusions are parsed leniently, the numeric limits strictly. Omitted
/// limits fall back to `defaults`.
pub fn parse_recommend_query(
    query: &HashMap<String, String>,
    accept: Option<&str>,
    defaults: &RecommendDefaults,
) -> Result<RecommendQuery, String> {
    let budget = query
        .get("budget")
        .ok_or("missing required parameter: budget")?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite() && *b > 0.0)
        .ok_or("budget must be a positive number")?;

    let need = query.get("need").ok_or("missing required parameter: need")?;

    let max_from_team = parse_ranged(query, "max_from_team", defaults.max_from_team, &MAX_FROM_TEAM_RANGE)?;
    let top_per_pos = parse_ranged(query, "top_per_pos", defaults.top_per_pos, &TOP_PER_POS_RANGE)?;

    let compact = match query.get("compact") {
        None => true,
        Some(raw) => parse_flag(raw).ok_or("compact must be true or false")?,
    };

    let wants_csv_format = query
        .get("format")
        .is_some_and(|f| f.trim().eq_ignore_ascii_case("csv"));
    let wants_csv_header = accept.is_some_and(|a| a.to_ascii_lowercase().contains("text/csv"));

    Ok(RecommendQuery {
        params: RecommendParams {
            budget,
            needs: parse_needs_lenient(need),
            exclude: query
                .get("exclude")
                .map(|e| parse_exclude_ids_lenient(e))
                .unwrap_or_default(),
            max_from_team,
            top_per_pos,
        },
        csv: wants_csv_format || wants_csv_header,
        compact,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(pool: Arc<PlayerPool>) -> Result<Response, Infallible> {
    let body = serde_json::json!({
        "ok": true,
        "data_loaded": pool.is_loaded().await,
    });
    Ok(warp::reply::json(&body).into_response())
}

async fn reload_data(pool: Arc<PlayerPool>) -> Result<Response, Infallible> {
    match pool.reload().await {
        Ok(players) => {
            info!(players = players.len(), "reloaded player data");
            Ok(warp::reply::json(&serde_json::json!({ "ok": true, "reloaded": true })).into_response())
        }
        Err(e) => {
            error!("reload failed: {e:#}");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Reload failed: {e:#}"),
            ))
        }
    }
}

async fn recommend_handler(
    query: HashMap<String, String>,
    accept: Option<String>,
    pool: Arc<PlayerPool>,
) -> Result<Response, Infallible> {
    let defaults = pool.defaults();
    let parsed = match parse_recommend_query(&query, accept.as_deref(), &defaults) {
        Ok(parsed) => parsed,
        Err(detail) => {
            warn!(%detail, "rejected /recommend query");
            return Ok(error_reply(StatusCode::BAD_REQUEST, detail));
        }
    };
    if let Err(detail) = parsed.params.check_squad_size(defaults.squad_size) {
        warn!(%detail, "request exceeds squad size, recommending anyway");
    }

    let players = match pool.get().await {
        Ok(players) => players,
        Err(e) => {
            error!("player data unavailable: {e:#}");
            return Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Player data not loaded: {e:#}"),
            ));
        }
    };

    let result = recommend(&players, &parsed.params);
    info!(
        rows = result.picks.len(),
        budget = parsed.params.budget,
        "generated recommendations"
    );

    if parsed.csv {
        let text = if parsed.compact {
            rows_to_csv(&compact_rows(&result))
        } else {
            rows_to_csv(&detail_rows(&result))
        };
        return Ok(match text {
            Ok(text) => warp::reply::with_header(
                warp::reply::with_header(text, CONTENT_TYPE, "text/csv; charset=utf-8"),
                CONTENT_DISPOSITION,
                "attachment; filename=\"recommendations.csv\"",
            )
            .into_response(),
            Err(e) => error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Recommendation error: {e:#}"),
            ),
        });
    }

    let items = if parsed.compact {
        serde_json::to_value(compact_rows(&result))
    } else {
        serde_json::to_value(&result.picks)
    };
    Ok(match items {
        Ok(items) => warp::reply::json(&serde_json::json!({
            "items": items,
            "shortfall": result.shortfall(),
        }))
        .into_response(),
        Err(e) => error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Recommendation error: {e}"),
        ),
    })
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn routes(
    pool: Arc<PlayerPool>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let pool_filter = warp::any().map(move || pool.clone());

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(pool_filter.clone())
        .and_then(health);

    let reload_route = warp::path("reload-data")
        .and(warp::path::end())
        .and(warp::post())
        .and(pool_filter.clone())
        .and_then(reload_data);

    let recommend_route = warp::path("recommend")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::optional::<String>("accept"))
        .and(pool_filter)
        .and_then(recommend_handler);

    health_route.or(reload_route).or(recommend_route).with(
        warp::cors()
            .allow_any_origin()
            .allow_headers(vec!["content-type", "accept"])
            .allow_methods(vec!["GET", "POST", "OPTIONS"]),
    )
}

/// Bind on localhost and serve until `shutdown` resolves.
pub async fn serve(
    pool: Arc<PlayerPool>,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let (bound, server) = warp::serve(routes(pool))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .with_context(|| format!("failed to bind HTTP server on {addr}"))?;
    info!("HTTP server listening on http://{bound}");
    server.await;
    info!("HTTP server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
