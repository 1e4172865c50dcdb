// Application orchestration: load raw data from a source, build the scored
// player set, and run recommendations against it.
//
// The CLI loads once per run. The HTTP service keeps the scored set in a
// `PlayerPool`, which rebuilds it when the snapshot expires or on request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{Config, StrategyConfig};
use crate::source::DataSource;
use crate::squad::{allocate, AllocationRequest, AllocationResult, Position};
use crate::valuation::{build_player_frame, PlayerRecord};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Fetch both payloads and build the scored player set.
///
/// A fixtures failure is not fatal: the set is built without fixture
/// outlook, as it would be for a payload lacking fixture columns.
pub async fn load_players(
    source: &dyn DataSource,
    strategy: &StrategyConfig,
) -> anyhow::Result<Vec<PlayerRecord>> {
    let bootstrap = source
        .bootstrap()
        .await
        .with_context(|| format!("failed to load bootstrap data from {}", source.describe()))?;

    let fixtures = match source.fixtures().await {
        Ok(fixtures) => fixtures,
        Err(e) => {
            warn!("failed to load fixtures, continuing without outlook: {e:#}");
            Vec::new()
        }
    };

    let players = build_player_frame(&bootstrap, &fixtures, strategy)?;
    info!(
        players = players.len(),
        elements = bootstrap.elements.len(),
        fixtures = fixtures.len(),
        "player set built"
    );
    Ok(players)
}

// ---------------------------------------------------------------------------
// Recommendation parameters
// ---------------------------------------------------------------------------

/// Per-request defaults taken from config: the club cap, the per-position
/// candidate cutoff, and the squad size used to sanity-check requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendDefaults {
    pub max_from_team: usize,
    pub top_per_pos: usize,
    pub squad_size: usize,
}

impl Default for RecommendDefaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RecommendDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_from_team: config.league.max_from_team,
            top_per_pos: config.strategy.allocation.top_per_pos,
            squad_size: config.league.squad_size,
        }
    }
}

/// One recommendation request as the CLI or HTTP layer understands it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendParams {
    pub budget: f64,
    pub needs: Vec<(Position, usize)>,
    pub exclude: Vec<u32>,
    pub max_from_team: usize,
    pub top_per_pos: usize,
}

impl RecommendParams {
    /// Parameters with league and strategy defaults for the cap and cutoff.
    pub fn with_defaults(budget: f64, needs: Vec<(Position, usize)>, config: &Config) -> Self {
        let defaults = RecommendDefaults::from_config(config);
        Self {
            budget,
            needs,
            exclude: Vec::new(),
            max_from_team: defaults.max_from_team,
            top_per_pos: defaults.top_per_pos,
        }
    }

    /// Players owned plus players requested. Excluded ids are the squad the
    /// user already has.
    pub fn squad_after(&self) -> usize {
        self.exclude.len() + self.needs.iter().map(|(_, n)| n).sum::<usize>()
    }

    /// Error text when the request would grow the squad past `squad_size`.
    pub fn check_squad_size(&self, squad_size: usize) -> Result<(), String> {
        let total = self.squad_after();
        if total > squad_size {
            return Err(format!(
                "{} owned plus {} requested is {total}, more than a squad of {squad_size}",
                self.exclude.len(),
                total - self.exclude.len()
            ));
        }
        Ok(())
    }

    pub fn to_request(&self) -> AllocationRequest {
        AllocationRequest::new(self.budget, self.max_from_team)
            .with_needs(self.needs.iter().copied())
            .with_excluded(self.exclude.iter().copied())
            .with_cutoff(Some(self.top_per_pos))
    }
}

pub fn recommend(players: &[PlayerRecord], params: &RecommendParams) -> AllocationResult {
    allocate(players, &params.to_request())
}

// ---------------------------------------------------------------------------
// PlayerPool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Snapshot {
    players: Arc<Vec<PlayerRecord>>,
    loaded_at: DateTime<Utc>,
}

/// Shared, lazily built player set with a time-to-live.
///
/// Readers get an `Arc` of the current snapshot and never hold the lock while
/// allocating. A failed rebuild leaves the previous snapshot in place.
pub struct PlayerPool {
    source: Arc<dyn DataSource>,
    strategy: StrategyConfig,
    /// `None` keeps a snapshot until an explicit reload.
    ttl: Option<Duration>,
    defaults: RecommendDefaults,
    snapshot: RwLock<Option<Snapshot>>,
}

impl PlayerPool {
    pub fn new(source: Arc<dyn DataSource>, strategy: StrategyConfig, ttl: Option<Duration>) -> Self {
        Self {
            source,
            strategy,
            ttl,
            defaults: RecommendDefaults::default(),
            snapshot: RwLock::new(None),
        }
    }

    /// TTL taken from `server.snapshot_ttl_secs`; zero disables expiry.
    /// Request defaults come from the league and allocation sections.
    pub fn from_config(source: Arc<dyn DataSource>, config: &Config) -> Self {
        let ttl = match config.server.snapshot_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::new(source, config.strategy.clone(), ttl)
            .with_defaults(RecommendDefaults::from_config(config))
    }

    pub fn with_defaults(mut self, defaults: RecommendDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> RecommendDefaults {
        self.defaults
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => {
                let age = (Utc::now() - snapshot.loaded_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                age < ttl
            }
        }
    }

    /// The current player set, building it first if absent or expired.
    pub async fn get(&self) -> anyhow::Result<Arc<Vec<PlayerRecord>>> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snap) = guard.as_ref().filter(|s| self.is_fresh(s)) {
                return Ok(Arc::clone(&snap.players));
            }
        }

        let mut guard = self.snapshot.write().await;
        // Another request may have rebuilt it while we waited.
        if let Some(snap) = guard.as_ref().filter(|s| self.is_fresh(s)) {
            return Ok(Arc::clone(&snap.players));
        }
        let snap = self.build().await?;
        let players = Arc::clone(&snap.players);
        *guard = Some(snap);
        Ok(players)
    }

    /// Rebuild now, regardless of age.
    pub async fn reload(&self) -> anyhow::Result<Arc<Vec<PlayerRecord>>> {
        let mut guard = self.snapshot.write().await;
        let snap = self.build().await?;
        let players = Arc::clone(&snap.players);
        *guard = Some(snap);
        Ok(players)
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.as_ref().map(|s| s.loaded_at)
    }

    async fn build(&self) -> anyhow::Result<Snapshot> {
        let players = load_players(self.source.as_ref(), &self.strategy).await?;
        let snapshot = Snapshot {
            players: Arc::new(players),
            loaded_at: Utc::now(),
        };
        info!(
            players = snapshot.players.len(),
            loaded_at = %snapshot.loaded_at.to_rfc3339(),
            "player pool refreshed"
        );
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
