// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub source: SourceConfig,
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// Players in a full squad. Owned plus requested players may not exceed it.
    pub squad_size: usize,
    /// Most players a squad may hold from any single club.
    pub max_from_team: usize,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            name: "Fantasy Premier League".into(),
            squad_size: 15,
            max_from_team: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    score_weights: ScoreWeights,
    fixtures: FixtureSettings,
    allocation: AllocationSettings,
    source: SourceConfig,
    server: ServerConfig,
}

/// The scoring and allocation knobs assembled from strategy.toml.
#[derive(Debug, Clone, Default)]
pub struct StrategyConfig {
    pub weights: ScoreWeights,
    pub fixtures: FixtureSettings,
    pub allocation: AllocationSettings,
}

/// Linear weights of the composite player score. The risk penalty is added
/// unweighted on top.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScoreWeights {
    pub form: f64,
    pub points_per_game: f64,
    pub fixture_outlook: f64,
    pub ict_index: f64,
    pub expected_points: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            form: 0.40,
            points_per_game: 0.25,
            fixture_outlook: 0.20,
            ict_index: 0.10,
            expected_points: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FixtureSettings {
    /// How many upcoming unfinished fixtures feed the outlook.
    pub horizon: usize,
    pub home_bonus: f64,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            horizon: 3,
            home_bonus: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AllocationSettings {
    /// Default per-position candidate cutoff for recommendation requests.
    pub top_per_pos: usize,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self { top_per_pos: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Pause between the bootstrap and fixtures requests.
    pub throttle_ms: u64,
    pub cache_ttl_secs: u64,
    /// Response cache directory. Empty or absent means the platform cache dir.
    #[serde(default)]
    pub cache_dir: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fantasy.premierleague.com/api".into(),
            timeout_secs: 10,
            throttle_ms: 400,
            cache_ttl_secs: 3600,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// How long the service reuses a built player pool before rebuilding it.
    pub snapshot_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            snapshot_ttl_secs: 900,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let mut source = strategy_file.source;
    if source.cache_dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
        source.cache_dir = None;
    }

    let config = Config {
        league: league_file.league,
        strategy: StrategyConfig {
            weights: strategy_file.score_weights,
            fixtures: strategy_file.fixtures,
            allocation: strategy_file.allocation,
        },
        source,
        server: strategy_file.server,
    };

    validate(&config)?;

    Ok(config)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Copy `from` to `to` unless `to` already exists. Returns whether a copy
/// happened. `create_new` makes the existence check and the create atomic.
fn copy_if_absent(from: &Path, to: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", to.display()))),
    };
    let content = std::fs::read(from)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", from.display())))?;
    std::io::Write::write_all(&mut dest, &content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", to.display())))?;
    Ok(true)
}

/// Seed `config/` from the shipped `defaults/` files. User edits in
/// `config/` are never overwritten and `*.example` templates stay behind.
/// Returns the files that were created.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, false) => {
            return Err(copy_error(format!(
                "no defaults/ or config/ under {}",
                base_dir.display()
            )))
        }
        (false, true) => return Ok(Vec::new()),
        _ => {}
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut created = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let Some(name) = path.file_name().filter(|_| path.is_file()) else {
            continue;
        };
        if name.to_string_lossy().ends_with(".example") {
            continue;
        }
        let target = config_dir.join(name);
        if copy_if_absent(&path, &target)? {
            created.push(target);
        }
    }

    Ok(created)
}

/// Load from the working directory, seeding `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_or_builtin(&cwd)
}

/// Like `load_config_from`, but falls back to the built-in defaults when
/// neither `config/` nor `defaults/` exists under `base_dir`. Any other
/// failure (bad TOML, failed validation) is still an error.
pub fn load_config_or_builtin(base_dir: &Path) -> Result<Config, ConfigError> {
    match ensure_config_files(base_dir) {
        Ok(copied) => {
            for path in copied {
                tracing::info!("initialized {} from defaults", path.display());
            }
            load_config_from(base_dir)
        }
        Err(ConfigError::DefaultsCopyError { message }) if !base_dir.join("config").exists() => {
            tracing::warn!("{message}; using built-in configuration");
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.squad_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.squad_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.league.max_from_team == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.max_from_team".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Score weights may be zero (switches a signal off) but never negative.
    let w = &config.strategy.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("score_weights.form", w.form),
        ("score_weights.points_per_game", w.points_per_game),
        ("score_weights.fixture_outlook", w.fixture_outlook),
        ("score_weights.ict_index", w.ict_index),
        ("score_weights.expected_points", w.expected_points),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite value >= 0, got {val}"),
            });
        }
    }

    if config.strategy.fixtures.horizon == 0 {
        return Err(ConfigError::ValidationError {
            field: "fixtures.horizon".into(),
            message: "must be > 0".into(),
        });
    }

    let bonus = config.strategy.fixtures.home_bonus;
    if !bonus.is_finite() {
        return Err(ConfigError::ValidationError {
            field: "fixtures.home_bonus".into(),
            message: format!("must be finite, got {bonus}"),
        });
    }

    if config.strategy.allocation.top_per_pos == 0 {
        return Err(ConfigError::ValidationError {
            field: "allocation.top_per_pos".into(),
            message: "must be > 0".into(),
        });
    }

    if config.source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "source.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
