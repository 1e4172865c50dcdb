// Where raw FPL payloads come from: the live API, the API behind a disk
// cache, or a directory of saved JSON files.

pub mod cache;
pub mod client;
pub mod dir;
pub mod raw;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::SourceConfig;

pub use cache::{CachedSource, DiskCache};
pub use client::FplClient;
pub use dir::DirectorySource;
pub use raw::{RawBootstrap, RawElement, RawElementType, RawFixture, RawTeam};

/// A provider of the two FPL payloads the recommender needs.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The `bootstrap-static` payload (players, clubs, position labels).
    async fn bootstrap(&self) -> anyhow::Result<RawBootstrap>;

    /// All fixtures of the season, finished or not.
    async fn fixtures(&self) -> anyhow::Result<Vec<RawFixture>>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Pick a source: a local directory when one is given, otherwise the live
/// API behind the disk cache.
pub fn from_config(
    config: &SourceConfig,
    data_dir: Option<&Path>,
) -> anyhow::Result<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match data_dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)),
        None => Arc::new(CachedSource::from_config(config)?),
    };
    info!("data source: {}", source.describe());
    Ok(source)
}
