// Offline source: FPL payloads saved as JSON files in a directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::warn;

use crate::source::raw::{RawBootstrap, RawFixture};
use crate::source::DataSource;

pub const BOOTSTRAP_FILE: &str = "bootstrap.json";
pub const FIXTURES_FILE: &str = "fixtures.json";

/// Reads `bootstrap.json` and `fixtures.json` from a directory. The fixtures
/// file is optional; without it the outlook is disabled.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn bootstrap(&self) -> anyhow::Result<RawBootstrap> {
        let path = self.dir.join(BOOTSTRAP_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    async fn fixtures(&self) -> anyhow::Result<Vec<RawFixture>> {
        let path = self.dir.join(FIXTURES_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found; fixture outlook disabled", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
