// HTTP client for the public FPL API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::SourceConfig;
use crate::source::raw::{RawBootstrap, RawFixture};
use crate::source::DataSource;

pub const BOOTSTRAP_PATH: &str = "bootstrap-static/";
pub const FIXTURES_PATH: &str = "fixtures/";

const USER_AGENT: &str = concat!("fpl-recommender/", env!("CARGO_PKG_VERSION"));

pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
}

impl FplClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full URL for an API path, tolerating a trailing slash on the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET an API path and return the body as JSON. Non-success statuses are
    /// errors carrying the status and body.
    pub async fn fetch_json(&self, path: &str) -> anyhow::Result<Value> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("http {status} from {url}: {body}");
        }

        resp.json::<Value>()
            .await
            .with_context(|| format!("invalid JSON from {url}"))
    }
}

/// Decode a payload already fetched as JSON.
pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> anyhow::Result<T> {
    serde_json::from_value(value).with_context(|| format!("unexpected {what} payload shape"))
}

#[async_trait]
impl DataSource for FplClient {
    async fn bootstrap(&self) -> anyhow::Result<RawBootstrap> {
        decode(self.fetch_json(BOOTSTRAP_PATH).await?, "bootstrap-static")
    }

    async fn fixtures(&self) -> anyhow::Result<Vec<RawFixture>> {
        decode(self.fetch_json(FIXTURES_PATH).await?, "fixtures")
    }

    fn describe(&self) -> String {
        format!("FPL API at {}", self.base_url)
    }
}
