use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

pub type Param = (&'static str, String);

/// Query parameters for one upstream call, in the order they are sent.
pub type Params = Vec<Param>;

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// GET `path` (relative to the API base) with `params` plus the API key.
    /// Any failure yields `None`.
    async fn get(&self, path: &str, params: &[Param]) -> Option<Value>;
}

/// Like [`TmdbApi::get`] but decodes the body; a shape mismatch is `None` too.
pub async fn get_as<T: DeserializeOwned>(
    api: &dyn TmdbApi,
    path: &str,
    params: &[Param],
) -> Option<T> {
    let value = api.get(path, params).await?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Unexpected TMDB response shape for {}: {}", path, e);
            None
        }
    }
}

pub fn english() -> Param {
    ("language", "en-US".to_string())
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let user_agent = format!("moviedash/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match &config.api_key {
            Some(key) => Self::new(&config.tmdb_base, key.clone(), config.request_timeout).map(Some),
            None => Ok(None),
        }
    }

    async fn get_json(&self, path: &str, params: &[Param]) -> Result<Value> {
        let url = format!("{}{}", self.base, path);
        let res = self
            .client
            .get(&url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", path, status, text));
        }
        let parsed: Value = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn get(&self, path: &str, params: &[Param]) -> Option<Value> {
        debug!("TMDB GET {}", path);
        match self.get_json(path, params).await {
            Ok(v) => Some(v),
            Err(e) => {
                // reqwest errors can carry the full URL, api_key included.
                let mut msg = format!("{:#}", e);
                if !self.api_key.is_empty() {
                    msg = msg.replace(&self.api_key, "***");
                }
                warn!("TMDB call {} failed: {}", path, msg);
                None
            }
        }
    }
}
