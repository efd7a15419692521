use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ENRICH_CONCURRENCY: usize = 8;

/// Process configuration, built once at startup and handed to the components
/// that need it.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` keeps the server up but every endpoint answers with a
    /// configuration error.
    pub api_key: Option<String>,
    pub tmdb_base: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub enrich_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("TMDB_API_KEY");
        let tmdb_base = get("TMDB_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string());
        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:5000")?;
        let timeout_secs = match get("TMDB_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("TMDB_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let enrich_concurrency = match get("ENRICH_CONCURRENCY") {
            Some(v) => v
                .parse::<usize>()
                .context("ENRICH_CONCURRENCY must be a positive integer")?
                .max(1),
            None => DEFAULT_ENRICH_CONCURRENCY,
        };

        Ok(Self {
            api_key,
            tmdb_base,
            bind_addr,
            request_timeout: Duration::from_secs(timeout_secs),
            enrich_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.tmdb_base, DEFAULT_TMDB_BASE);
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.enrich_concurrency, 8);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = config_from(&[("TMDB_API_KEY", "   ")]).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("TMDB_API_KEY", "abc"),
            ("TMDB_BASE_URL", "http://127.0.0.1:9000/3/"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("TMDB_TIMEOUT_SECS", "3"),
            ("ENRICH_CONCURRENCY", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.tmdb_base, "http://127.0.0.1:9000/3");
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.enrich_concurrency, 1);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config_from(&[("TMDB_TIMEOUT_SECS", "ten")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
