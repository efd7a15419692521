//! Runtime enrichment: list endpoints omit `runtime`, so each movie on the
//! page gets its own `/movie/{id}` lookup, a bounded number at a time.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::models::MovieSummary;
use crate::tmdb::{self, TmdbApi};

pub struct RuntimeEnricher {
    tmdb: Arc<dyn TmdbApi>,
    max_in_flight: usize,
}

impl RuntimeEnricher {
    pub fn new(tmdb: Arc<dyn TmdbApi>, max_in_flight: usize) -> Self {
        Self {
            tmdb,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Resolves a runtime (or `None`) for every distinct id. Lookups complete
    /// in any order and a failed one only affects its own entry.
    pub async fn enrich(&self, ids: &[i64]) -> HashMap<i64, Option<u32>> {
        let mut seen = HashSet::new();
        let distinct: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if distinct.is_empty() {
            return HashMap::new();
        }
        debug!(
            "Fetching runtimes for {} movies ({} in flight)",
            distinct.len(),
            self.max_in_flight
        );

        stream::iter(distinct)
            .map(|id| {
                let api = Arc::clone(&self.tmdb);
                async move { (id, fetch_runtime(api.as_ref(), id).await) }
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await
    }

    /// Enriches `movies` in place. Every entry ends up with its runtime slot
    /// set, to `None` when nothing could be resolved.
    pub async fn attach(&self, movies: &mut [MovieSummary]) {
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        let runtimes = self.enrich(&ids).await;
        for movie in movies.iter_mut() {
            movie.runtime = runtimes.get(&movie.id).copied().flatten();
        }
    }
}

async fn fetch_runtime(api: &dyn TmdbApi, id: i64) -> Option<u32> {
    let details = api
        .get(&format!("/movie/{id}"), &[tmdb::english()])
        .await?;
    runtime_from_details(&details)
}

fn runtime_from_details(details: &serde_json::Value) -> Option<u32> {
    details
        .get("runtime")
        .and_then(|r| r.as_u64())
        .and_then(|r| u32::try_from(r).ok())
}
