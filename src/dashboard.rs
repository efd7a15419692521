use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::enrich::RuntimeEnricher;
use crate::error::{ApiError, ApiResult};
use crate::models::{GenreList, MovieSummary, PagedResult};
use crate::query::{QueryRouter, SearchFilter};
use crate::tmdb::{self, get_as, TmdbApi};

/// Everything the dashboard's JSON endpoints need from TMDB.
#[derive(Clone)]
pub struct DashboardService {
    tmdb: Arc<dyn TmdbApi>,
    enrich_concurrency: usize,
}

impl DashboardService {
    pub fn new(tmdb: Arc<dyn TmdbApi>, enrich_concurrency: usize) -> Self {
        Self {
            tmdb,
            enrich_concurrency,
        }
    }

    pub async fn genres(&self) -> ApiResult<GenreList> {
        get_as(self.tmdb.as_ref(), "/genre/movie/list", &[tmdb::english()])
            .await
            .ok_or_else(|| ApiError::Upstream("genre list failed".to_string()))
    }

    /// Route, enrich with runtimes, then apply the runtime bounds. Totals are
    /// the ones reported before filtering; a filtered page is not backfilled.
    pub async fn movies(&self, filter: &SearchFilter) -> ApiResult<PagedResult> {
        let mut page = QueryRouter::new(self.tmdb.as_ref())
            .fetch_page(filter)
            .await?;

        if !page.results.is_empty() {
            RuntimeEnricher::new(Arc::clone(&self.tmdb), self.enrich_concurrency)
                .attach(&mut page.results)
                .await;
        }

        if filter.has_runtime_bounds() {
            let before = page.results.len();
            retain_within_runtime(&mut page.results, filter.runtime_min, filter.runtime_max);
            debug!(
                "Runtime filter kept {} of {} movies",
                page.results.len(),
                before
            );
        }

        info!(
            "Returning {} movies (page {} of {})",
            page.results.len(),
            page.page,
            page.total_pages
        );
        Ok(page)
    }

    pub async fn movie_credits(&self, movie_id: i64) -> ApiResult<Value> {
        self.tmdb
            .get(&format!("/movie/{movie_id}/credits"), &[tmdb::english()])
            .await
            .ok_or_else(|| ApiError::Upstream(format!("credits for movie {movie_id} failed")))
    }
}

/// Drops movies with no runtime or one outside `[min, max]` (inclusive).
/// With no bounds nothing is removed.
pub fn retain_within_runtime(movies: &mut Vec<MovieSummary>, min: Option<u32>, max: Option<u32>) {
    if min.is_none() && max.is_none() {
        return;
    }
    movies.retain(|m| match m.runtime {
        Some(r) => min.map_or(true, |lo| r >= lo) && max.map_or(true, |hi| r <= hi),
        None => false,
    });
}
