use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{MovieSummary, PagedResult, PersonCredits, PersonSearch};
use crate::tmdb::{self, get_as, Params, TmdbApi};

pub const CAST_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    None,
    Title,
    Cast,
}

impl SearchMode {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("title") => SearchMode::Title,
            Some("cast") => SearchMode::Cast,
            _ => SearchMode::None,
        }
    }
}

/// Raw `/api/movies` query string. Everything stays a string so that a bad
/// value drops that one filter instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct MovieParams {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub min_score: Option<String>,
    pub runtime_min: Option<String>,
    pub runtime_max: Option<String>,
    pub page: Option<String>,
    pub search_type: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub genre: Option<u32>,
    pub year: Option<u16>,
    pub min_score: Option<f32>,
    pub runtime_min: Option<u32>,
    pub runtime_max: Option<u32>,
    pub page: u32,
    pub mode: SearchMode,
    pub query: String,
}

impl SearchFilter {
    pub fn from_params(params: &MovieParams) -> Self {
        Self {
            genre: parse_opt(&params.genre),
            year: parse_opt(&params.year),
            min_score: parse_opt::<f32>(&params.min_score).filter(|s| s.is_finite()),
            runtime_min: parse_opt(&params.runtime_min),
            runtime_max: parse_opt(&params.runtime_max),
            page: parse_opt::<u32>(&params.page).filter(|p| *p >= 1).unwrap_or(1),
            mode: SearchMode::parse(params.search_type.as_deref()),
            query: params.query.as_deref().unwrap_or_default().trim().to_string(),
        }
    }

    pub fn has_runtime_bounds(&self) -> bool {
        self.runtime_min.is_some() || self.runtime_max.is_some()
    }
}

fn parse_opt<T: std::str::FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Which upstream query shape a filter resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Title,
    Cast,
    Discover,
}

impl Route {
    pub fn for_filter(filter: &SearchFilter) -> Self {
        if filter.query.is_empty() {
            return Route::Discover;
        }
        match filter.mode {
            SearchMode::Title => Route::Title,
            SearchMode::Cast => Route::Cast,
            SearchMode::None => Route::Discover,
        }
    }
}

pub struct QueryRouter<'a> {
    tmdb: &'a dyn TmdbApi,
}

impl<'a> QueryRouter<'a> {
    pub fn new(tmdb: &'a dyn TmdbApi) -> Self {
        Self { tmdb }
    }

    /// Fetches one page of candidates for `filter`, not yet enriched.
    pub async fn fetch_page(&self, filter: &SearchFilter) -> ApiResult<PagedResult> {
        let route = Route::for_filter(filter);
        debug!(?route, page = filter.page, "Routing movie query");
        match route {
            Route::Title => self.search_title(filter).await,
            Route::Cast => self.search_cast(filter).await,
            Route::Discover => self.discover(filter).await,
        }
    }

    async fn search_title(&self, filter: &SearchFilter) -> ApiResult<PagedResult> {
        let params: Params = vec![
            tmdb::english(),
            ("query", filter.query.clone()),
            ("page", filter.page.to_string()),
            ("include_adult", "false".to_string()),
        ];
        get_as(self.tmdb, "/search/movie", &params)
            .await
            .ok_or_else(|| ApiError::Upstream("title search failed".to_string()))
    }

    async fn search_cast(&self, filter: &SearchFilter) -> ApiResult<PagedResult> {
        let params: Params = vec![("query", filter.query.clone()), ("page", "1".to_string())];
        let found: PersonSearch = get_as(self.tmdb, "/search/person", &params)
            .await
            .ok_or_else(|| ApiError::Upstream("person search failed".to_string()))?;
        let Some(person) = found.results.into_iter().next() else {
            info!("No person found for cast search '{}'", filter.query);
            return Ok(PagedResult::empty());
        };
        debug!(person_id = person.id, name = %person.name, "Resolved cast search");

        let credits: PersonCredits = get_as(
            self.tmdb,
            &format!("/person/{}/movie_credits", person.id),
            &[tmdb::english()],
        )
        .await
        .ok_or_else(|| ApiError::Upstream(format!("credits for person {} failed", person.id)))?;

        Ok(paginate(credits.cast, filter.page))
    }

    async fn discover(&self, filter: &SearchFilter) -> ApiResult<PagedResult> {
        let mut params: Params = vec![
            tmdb::english(),
            ("sort_by", "popularity.desc".to_string()),
            ("page", filter.page.to_string()),
            ("include_adult", "false".to_string()),
            ("include_video", "false".to_string()),
        ];
        if let Some(genre) = filter.genre {
            params.push(("with_genres", genre.to_string()));
        }
        if let Some(year) = filter.year {
            params.push(("primary_release_year", year.to_string()));
        }
        if let Some(score) = filter.min_score {
            params.push(("vote_average.gte", score.to_string()));
        }
        get_as(self.tmdb, "/discover/movie", &params)
            .await
            .ok_or_else(|| ApiError::Upstream("discover failed".to_string()))
    }
}

/// Slices a full credit list into fixed-size pages. `page` is echoed back even
/// past the last page, with no results.
pub fn paginate(all: Vec<MovieSummary>, page: u32) -> PagedResult {
    let total = all.len();
    let total_pages = total.div_ceil(CAST_PAGE_SIZE).max(1);
    let start = (page.max(1) as usize - 1).saturating_mul(CAST_PAGE_SIZE);
    let results = all.into_iter().skip(start).take(CAST_PAGE_SIZE).collect();
    PagedResult {
        page,
        results,
        total_results: total as u64,
        total_pages: total_pages as u32,
    }
}
