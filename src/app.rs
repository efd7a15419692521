use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::error::{ApiError, ApiResult};
use crate::models::{GenreList, PagedResult};
use crate::query::{MovieParams, SearchFilter};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const DASHBOARD_HTML: &str = include_str!("../static/dashboard.html");

const CONFIG_ERROR_HTML: &str = "<h1>Configuration Error</h1>\
<p><strong>TMDB_API_KEY</strong> is not set.</p>\
<p>Create a <code>.env</code> file in the project root with:</p>\
<pre>TMDB_API_KEY=your_actual_tmdb_api_key</pre>";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key was configured.
    pub dashboard: Option<DashboardService>,
}

impl AppState {
    pub fn new(tmdb: Option<Arc<dyn TmdbApi>>, enrich_concurrency: usize) -> Self {
        Self {
            dashboard: tmdb.map(|t| DashboardService::new(t, enrich_concurrency)),
        }
    }

    fn dashboard(&self) -> ApiResult<&DashboardService> {
        self.dashboard.as_ref().ok_or(ApiError::MissingApiKey)
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Option<Arc<dyn TmdbApi>> = match TmdbClient::from_config(&config)? {
        Some(client) => Some(Arc::new(client)),
        None => {
            warn!("TMDB_API_KEY is not set; every endpoint will report a configuration error");
            None
        }
    };
    info!(
        "TMDB base {} (timeout {:?}, {} runtime lookups in flight)",
        config.tmdb_base, config.request_timeout, config.enrich_concurrency
    );

    let state = AppState::new(tmdb, config.enrich_concurrency);
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/genres", get(genres))
        .route("/api/movies", get(movies))
        .route("/api/movie/:id/credits", get(movie_credits))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn index(State(state): State<AppState>) -> Response {
    if state.dashboard.is_none() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Html(CONFIG_ERROR_HTML)).into_response();
    }
    Html(DASHBOARD_HTML).into_response()
}

async fn genres(State(state): State<AppState>) -> ApiResult<Json<GenreList>> {
    let list = state.dashboard()?.genres().await?;
    debug!("Fetched {} genres", list.genres.len());
    Ok(Json(list))
}

async fn movies(
    State(state): State<AppState>,
    Query(params): Query<MovieParams>,
) -> ApiResult<Json<PagedResult>> {
    let dashboard = state.dashboard()?;
    let filter = SearchFilter::from_params(&params);
    debug!(?filter, "Movie query");
    Ok(Json(dashboard.movies(&filter).await?))
}

async fn movie_credits(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let credits = state.dashboard()?.movie_credits(movie_id).await?;
    Ok(Json(credits))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
