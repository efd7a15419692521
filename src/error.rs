use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing API key")]
    MissingApiKey,
    /// TMDB was unreachable, timed out, answered non-2xx or sent a body we
    /// could not read. The cause is only logged.
    #[error("TMDb error")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::MissingApiKey => tracing::warn!("Rejecting request: TMDB_API_KEY is not set"),
            ApiError::Upstream(cause) => tracing::error!("Upstream request failed: {}", cause),
        }
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
