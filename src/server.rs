//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Static `index.html` from `[server].static_dir` |
//! | `GET`  | `/healthz` | `{"status":"ok"}` |
//! | `GET`  | `/countries` | Filtered, sorted, paginated country search |
//!
//! # Headers
//!
//! Every response, errors and the static asset included, disables caching
//! and carries `Access-Control-Allow-Origin: *`.
//!
//! # Errors
//!
//! Request parameters are never rejected; see [`crate::query`]. Store
//! failures become a bare `500 Internal Server Error`.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::models::CountryPage;
use crate::query::{search_countries, CountryQuery};

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Store handle; each request checks out its own connection.
    pub pool: SqlitePool,
}

/// Builds the router with all routes and response-header layers.
pub fn router(config: &Config, state: AppState) -> Router {
    let index = ServeFile::new(config.server.static_dir.join("index.html"));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", index)
        .route("/healthz", get(handle_health))
        .route("/countries", get(handle_countries))
        .layer(cors)
        // CorsLayer answers preflights; this sets the origin header even on
        // requests without `Origin`, replacing the one CorsLayer may add.
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(state)
}

/// Serves until the process is terminated.
///
/// The caller is expected to have run [`crate::loader::ensure_data`] first.
pub async fn run_server(config: &Config, pool: SqlitePool) -> anyhow::Result<()> {
    let app = router(config, AppState { pool });

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Any failure below the handler; rendered as a plain 500.
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %format!("{:#}", self.0), "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

// ============ GET /healthz ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============ GET /countries ============

/// Handler for `GET /countries`.
///
/// Parameters arrive as raw pairs so malformed values degrade to defaults
/// instead of failing extraction.
async fn handle_countries(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CountryPage>, AppError> {
    let query = CountryQuery::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    tracing::debug!(?query, "GET /countries");

    let page = search_countries(&state.pool, &query).await?;
    Ok(Json(page))
}
