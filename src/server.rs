//! JSON HTTP API over the loaded tables.
//!
//! Every request opens its own read-only DuckDB connection on the blocking
//! pool and closes it before the response is written. There is no pooling
//! and no state shared between requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/tables` | Table names |
//! | `GET`  | `/api/table/{name}/schema` | `[{column, type}]` for one table |
//! | `GET`  | `/api/table/{name}/data?page=&per_page=` | One page of rows |
//! | `POST` | `/api/query` | Run a read-only `SELECT` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! When `[server].static_dir` is set, any other path is served from that
//! directory (the browser UI lives at `/`).
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Table not found", "code": "not_found" }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `query_error` (500),
//! `internal` (500). For `query_error` the message is DuckDB's, verbatim.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::catalog::{self, ColumnInfo, PageRequest, TablePage};
use crate::config::Config;
use crate::db;
use crate::error::ExplorerError;
use crate::query::{self, QueryResult};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        addr = %bind_addr,
        db = %config.db.path.display(),
        "scorecard API listening"
    );
    println!("Scorecard API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the application router.
pub fn router(config: &Config) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/tables", get(handle_list_tables))
        .route("/api/table/{name}/schema", get(handle_schema))
        .route("/api/table/{name}/data", get(handle_data))
        .route("/api/query", post(handle_query))
        .route("/health", get(handle_health))
        .with_state(state);

    let app = match &config.server.static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn query_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "query_error",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<ExplorerError> for AppError {
    fn from(err: ExplorerError) -> Self {
        match err {
            ExplorerError::TableNotFound(_) => not_found(err.to_string()),
            ExplorerError::EmptyQuery | ExplorerError::NotSelect => bad_request(err.to_string()),
            ExplorerError::Engine(e) => {
                warn!(error = %e, "query failed");
                query_error(e.to_string())
            }
        }
    }
}

/// Opens a read-only connection on the blocking pool, runs `f`, and closes
/// the connection.
async fn with_connection<T, F>(config: Arc<Config>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = db::open_read_only(&config).map_err(|e| {
            warn!(error = %e, "failed to open database");
            internal(e.to_string())
        })?;
        f(&conn).map_err(AppError::from)
    })
    .await
    .map_err(|e| internal(format!("database task failed: {}", e)))?
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/tables ============

async fn handle_list_tables(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let tables = with_connection(state.config, catalog::list_tables).await?;
    Ok(Json(tables))
}

// ============ GET /api/table/{name}/schema ============

async fn handle_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ColumnInfo>>, AppError> {
    let columns =
        with_connection(state.config, move |conn| catalog::describe_table(conn, &name)).await?;
    Ok(Json(columns))
}

// ============ GET /api/table/{name}/data ============

/// Handler for `GET /api/table/{name}/data`.
///
/// `page` defaults to 1 and `per_page` to `[server].default_page_size`.
/// Unparsable values fall back to the defaults; `per_page` is clamped to
/// `[server].max_page_size` without complaint.
async fn handle_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TablePage>, AppError> {
    let server = &state.config.server;
    let request = PageRequest::from_params(
        params.get("page").map(String::as_str),
        params.get("per_page").map(String::as_str),
        server.default_page_size,
        server.max_page_size,
    );

    let page = with_connection(state.config.clone(), move |conn| {
        catalog::fetch_page(conn, &name, request)
    })
    .await?;
    Ok(Json(page))
}

// ============ POST /api/query ============

/// Request body for `POST /api/query`.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

/// Handler for `POST /api/query`.
///
/// Returns 400 for a missing body, an empty query, or anything that does not
/// start with `SELECT`; 500 with the engine message if execution fails.
async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    let sql = query::check_select(&request.query)?.to_string();

    info!(query = %sql, "executing query");
    let max_rows = state.config.server.max_query_rows;
    let result = with_connection(state.config, move |conn| {
        query::run_query(conn, &sql, max_rows)
    })
    .await?;
    Ok(Json(result))
}
