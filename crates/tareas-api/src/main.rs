//! tareas-api - HTTP API server for the tareas task service.

mod handlers;
mod query_types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tareas_db::{Database, FilesystemImageStore, TaskService};

use handlers::tasks::{create_task, delete_task, get_task, list_tasks, update_task};

/// Maximum accepted request body size (multipart uploads included).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10 MB

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically, which
/// keeps log correlation simple.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// Attachment-synchronized task mutation service.
    service: Arc<TaskService>,
    /// Connection pool, used directly by the health check.
    pool: sqlx::PgPool,
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Internal(tareas_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<tareas_core::Error> for ApiError {
    fn from(err: tareas_core::Error) -> Self {
        match &err {
            tareas_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            tareas_core::Error::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            tareas_core::Error::Validation(msg) => ApiError::BadRequest(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Parse allowed origins from a comma-separated environment variable.
///
/// `ALLOWED_ORIGINS` holds a comma-separated allow-list; when unset or
/// empty, only local front-end dev servers are allowed.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".to_string());

    let origins: Vec<HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        vec![
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://localhost:3000"),
        ]
    } else {
        origins
    }
}

// =============================================================================
// SYSTEM ENDPOINTS
// =============================================================================

/// API index: name, version, endpoint map.
async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Tareas task management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "getTasks": "GET /tasks",
            "getTask": "GET /tasks/:id",
            "createTask": "POST /tasks",
            "updateTask": "PUT /tasks/:id",
            "deleteTask": "DELETE /tasks/:id",
        },
    }))
}

/// Health check: probes the database connection.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database": "connected",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "error",
                "database": "disconnected",
                "error": err.to_string(),
            })),
        ),
    }
}

// =============================================================================
// ROUTER
// =============================================================================

fn build_router(state: AppState, image_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(parse_allowed_origins())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .nest_service("/images", ServeDir::new(image_dir))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT - "json" or "text" (default: "text")
    //   RUST_LOG   - standard env filter (default: "tareas_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tareas_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid PORT: {}", e))?;
    let image_dir = std::env::var("IMAGE_DIR").unwrap_or_else(|_| "public/images".to_string());

    let db = Database::connect_with_config(&database_url, tareas_db::PoolConfig::from_env()).await?;
    db.migrate().await?;

    let images = FilesystemImageStore::new(&image_dir);
    images
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("Image store validation failed: {}", e))?;
    info!(image_dir = %image_dir, "image store ready");

    let state = AppState {
        pool: db.pool.clone(),
        service: Arc::new(TaskService::new(Arc::new(db.tasks), Arc::new(images))),
    };

    let app = build_router(state, &image_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "tareas-api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
