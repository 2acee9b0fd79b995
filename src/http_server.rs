// HTTP API Server Implementation
// Upload a performance CSV, then request dashboard payloads for KPI selections

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, sync::Mutex};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::DashboardConfig,
    contracts::{SessionInfo, SessionStore},
    dashboard::{DashboardPayload, DashboardService, DatasetOverview, KpiSection, Selection},
    dataset::Dataset,
    http_types::{ErrorResponse, ValidationErrorResponse},
    observability::{
        get_metrics, log_operation, record_metric, with_trace_id, MetricType, Operation,
        OperationContext,
    },
    validation::{SchemaError, REQUIRED_COLUMNS},
};

// Global server start time for uptime tracking
static SERVER_START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<dyn SessionStore>>,
    service: Arc<DashboardService>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Response for a stored upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session: SessionInfo,
    pub overview: DatasetOverview,
}

/// Query parameters carrying the KPI filter
#[derive(Debug, Deserialize)]
pub struct SelectionParams {
    /// Comma-separated KPI names
    pub kpis: Option<String>,
}

/// Errors surfaced by the handlers
#[derive(Debug)]
pub enum ApiError {
    Schema(SchemaError),
    NoDataset,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SchemaError>() {
            Ok(schema) => ApiError::Schema(schema),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Schema(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse::from(&err)),
            )
                .into_response(),
            ApiError::NoDataset => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    "no_dataset",
                    "No dataset uploaded. POST a CSV file to /dataset first.",
                )),
            )
                .into_response(),
            ApiError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_server_error(err.to_string())),
            )
                .into_response(),
        }
    }
}

/// Create HTTP server with all routes configured
pub fn create_server(session: Arc<Mutex<dyn SessionStore>>, config: &DashboardConfig) -> Router {
    let state = AppState {
        session,
        service: Arc::new(DashboardService::new(config.dashboard.clone())),
    };

    let router = Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route(
            "/dataset",
            post(upload_dataset).get(get_dataset).delete(clear_dataset),
        )
        .route("/dashboard", get(get_dashboard))
        .route("/kpis/:name", get(get_kpi))
        .route("/render", post(render_stateless))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes));

    if config.server.enable_cors {
        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    } else {
        router.layer(TraceLayer::new_for_http())
    }
}

/// Start the HTTP server on the configured address
pub async fn start_server(
    session: Arc<Mutex<dyn SessionStore>>,
    config: DashboardConfig,
) -> Result<()> {
    let app = create_server(session, &config);
    let listener = TcpListener::bind(config.bind_address()).await?;

    let ctx = OperationContext::new("startup");
    log_operation(
        &ctx,
        &Operation::Startup {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        &Ok(()),
    );
    info!("perfdash HTTP server listening on {}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    log_operation(
        &OperationContext::new("shutdown"),
        &Operation::Shutdown {
            reason: "interrupt".to_string(),
        },
        &Ok(()),
    );

    Ok(())
}

/// Landing page with upload instructions
async fn index_page() -> Html<String> {
    Html(format!(
        "<!doctype html>
<html>
<head><meta charset=\"utf-8\"><title>Performance Data Analyzer</title></head>
<body>
<h1>Performance Data Analyzer</h1>
<p>Upload a CSV file containing the following columns: {columns}</p>
<ul>
<li><code>POST /dataset</code> with the CSV as request body</li>
<li><code>GET /dashboard?kpis=A,B</code> for the trend, bar, and summary sections</li>
<li><code>GET /kpis/&lt;name&gt;</code> for a single KPI</li>
<li><code>POST /render?kpis=A,B</code> to analyse a CSV without storing it</li>
</ul>
</body>
</html>",
        columns = REQUIRED_COLUMNS.join(", ")
    ))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: SERVER_START_TIME.elapsed().as_secs(),
    })
}

async fn metrics() -> Json<serde_json::Value> {
    Json(get_metrics())
}

/// Validate an uploaded CSV and make it the session dataset
async fn upload_dataset(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let size_bytes = body.len();
    record_metric(MetricType::Histogram {
        name: "upload.size",
        value: size_bytes as f64,
        unit: "bytes",
    });
    let result = with_trace_id("upload_dataset", async move {
        let dataset = Dataset::from_csv_reader(&body[..])?;
        let overview = state.service.overview(&dataset)?;

        let ctx = OperationContext::new("dataset_upload");
        log_operation(
            &ctx,
            &Operation::DatasetUpload {
                size_bytes,
                row_count: dataset.len(),
            },
            &Ok(()),
        );

        let session = state.session.lock().await.replace(dataset).await?;
        Ok(UploadResponse { session, overview })
    })
    .await;

    match result {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            warn!("Rejected upload of {} bytes: {}", size_bytes, e);
            Err(ApiError::from(e))
        }
    }
}

/// Overview of the held dataset
async fn get_dataset(State(state): State<AppState>) -> Result<Json<UploadResponse>, ApiError> {
    let stored = state
        .session
        .lock()
        .await
        .current()
        .await?
        .ok_or(ApiError::NoDataset)?;

    let overview = state
        .service
        .overview(&stored.dataset)
        .map_err(ApiError::Schema)?;
    Ok(Json(UploadResponse {
        session: stored.info,
        overview,
    }))
}

async fn clear_dataset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let cleared = state.session.lock().await.clear().await?;
    if cleared {
        let ctx = OperationContext::new("clear_dataset");
        log_operation(&ctx, &Operation::SessionCleared, &Ok(()));
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NoDataset)
    }
}

/// Full dashboard for the held dataset.
///
/// A `kpis` parameter replaces the session's selection; without it the
/// stored selection is rendered.
async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<DashboardPayload>, ApiError> {
    let result = with_trace_id("get_dashboard", async move {
        let (stored, selection) = {
            let mut session = state.session.lock().await;
            let stored = session.current().await?;
            if params.kpis.is_some() {
                session
                    .set_selection(Selection::parse(params.kpis.as_deref()))
                    .await?;
            }
            (stored, session.selection().await?)
        };

        match stored {
            Some(stored) => Ok(Some(state.service.render(&stored.dataset, &selection)?)),
            None => Ok(None),
        }
    })
    .await;

    match result {
        Ok(Some(payload)) => Ok(Json(payload)),
        Ok(None) => Err(ApiError::NoDataset),
        Err(e) => {
            warn!("Dashboard render failed: {}", e);
            Err(ApiError::from(e))
        }
    }
}

/// Single KPI section for the held dataset
async fn get_kpi(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<KpiSection>, ApiError> {
    let stored = state
        .session
        .lock()
        .await
        .current()
        .await?
        .ok_or(ApiError::NoDataset)?;

    let records = state
        .service
        .load_records(&stored.dataset)
        .map_err(ApiError::Schema)?;
    Ok(Json(state.service.kpi_section(&records, &name)))
}

/// Analyse a CSV body without touching the session
async fn render_stateless(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
    body: Bytes,
) -> Result<Json<DashboardPayload>, ApiError> {
    let selection = Selection::parse(params.kpis.as_deref());
    let result = with_trace_id("render_stateless", async move {
        let dataset = Dataset::from_csv_reader(&body[..])?;
        Ok(state.service.render(&dataset, &selection)?)
    })
    .await;

    result.map(Json).map_err(|e| {
        warn!("Stateless render failed: {}", e);
        ApiError::from(e)
    })
}
