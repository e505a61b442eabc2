use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use flowstate_core::{
    EngineError, JsonFileStore, WorkflowDefinition, WorkflowService,
};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WorkflowService>,
}

// API types
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInstanceRequest {
    pub workflow_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerActionRequest {
    pub action_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCreated {
    pub instance_id: String,
}

type ApiResult = (StatusCode, Json<ApiResponse<serde_json::Value>>);

fn reply_ok<T: Serialize>(data: T) -> ApiResult {
    match serde_json::to_value(data) {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(value),
                error: None,
            }),
        ),
        Err(e) => {
            warn!("Failed to serialize response: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some("Internal serialization error".to_string()),
                }),
            )
        }
    }
}

fn reply_err(err: EngineError) -> ApiResult {
    let status = match &err {
        EngineError::WorkflowNotFound { .. } | EngineError::InstanceNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        EngineError::StoreFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flowstate_server=info,flowstate_core=info,tower_http=debug".into()
            }),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // File-backed persistence
    let data_dir =
        std::env::var("FLOWSTATE_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    info!("Using data directory: {}", data_dir);

    let store = Arc::new(JsonFileStore::new(data_dir));
    let service = Arc::new(WorkflowService::load(store).await?);

    // Create application state
    let app_state = AppState { service };

    // Build our application with routes
    let app = create_router(app_state);

    // Determine port
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/workflows", post(create_workflow).get(list_workflows))
        .route("/api/workflows/:id", get(get_workflow))
        .route("/api/workflows/:id/instances", get(list_workflow_instances))
        .route("/api/instances", post(start_instance).get(list_instances))
        .route("/api/instances/:id", get(get_instance))
        .route("/api/instances/:id/actions", post(trigger_action))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        success: true,
        data: Some("OK".to_string()),
        error: None,
    })
}

// Create a new workflow definition with validation
async fn create_workflow(
    State(state): State<AppState>,
    Json(definition): Json<WorkflowDefinition>,
) -> ApiResult {
    let id = definition.id.clone();
    match state.service.create_workflow(definition).await {
        Ok(()) => reply_ok(format!("Workflow '{}' created successfully.", id)),
        Err(err) => reply_err(err),
    }
}

// Retrieve all workflow definitions
async fn list_workflows(State(state): State<AppState>) -> ApiResult {
    reply_ok(state.service.list_workflows().await)
}

// Retrieve a specific workflow definition by ID
async fn get_workflow(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult {
    match state.service.get_workflow(&id).await {
        Ok(definition) => reply_ok(definition),
        Err(err) => reply_err(err),
    }
}

// Get all instances for a specific workflow
async fn list_workflow_instances(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult {
    reply_ok(state.service.list_instances_by_workflow(&id).await)
}

// Create and start a new workflow instance
async fn start_instance(
    State(state): State<AppState>,
    Json(request): Json<StartInstanceRequest>,
) -> ApiResult {
    match state.service.start_instance(&request.workflow_id).await {
        Ok(instance_id) => reply_ok(InstanceCreated { instance_id }),
        Err(err) => reply_err(err),
    }
}

// Execute an action to transition instance state
async fn trigger_action(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<TriggerActionRequest>,
) -> ApiResult {
    match state.service.trigger_action(&id, &request.action_id).await {
        Ok(outcome) => reply_ok(outcome),
        Err(err) => reply_err(err),
    }
}

// Retrieve a specific workflow instance
async fn get_instance(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult {
    match state.service.get_instance(&id).await {
        Ok(instance) => reply_ok(instance),
        Err(err) => reply_err(err),
    }
}

// Retrieve all workflow instances
async fn list_instances(State(state): State<AppState>) -> ApiResult {
    reply_ok(state.service.list_instances().await)
}
