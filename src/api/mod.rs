pub mod rate_limit;
pub mod sanitize;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::config::Settings;
use crate::database::AttendanceDb;
use crate::document::{DocumentSnapshot, PageText, SnapshotCache};
use crate::error::AppError;
use crate::formatter::{self, Card, ChartData, Component, FormattedResponse, TableData};
use crate::prompt;
use crate::providers::{self, traits::CompletionProvider};
use rate_limit::IpRateLimiter;

const ANALYSIS_QUESTION: &str = "Provide a comprehensive analysis of this attendance report \
    including key statistics, attendance rates, and important insights.";

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub provider: Option<Arc<dyn CompletionProvider + Send + Sync>>,
    pub snapshots: Arc<SnapshotCache>,
    pub limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        settings: Settings,
        provider: Option<Arc<dyn CompletionProvider + Send + Sync>>,
    ) -> Self {
        let limiter = rate_limit::create_ip_rate_limiter(
            settings.rate_limit_per_min,
            settings.rate_limit_burst,
        );
        Self {
            settings,
            provider,
            snapshots: Arc::new(SnapshotCache::new(8)),
            limiter,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(alias = "question")]
    #[validate(length(min = 1, max = 1000))]
    message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    response: String,
    components: Vec<Component>,
    source: String,
    model: String,
}

#[derive(Deserialize)]
pub struct SampleDataRequest {
    #[serde(rename = "type", default = "default_sample_type")]
    component_type: String,
}

fn default_sample_type() -> String {
    "all".to_string()
}

#[derive(Serialize)]
pub struct SampleDataResponse {
    text: String,
    components: Vec<Component>,
}

#[derive(Serialize)]
pub struct ExtractResponse {
    success: bool,
    file_path: String,
    total_pages: usize,
    total_characters: usize,
    full_text: String,
    pages: Vec<PageText>,
}

#[derive(Serialize)]
pub struct TableInfo {
    name: String,
    row_count: i64,
}

#[derive(Serialize)]
pub struct TestDatabaseResponse {
    success: bool,
    database_path: String,
    tables: Vec<TableInfo>,
    sample_employees: Vec<Value>,
}

#[derive(Serialize)]
pub struct TestOpenAiResponse {
    success: bool,
    response: String,
    model_used: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Builds the application router. The AI-backed endpoints sit behind the
/// per-IP rate limiter; everything else is unmetered.
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let limited = Router::new()
        .route("/chat", post(chat_handler))
        .route("/analyze-database", post(analyze_database_handler))
        .route("/analyze-document", post(analyze_document_handler))
        .route("/test-openai", post(test_openai_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::ip_rate_limit,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/extract", get(extract_handler))
        .route("/test-database", get(test_database_handler))
        .route("/generate-sample-data", post(generate_sample_data_handler))
        .merge(limited)
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Server is running and healthy" }))
}

/// Question over the PDF snapshot.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Input(e.to_string()))?;
    sanitize::check_question(&request.message)?;

    let provider = providers::require_provider(&state.provider)?.clone();
    let snapshot = load_snapshot(&state).await?;

    let answer = ask(&provider, &snapshot.full_text, &request.message).await?;
    Ok(Json(ChatResponse {
        response: answer.text,
        components: answer.components,
        source: "ai_analysis".to_string(),
        model: provider.model().to_string(),
    }))
}

/// Question over a plain-text snapshot of the attendance database. The
/// database is opened read-only per request; the question never reaches SQL.
async fn analyze_database_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Input(e.to_string()))?;
    sanitize::check_question(&request.message)?;

    let provider = providers::require_provider(&state.provider)?.clone();
    let db = AttendanceDb::open_read_only(&state.settings.database_path).await?;
    let snapshot = db.snapshot().await?;

    let answer = ask(&provider, &snapshot, &request.message).await?;
    Ok(Json(ChatResponse {
        response: answer.text,
        components: answer.components,
        source: "database_analysis".to_string(),
        model: provider.model().to_string(),
    }))
}

/// Canned comprehensive analysis of the configured PDF.
async fn analyze_document_handler(
    State(state): State<AppState>,
) -> Result<Json<ChatResponse>, AppError> {
    let provider = providers::require_provider(&state.provider)?.clone();
    let snapshot = load_snapshot(&state).await?;

    let answer = ask(&provider, &snapshot.full_text, ANALYSIS_QUESTION).await?;
    Ok(Json(ChatResponse {
        response: answer.text,
        components: answer.components,
        source: "ai_analysis".to_string(),
        model: provider.model().to_string(),
    }))
}

/// Re-extracts the configured PDF and returns the snapshot details.
async fn extract_handler(State(state): State<AppState>) -> Result<Json<ExtractResponse>, AppError> {
    let snapshots = state.snapshots.clone();
    let path = PathBuf::from(&state.settings.pdf_path);
    let snapshot = tokio::task::spawn_blocking(move || snapshots.refresh(&path))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(ExtractResponse {
        success: true,
        file_path: snapshot.file_path.clone(),
        total_pages: snapshot.total_pages,
        total_characters: snapshot.total_characters,
        full_text: snapshot.full_text.clone(),
        pages: snapshot.pages.clone(),
    }))
}

/// Database connectivity check: table row counts plus a few employee rows.
async fn test_database_handler(
    State(state): State<AppState>,
) -> Result<Json<TestDatabaseResponse>, AppError> {
    let db = AttendanceDb::open_read_only(&state.settings.database_path).await?;
    db.check_schema().await?;

    let tables = db
        .table_counts()
        .await?
        .into_iter()
        .map(|(name, row_count)| TableInfo { name, row_count })
        .collect();
    let sample_employees = db.employees_sample(5).await?;

    Ok(Json(TestDatabaseResponse {
        success: true,
        database_path: state.settings.database_path.clone(),
        tables,
        sample_employees,
    }))
}

/// Upstream connectivity check, no document context.
async fn test_openai_handler(
    State(state): State<AppState>,
) -> Result<Json<TestOpenAiResponse>, AppError> {
    let provider = providers::require_provider(&state.provider)?.clone();
    let response = provider
        .complete(
            "You are a helpful assistant.",
            "Say hello and confirm you're working!",
        )
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(TestOpenAiResponse {
        success: true,
        response,
        model_used: provider.model().to_string(),
    }))
}

/// Fixed demo components for exercising the frontend without the AI.
async fn generate_sample_data_handler(
    Json(request): Json<SampleDataRequest>,
) -> Result<(StatusCode, Json<SampleDataResponse>), AppError> {
    let kind = request.component_type.as_str();
    if !matches!(kind, "all" | "table" | "chart" | "cards") {
        return Err(AppError::Input(format!(
            "Unknown component type: {}",
            kind
        )));
    }

    let mut components = Vec::new();

    if matches!(kind, "all" | "table") {
        components.push(Component::Table(TableData {
            title: Some("Sample Data Table".to_string()),
            headers: vec![
                "Name".to_string(),
                "Value".to_string(),
                "Status".to_string(),
            ],
            rows: vec![
                vec!["Total Users".into(), "1,234".into(), "Active".into()],
                vec!["New Signups".into(), "56".into(), "Growing".into()],
                vec!["Revenue".into(), "$12,345".into(), "Up 15%".into()],
                vec!["Support Tickets".into(), "23".into(), "Resolved".into()],
            ],
        }));
    }

    if matches!(kind, "all" | "chart") {
        components.push(Component::Chart(ChartData {
            kind: "pie".to_string(),
            title: "Sample Chart".to_string(),
            labels: vec![
                "Chrome".to_string(),
                "Firefox".to_string(),
                "Safari".to_string(),
                "Edge".to_string(),
            ],
            values: vec![65.0, 20.0, 10.0, 5.0],
        }));
    }

    if matches!(kind, "all" | "cards") {
        components.push(Component::Cards(vec![
            Card {
                title: "Total".to_string(),
                value: "1,234".to_string(),
                description: "Total count".to_string(),
            },
            Card {
                title: "Average".to_string(),
                value: "87.5".to_string(),
                description: "Average score".to_string(),
            },
            Card {
                title: "Growth".to_string(),
                value: "+15%".to_string(),
                description: "This month".to_string(),
            },
        ]));
    }

    Ok((
        StatusCode::OK,
        Json(SampleDataResponse {
            text: "Sample components generated for testing:".to_string(),
            components,
        }),
    ))
}

/// Shared chat flow: detect intent and language, assemble the prompt, call
/// the provider, parse the response for components.
async fn ask(
    provider: &Arc<dyn CompletionProvider + Send + Sync>,
    snapshot: &str,
    question: &str,
) -> Result<FormattedResponse, AppError> {
    let intent = prompt::detect_intent(question);
    let language = prompt::detect_language(question);
    let assembled = prompt::build_prompt(snapshot, question, &intent, language);

    info!(
        "Completion request: model={}, structured={}, prompt_chars={}",
        provider.model(),
        intent.wants_structured(),
        assembled.chars().count()
    );

    let raw = provider
        .complete(prompt::SYSTEM_MESSAGE, &assembled)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(formatter::parse_response(
        &raw,
        question,
        intent.wants_structured(),
    ))
}

/// PDF extraction is blocking work; cold cache misses run off the async
/// runtime.
async fn load_snapshot(state: &AppState) -> Result<Arc<DocumentSnapshot>, AppError> {
    let path = PathBuf::from(&state.settings.pdf_path);
    if let Some(snapshot) = state.snapshots.peek(&path) {
        return Ok(snapshot);
    }
    let snapshots = state.snapshots.clone();
    tokio::task::spawn_blocking(move || snapshots.get_or_extract(&path))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}
