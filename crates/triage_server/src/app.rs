//! Router, state and tool handlers.
//!
//! Five operations are exposed under `POST /tools/<name>`, each taking a
//! small JSON body and returning a human-readable text block. A handler
//! awaits its flow inline: one invocation can block its request for the
//! full pipeline duration (minutes). There is no way to abort a running
//! flow; the only bound is the flow's own wall-clock timeout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use triage_core::Settings;
use triage_flows::{AgentSet, Flow, FlowParams};

/// Shared server state: immutable settings plus the wired agents.
///
/// Per-call overrides (repository, recipient) are applied to copies, never
/// to this shared value, so concurrent requests cannot observe each
/// other's parameters.
pub struct ServerState {
    pub settings: Settings,
    pub agents: AgentSet,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub repository: String,
    pub meeting_recipient: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    pub repository: String,
}

#[derive(Debug, Deserialize)]
pub struct NotionRequest {
    pub github_data: String,
}

#[derive(Debug, Deserialize)]
pub struct CalendarRequest {
    pub github_data: String,
    pub meeting_recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app_name: &'static str,
}

type HandlerResult = Result<Json<TextResponse>, (StatusCode, String)>;

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools/analyze_repository", post(analyze_repository))
        .route("/tools/fetch_github_data", post(fetch_github_data))
        .route("/tools/create_notion_database", post(create_notion_database))
        .route("/tools/schedule_bug_meetings", post(schedule_bug_meetings))
        .route("/tools/workflow_status", post(workflow_status))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app_name: "triage-server",
    })
}

/// Full pipeline: GitHub -> Notion -> Calendar. Long-running (2-5 min).
pub async fn analyze_repository(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AnalyzeRequest>,
) -> HandlerResult {
    let settings = apply_recipient(&state.settings, request.meeting_recipient);
    let params = validate_params(&settings, Some(&request.repository))?;

    info!(repository = %params.repository, "analyze_repository requested");
    let flow = Flow::full(&state.agents, params).map_err(internal)?;
    let report = flow.execute().await;

    let text = if report.success {
        format!(
            "Complete analysis finished successfully.\n\
             \n\
             Repository:        {}\n\
             Execution time:    {:.1}s\n\
             Meeting recipient: {}\n\
             Completed:         {}\n\
             \n\
             Accomplished:\n\
             - Fetched GitHub issues and pull requests\n\
             - Analyzed data for bugs and priorities\n\
             - Created the 'GitHub Issues & PRs' database in Notion\n\
             - Inserted all GitHub data into Notion\n\
             - Scheduled bug review meetings in Google Calendar\n\
             \n\
             Result summary:\n{}",
            report.repository.as_deref().unwrap_or("-"),
            report.execution_time_seconds,
            report.recipient_email.as_deref().unwrap_or("-"),
            report.timestamp,
            truncate(report.result.as_deref().unwrap_or(""), 1500),
        )
    } else {
        failure_text("Analysis failed", &report.error, report.execution_time_seconds)
    };

    Ok(Json(TextResponse { text }))
}

/// GitHub fetch and analysis only, no Notion or Calendar side effects.
pub async fn fetch_github_data(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<FetchRequest>,
) -> HandlerResult {
    let params = validate_params(&state.settings, Some(&request.repository))?;

    info!(repository = %params.repository, "fetch_github_data requested");
    let flow = Flow::github(&state.agents, params).map_err(internal)?;
    let report = flow.execute().await;

    let text = if report.success {
        format!(
            "GitHub data fetched successfully.\n\
             \n\
             Repository:     {}\n\
             Execution time: {:.1}s\n\
             Completed:      {}\n\
             \n\
             Summary:\n{}\n\
             \n\
             Use this data with the 'create_notion_database' or \
             'schedule_bug_meetings' tools.",
            report.repository.as_deref().unwrap_or("-"),
            report.execution_time_seconds,
            report.timestamp,
            truncate(report.result.as_deref().unwrap_or(""), 1500),
        )
    } else {
        failure_text("GitHub fetch failed", &report.error, report.execution_time_seconds)
    };

    Ok(Json(TextResponse { text }))
}

/// Notion database creation from a pre-fetched GitHub data blob.
pub async fn create_notion_database(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<NotionRequest>,
) -> HandlerResult {
    let params = validate_params(&state.settings, None)?;

    info!("create_notion_database requested");
    let flow =
        Flow::notion_with_data(&state.agents, params, request.github_data).map_err(internal)?;
    let report = flow.execute().await;

    let text = if report.success {
        format!(
            "Notion database created successfully.\n\
             \n\
             Execution time: {:.1}s\n\
             Completed:      {}\n\
             \n\
             Accomplished:\n\
             - Searched for a parent page in Notion\n\
             - Created the 'GitHub Issues & PRs' database\n\
             - Inserted the provided GitHub data",
            report.execution_time_seconds, report.timestamp,
        )
    } else {
        failure_text("Notion creation failed", &report.error, report.execution_time_seconds)
    };

    Ok(Json(TextResponse { text }))
}

/// Calendar scheduling from a pre-fetched GitHub data blob.
pub async fn schedule_bug_meetings(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CalendarRequest>,
) -> HandlerResult {
    let settings = apply_recipient(&state.settings, request.meeting_recipient);
    let params = validate_params(&settings, None)?;

    info!(recipient = %params.attendee_email, "schedule_bug_meetings requested");
    let flow =
        Flow::calendar_with_data(&state.agents, params, request.github_data).map_err(internal)?;
    let report = flow.execute().await;

    let text = if report.success {
        format!(
            "Bug review meetings scheduled successfully.\n\
             \n\
             Execution time:    {:.1}s\n\
             Meeting recipient: {}\n\
             Meeting duration:  {} minutes\n\
             Bug label:         {}\n\
             Completed:         {}\n\
             \n\
             Check the recipient's calendar for the invitations.",
            report.execution_time_seconds,
            report.recipient_email.as_deref().unwrap_or("-"),
            report.meeting_minutes.unwrap_or_default(),
            report.bug_label.as_deref().unwrap_or("-"),
            report.timestamp,
        )
    } else {
        failure_text("Calendar scheduling failed", &report.error, report.execution_time_seconds)
    };

    Ok(Json(TextResponse { text }))
}

/// Configuration and status dump. Quick, no pipeline run.
pub async fn workflow_status(State(state): State<Arc<ServerState>>) -> HandlerResult {
    let settings = &state.settings;
    let text = format!(
        "TriageHub backend status\n\
         \n\
         Configuration:\n\
         - Target repository: {}\n\
         - Bug label:         {}\n\
         - Meeting duration:  {} minutes\n\
         - Default attendee:  {}\n\
         - Entity id:         {}\n\
         \n\
         Credentials:\n\
         - Aggregator API key: {}\n\
         - Model API key:      {}\n\
         \n\
         Available tools:\n\
         - analyze_repository (GitHub -> Notion -> Calendar)\n\
         - fetch_github_data\n\
         - create_notion_database\n\
         - schedule_bug_meetings\n\
         - workflow_status\n\
         \n\
         Timestamp: {}",
        settings.repository,
        settings.bug_label,
        settings.meeting_minutes,
        settings.attendee_email,
        settings.entity_id,
        presence(settings.composio_api_key.is_some()),
        presence(settings.llm_api_key.is_some()),
        Utc::now().to_rfc3339(),
    );

    Ok(Json(TextResponse { text }))
}

fn apply_recipient(settings: &Settings, recipient: Option<String>) -> Settings {
    match recipient {
        Some(email) if !email.is_empty() => settings.clone().with_attendee(email),
        _ => settings.clone(),
    }
}

fn validate_params(
    settings: &Settings,
    repository: Option<&str>,
) -> Result<FlowParams, (StatusCode, String)> {
    FlowParams::from_settings(settings, repository).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid repository format: {e}. Use 'owner/name'."),
        )
    })
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn failure_text(heading: &str, error: &Option<String>, elapsed: f64) -> String {
    format!(
        "{heading}.\n\nError: {}\nExecution time: {elapsed:.1}s",
        error.as_deref().unwrap_or("unknown"),
    )
}

fn presence(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "missing"
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
