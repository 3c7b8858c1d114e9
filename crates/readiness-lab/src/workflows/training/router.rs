use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::content::DocumentSource;
use super::events::{ReflectionPhase, RunEventSink};
use super::service::{DebriefRequest, RunId, ScenarioService, ScenarioServiceError};

/// Router builder exposing the scenario run and debrief endpoints.
pub fn scenario_router<D, E>(service: Arc<ScenarioService<D, E>>) -> Router
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/scenarios/:scenario_id/runs",
            post(start_run_handler::<D, E>),
        )
        .route(
            "/api/v1/scenarios/:scenario_id/debrief",
            post(score_submission_handler::<D, E>),
        )
        .route("/api/v1/runs/:run_id", get(run_view_handler::<D, E>))
        .route(
            "/api/v1/runs/:run_id/decision-points/:index/options",
            get(options_handler::<D, E>),
        )
        .route(
            "/api/v1/runs/:run_id/decision-points/:index/selection",
            post(select_option_handler::<D, E>),
        )
        .route(
            "/api/v1/runs/:run_id/decision-points/:index/confidence",
            post(set_confidence_handler::<D, E>),
        )
        .route(
            "/api/v1/runs/:run_id/decision-points/:index/lock",
            post(lock_decision_handler::<D, E>),
        )
        .route(
            "/api/v1/runs/:run_id/reflection",
            put(reflection_handler::<D, E>),
        )
        .route("/api/v1/runs/:run_id/debrief", post(debrief_handler::<D, E>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRunRequest {
    #[serde(default)]
    pub(crate) session_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SelectOptionRequest {
    pub(crate) option_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfidenceRequest {
    pub(crate) confidence: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReflectionRequest {
    #[serde(default = "default_reflection_phase")]
    pub(crate) phase: ReflectionPhase,
    pub(crate) text: String,
}

fn default_reflection_phase() -> ReflectionPhase {
    ReflectionPhase::Post
}

pub(crate) async fn start_run_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path(scenario_id): Path<String>,
    body: Option<Json<StartRunRequest>>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    let session_hint = body.and_then(|Json(request)| request.session_hint);
    match service.start_run(&scenario_id, session_hint) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn run_view_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path(run_id): Path<String>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.run_view(&RunId(run_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn options_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path((run_id, index)): Path<(String, u8)>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.options(&RunId(run_id), index) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn select_option_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path((run_id, index)): Path<(String, u8)>,
    Json(request): Json<SelectOptionRequest>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.select_option(&RunId(run_id), index, &request.option_id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn set_confidence_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path((run_id, index)): Path<(String, u8)>,
    Json(request): Json<ConfidenceRequest>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.set_confidence(&RunId(run_id), index, request.confidence) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn lock_decision_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path((run_id, index)): Path<(String, u8)>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.lock_decision(&RunId(run_id), index) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn reflection_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path(run_id): Path<String>,
    Json(request): Json<ReflectionRequest>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.submit_reflection(&RunId(run_id), request.phase, &request.text) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn debrief_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path(run_id): Path<String>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.compute_debrief(&RunId(run_id)) {
        Ok(debrief) => (StatusCode::OK, Json(debrief)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn score_submission_handler<D, E>(
    State(service): State<Arc<ScenarioService<D, E>>>,
    Path(scenario_id): Path<String>,
    Json(request): Json<DebriefRequest>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    match service.score_submission(&scenario_id, &request) {
        Ok(debrief) => (StatusCode::OK, Json(debrief)).into_response(),
        Err(error) => service_error_response(error),
    }
}

/// Validation failures surface their message verbatim so clients can display
/// it unchanged; unknown runs and scenarios map to 404.
fn service_error_response(error: ScenarioServiceError) -> Response {
    let status = match &error {
        ScenarioServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScenarioServiceError::ScenarioNotFound(_) | ScenarioServiceError::RunNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ScenarioServiceError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
