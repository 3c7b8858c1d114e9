use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use readiness_lab::workflows::training::{
    scenario_router, CertificateIssuer, DocumentSource, RunEventSink, RunId, ScenarioService,
    ScenarioServiceError,
};

use crate::infra::AppState;

pub(crate) fn with_scenario_routes<D, E>(
    service: Arc<ScenarioService<D, E>>,
    issuer: Arc<dyn CertificateIssuer>,
) -> Router
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    scenario_router(service.clone())
        .merge(certificate_router(service, issuer))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

struct CertificateState<D, E> {
    service: Arc<ScenarioService<D, E>>,
    issuer: Arc<dyn CertificateIssuer>,
}

impl<D, E> Clone for CertificateState<D, E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            issuer: self.issuer.clone(),
        }
    }
}

fn certificate_router<D, E>(
    service: Arc<ScenarioService<D, E>>,
    issuer: Arc<dyn CertificateIssuer>,
) -> Router
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/runs/:run_id/certificate",
            post(certificate_handler::<D, E>),
        )
        .with_state(CertificateState { service, issuer })
}

async fn certificate_handler<D, E>(
    State(state): State<CertificateState<D, E>>,
    Path(run_id): Path<String>,
) -> Response
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    let view = match state.service.run_view(&RunId(run_id)) {
        Ok(view) => view,
        Err(error) => {
            let status = match &error {
                ScenarioServiceError::RunNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let payload = json!({ "error": error.to_string() });
            return (status, Json(payload)).into_response();
        }
    };

    match state
        .issuer
        .issue(view.session_hint.as_deref(), &view.scenario_id)
    {
        Ok(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, artifact.content_type)],
            artifact.bytes,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
