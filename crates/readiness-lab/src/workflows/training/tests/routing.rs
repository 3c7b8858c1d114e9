use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{build_service, words};
use crate::workflows::training::router::scenario_router;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn start_run_returns_created_with_first_options() {
    let (service, _) = build_service();
    let router = scenario_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/fixture/runs",
            json!({ "sessionHint": "session-9" }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    assert!(payload["runId"].is_string());
    assert_eq!(payload["scenarioId"], "fixture");
    assert_eq!(payload["decisionPoint"]["index"], 1);
    assert_eq!(
        payload["decisionPoint"]["options"]
            .as_array()
            .map(Vec::len),
        Some(3)
    );
}

#[tokio::test]
async fn unknown_scenario_returns_not_found() {
    let (service, _) = build_service();
    let router = scenario_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/missing/runs",
            json!({}),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lock_without_confidence_surfaces_the_exact_message() {
    let (service, _) = build_service();
    let router = scenario_router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/fixture/runs",
            json!({}),
        ))
        .await
        .expect("router dispatch");
    let run_id = read_json(response).await["runId"]
        .as_str()
        .expect("run id")
        .to_string();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/runs/{run_id}/decision-points/1/selection"),
            json!({ "optionId": "alpha" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/runs/{run_id}/decision-points/1/lock"),
            json!({}),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json(response).await;
    assert_eq!(
        payload["error"],
        "Please rate your confidence before continuing."
    );
}

#[tokio::test]
async fn full_flow_over_http_yields_a_debrief() {
    let (service, sink) = build_service();
    let router = scenario_router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/fixture/runs",
            json!({}),
        ))
        .await
        .expect("router dispatch");
    let run_id = read_json(response).await["runId"]
        .as_str()
        .expect("run id")
        .to_string();

    for (index, option_id, confidence) in
        [(1u8, "alpha", 4u8), (2, "beta", 3), (3, "gamma", 2)]
    {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/runs/{run_id}/decision-points/{index}/selection"),
                json!({ "optionId": option_id }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/runs/{run_id}/decision-points/{index}/confidence"),
                json!({ "confidence": confidence }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/runs/{run_id}/decision-points/{index}/lock"),
                json!({}),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/runs/{run_id}/reflection"),
            json!({ "text": words(60) }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/runs/{run_id}/debrief"),
            json!({}),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["missionScore"], 68);
    assert_eq!(payload["CRI"], 78);
    assert_eq!(
        payload["shortFeedback"]["line1"],
        "Mission Score: 68 — Competent with growth areas"
    );

    let statuses = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/runs/{run_id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    let view = read_json(statuses).await;
    assert_eq!(view["status"], "scored");

    assert_eq!(sink.kinds().last(), Some(&"debrief_computed"));
}

#[tokio::test]
async fn stateless_debrief_endpoint_accepts_the_published_shape() {
    let (service, _) = build_service();
    let router = scenario_router(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/fixture/debrief",
            json!({
                "selections": {
                    "1": { "optionId": "alpha", "confidence": 4 },
                    "2": { "optionId": "beta", "confidence": 3 },
                    "3": { "optionId": "gamma", "confidence": 2 }
                },
                "reflectionText": words(60)
            }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["decisionQuality"], 60);
    assert_eq!(payload["confidenceAlignment"], 100);
    assert_eq!(payload["missionScore"], 68);
}

#[tokio::test]
async fn options_endpoint_tracks_the_locked_branch() {
    let (service, _) = build_service();
    let router = scenario_router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/scenarios/fixture/runs",
            json!({}),
        ))
        .await
        .expect("router dispatch");
    let run_id = read_json(response).await["runId"]
        .as_str()
        .expect("run id")
        .to_string();

    for (uri, body) in [
        (
            format!("/api/v1/runs/{run_id}/decision-points/1/selection"),
            json!({ "optionId": "bravo" }),
        ),
        (
            format!("/api/v1/runs/{run_id}/decision-points/1/confidence"),
            json!({ "confidence": 2 }),
        ),
        (
            format!("/api/v1/runs/{run_id}/decision-points/1/lock"),
            json!({}),
        ),
    ] {
        let response = router
            .clone()
            .oneshot(json_request("POST", &uri, body))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/runs/{run_id}/decision-points/2/options"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let ids: Vec<&str> = payload["options"]
        .as_array()
        .expect("options array")
        .iter()
        .filter_map(|o| o["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["delta"]);
}
