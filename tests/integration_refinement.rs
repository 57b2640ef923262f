//! End-to-end refinement tests
//!
//! Drives the loop and the web front end against a stub Ollama server on an
//! ephemeral port, so the real HTTP client is exercised too.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};
use tower::ServiceExt;

use triad::config::Config;
use triad::llm::{LlmClient, OllamaClient, OllamaConfig};
use triad::refine::{CRITIC_SYSTEM, Outcome, RefinementConfig, RefinementLoop, VALIDATOR_SYSTEM, Verdict};
use triad::server::{AppState, create_router};

/// Stub `/api/generate`: rejects the first `rejections` validator calls, then approves.
async fn spawn_ollama_stub(rejections: u32) -> String {
    let validator_calls = Arc::new(AtomicU32::new(0));
    let router = Router::new().route(
        "/api/generate",
        post(move |Json(body): Json<Value>| {
            let validator_calls = Arc::clone(&validator_calls);
            async move {
                let system = body["system"].as_str().unwrap_or_default();
                let text = if system == VALIDATOR_SYSTEM {
                    if validator_calls.fetch_add(1, Ordering::SeqCst) < rejections {
                        "**REJECTED**: needs more examples".to_string()
                    } else {
                        "APPROVED: complete and clear".to_string()
                    }
                } else if system == CRITIC_SYSTEM {
                    "Strengths: clear. Weaknesses: few examples.".to_string()
                } else {
                    format!("  draft for: {}  ", body["prompt"].as_str().unwrap_or_default().len())
                };
                Json(json!({"response": text, "done": true}))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn ollama(base_url: String) -> Arc<dyn LlmClient> {
    Arc::new(
        OllamaClient::new(OllamaConfig {
            base_url,
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_loop_over_http_approves_after_revision() {
    let base_url = spawn_ollama_stub(1).await;
    let runner = RefinementLoop::new(ollama(base_url), RefinementConfig::default());

    let report = runner
        .run("Write a professional email declining a job offer politely", 3)
        .await
        .unwrap();

    assert!(report.outcome.is_approved());
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.rounds[0].verdict, Verdict::Rejected);
    assert_eq!(report.rounds[1].verdict, Verdict::Approved);
    // Responses are trimmed by the client
    assert!(report.rounds[0].artifact.starts_with("draft for:"));
    assert_eq!(report.outcome.artifact(), Some(report.rounds[1].artifact.as_str()));
}

#[tokio::test]
async fn test_loop_over_http_exhausts_rounds() {
    let base_url = spawn_ollama_stub(u32::MAX).await;
    let runner = RefinementLoop::new(ollama(base_url), RefinementConfig::default());

    let report = runner.run("Design a daily routine", 2).await.unwrap();
    assert!(matches!(report.outcome, Outcome::Exhausted { rounds_used: 2, .. }));
    assert_eq!(report.rounds.len(), 2);
}

#[tokio::test]
async fn test_unreachable_backend_fails_first_stage() {
    // Nothing listens on this port once the listener is dropped
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let runner = RefinementLoop::new(ollama(format!("http://{}", addr)), RefinementConfig::default());
    let report = runner.run("task", 3).await.unwrap();

    match report.outcome {
        Outcome::Failed {
            stage, last_artifact, ..
        } => {
            assert_eq!(stage.to_string(), "worker");
            assert!(last_artifact.is_none());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.rounds.is_empty());
}

#[tokio::test]
async fn test_web_session_end_to_end() {
    let base_url = spawn_ollama_stub(0).await;
    let mut config = Config::default();
    config.llm.base_url = base_url.clone();
    let router = create_router(AppState::new(&config, ollama(base_url)));

    let req = Request::builder()
        .method("POST")
        .uri("/start_task")
        .header("content-type", "application/json")
        .body(Body::from(json!({"task": "Write a haiku", "max_rounds": 2}).to_string()))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let started: Value = serde_json::from_slice(&bytes).unwrap();
    let id = started["session_id"].as_str().unwrap().to_string();

    let mut snapshot = Value::Null;
    for _ in 0..300 {
        let req = Request::builder()
            .uri(format!("/get_status/{}", id))
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        snapshot = serde_json::from_slice(&bytes).unwrap();
        if snapshot["status"] != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["max_rounds"], 2);
    assert_eq!(snapshot["rounds"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["final_result"]["approved"], true);
    assert_eq!(snapshot["final_result"]["rounds_used"], 1);
}
