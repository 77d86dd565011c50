//! HTTP API integration tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mmfd_an::{build_router, fusion::FusionEngine, store::AnalysisStore, AppState, ScorerSet};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    build_router(AppState::new(FusionEngine::default(), ScorerSet::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections come back as plain text
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn tone(freq: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let n = (sample_rate as f64 * seconds) as usize;
    (0..n)
        .map(|i| (0.5 * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin()) as f32)
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mmfd-an");
    assert_eq!(body["storedAnalyses"], 0);
}

#[tokio::test]
async fn test_fusion_strategies_listing() {
    let app = app();
    let (status, body) = send(&app, "GET", "/fusion-strategies", None).await;
    assert_eq!(status, StatusCode::OK);

    let strategies = body["strategies"].as_array().unwrap();
    assert_eq!(strategies.len(), 4);
    let defaults: Vec<&Value> = strategies.iter().filter(|s| s["default"] == true).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "weighted_average");
}

#[tokio::test]
async fn test_analyze_text_stores_record() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/analyze/text",
        Some(json!({"text": "SHOCKING TRUTH: doctors hate this one weird trick! Act now!!!!"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modality"], "text");
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
    assert!(body["result"]["score"].as_f64().unwrap() < 50.0);
    let indicators = body["result"]["indicators"].as_array().unwrap();
    assert!(indicators.iter().any(|i| i == "clickbait_language"));

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["storedAnalyses"], 1);
}

#[tokio::test]
async fn test_analyze_empty_text_is_neutral() {
    let app = app();
    let (status, body) = send(&app, "POST", "/analyze/text", Some(json!({"text": ""}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["score"], 50.0);
    assert_eq!(body["result"]["confidence"], 0.35);
}

#[tokio::test]
async fn test_analyze_audio() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/analyze/audio",
        Some(json!({"samples": tone(440.0, 0.5, 16_000), "sampleRate": 16_000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modality"], "audio");
    let confidence = body["result"]["confidence"].as_f64().unwrap();
    assert!((0.6..=0.9).contains(&confidence));
}

#[tokio::test]
async fn test_analyze_video() {
    let app = app();
    let frame = json!({"width": 8, "height": 8, "luma": vec![128u8; 64]});
    let (status, body) = send(
        &app,
        "POST",
        "/analyze/video",
        Some(json!({"frames": [frame.clone(), frame], "fps": 25.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modality"], "video");
    let severe = body["result"]["severeIndicators"].as_array().unwrap();
    assert!(severe.iter().any(|i| i == "low_sharpness"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = app();
    let (status, _) = send(&app, "POST", "/analyze/audio", Some(json!({"samples": "nope"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_fuse_endpoint() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/fuse",
        Some(json!({
            "modalities": {
                "text": {"score": 20.0, "confidence": 0.6},
                "audio": {"score": 25.0, "confidence": 0.8},
                "video": {"score": 22.0, "confidence": 0.7}
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], "FAKE");
    assert_eq!(body["finalScore"], 22.0);
    assert_eq!(body["fusionStrategy"], "weighted_average");
    assert!(body["confidence"].as_f64().unwrap() > 0.685);
    assert!(body["agreement"]["spread"].as_f64().unwrap() < 15.0);
    assert!(body["explanation"].as_str().unwrap().contains("Recommendation"));
}

#[tokio::test]
async fn test_fuse_with_strategy() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/fuse",
        Some(json!({
            "modalities": {
                "text": {"score": 20.0, "confidence": 0.6},
                "video": {"score": 90.0, "confidence": 0.7}
            },
            "fusionStrategy": "maximum"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalScore"], 90.0);
    assert_eq!(body["verdict"], "REAL");
}

#[tokio::test]
async fn test_fuse_empty_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "POST", "/fuse", Some(json!({"modalities": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INPUT");
}

#[tokio::test]
async fn test_unknown_strategy_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/fuse",
        Some(json!({
            "modalities": {"text": {"score": 20.0, "confidence": 0.6}},
            "fusionStrategy": "learned"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_complete_analysis_flow() {
    let app = app();
    let (_, text) = send(
        &app,
        "POST",
        "/analyze/text",
        Some(json!({"text": "You won't believe what happened next! BREAKING cover-up exposed!!!!"})),
    )
    .await;
    let (_, audio) = send(
        &app,
        "POST",
        "/analyze/audio",
        Some(json!({"samples": tone(440.0, 0.5, 16_000), "sampleRate": 16_000})),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/analyze/complete",
        Some(json!({
            "textAnalysisId": text["id"],
            "audioAnalysisId": audio["id"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["analysisId"].is_string());
    let contributions = body["modalityContributions"].as_object().unwrap();
    assert_eq!(contributions.len(), 2);
    assert!(contributions.contains_key("text"));
    assert!(contributions.contains_key("audio"));
    let weights = body["weightsUsed"].as_object().unwrap();
    let total: f64 = weights.values().map(|w| w.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_complete_unknown_id_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/analyze/complete",
        Some(json!({"textAnalysisId": "7f1f2a4e-8d8b-4f3c-9a51-0b6b2f0c1d2e"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_complete_wrong_slot_is_bad_request() {
    let app = app();
    let (_, text) = send(&app, "POST", "/analyze/text", Some(json!({"text": "Plain words."}))).await;
    let (status, _) = send(
        &app,
        "POST",
        "/analyze/complete",
        Some(json!({"videoAnalysisId": text["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_evicts_oldest_analysis() {
    let app = build_router(
        AppState::new(FusionEngine::default(), ScorerSet::default())
            .with_store(AnalysisStore::with_capacity(1)),
    );
    let (_, first) = send(&app, "POST", "/analyze/text", Some(json!({"text": "First report."}))).await;
    let (_, second) = send(&app, "POST", "/analyze/text", Some(json!({"text": "Second report."}))).await;

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["storedAnalyses"], 1);

    let (status, _) = send(
        &app,
        "POST",
        "/analyze/complete",
        Some(json!({"textAnalysisId": first["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/analyze/complete",
        Some(json!({"textAnalysisId": second["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_single_modality_voting_keeps_score() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/fuse",
        Some(json!({
            "modalities": {"audio": {"score": 55.0, "confidence": 0.7}},
            "fusionStrategy": "voting"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalScore"], 55.0);
    assert_eq!(body["verdict"], "UNCERTAIN");
}

#[tokio::test]
async fn test_complete_without_ids_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "POST", "/analyze/complete", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INPUT");
}
