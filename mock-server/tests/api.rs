use std::collections::HashMap;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_payloads};
use serde_json::json;
use tower::ServiceExt;

async fn body_string(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- data ---

#[tokio::test]
async fn data_calls_back_with_default_payload() {
    let resp = app()
        .oneshot(get("/data?callback=fetchp._callbacks._abc123xyz"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/javascript; charset=utf-8"
    );
    assert_eq!(
        body_string(resp).await,
        r#"/**/fetchp._callbacks._abc123xyz({"a":1});"#
    );
}

#[tokio::test]
async fn data_without_callback_returns_400() {
    let resp = app().oneshot(get("/data")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn data_with_script_in_callback_returns_400() {
    let resp = app()
        .oneshot(get("/data?callback=alert(1)%3Bcb"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- payload ---

#[tokio::test]
async fn payload_serves_seeded_value() {
    let mut payloads = HashMap::new();
    payloads.insert("list".to_string(), json!([1, 2, 3]));
    let resp = app_with_payloads(payloads)
        .oneshot(get("/payload/list?callback=cb"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "/**/cb([1,2,3]);");
}

#[tokio::test]
async fn payload_unknown_key_returns_404() {
    let resp = app()
        .oneshot(get("/payload/missing?callback=cb"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_returns_query_without_callback() {
    let resp = app()
        .oneshot(get("/echo?q=rust+jsonp&page=2&callback=cb"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    let json = body
        .strip_prefix("/**/cb(")
        .and_then(|s| s.strip_suffix(");"))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(value, json!({"q": "rust jsonp", "page": "2"}));
}

// --- status ---

#[tokio::test]
async fn status_serves_script_under_error_code() {
    let resp = app()
        .oneshot(get("/status/500?callback=cb"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(resp).await, r#"/**/cb({"status":500});"#);
}

#[tokio::test]
async fn status_out_of_range_returns_400() {
    let resp = app()
        .oneshot(get("/status/1000?callback=cb"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- silent ---

#[tokio::test]
async fn silent_never_calls_back() {
    let resp = app().oneshot(get("/silent?callback=cb")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!body_string(resp).await.contains("cb("));
}
