use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub type Payloads = Arc<RwLock<HashMap<String, Value>>>;

const CALLBACK_PARAM: &str = "callback";

/// Router with the default payload set: `data` → `{"a":1}`.
pub fn app() -> Router {
    let mut payloads = HashMap::new();
    payloads.insert("data".to_string(), json!({"a": 1}));
    app_with_payloads(payloads)
}

pub fn app_with_payloads(payloads: HashMap<String, Value>) -> Router {
    let payloads: Payloads = Arc::new(RwLock::new(payloads));
    Router::new()
        .route("/data", get(data))
        .route("/payload/{key}", get(payload))
        .route("/echo", get(echo))
        .route("/status/{code}", get(status))
        .route("/silent", get(silent))
        .with_state(payloads)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_app(listener, app()).await
}

pub async fn run_app(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("serving JSONP on {addr}");
    }
    axum::serve(listener, app).await
}

async fn data(
    State(payloads): State<Payloads>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let callback = callback_name(&query)?;
    let payloads = payloads.read().await;
    let value = payloads.get("data").cloned().unwrap_or(Value::Null);
    Ok(script(StatusCode::OK, &callback, &value))
}

async fn payload(
    State(payloads): State<Payloads>,
    Path(key): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let callback = callback_name(&query)?;
    let payloads = payloads.read().await;
    let value = payloads.get(&key).ok_or(StatusCode::NOT_FOUND)?;
    Ok(script(StatusCode::OK, &callback, value))
}

/// Calls back with every query parameter except the callback itself.
async fn echo(Query(query): Query<HashMap<String, String>>) -> Result<Response, StatusCode> {
    let callback = callback_name(&query)?;
    let echoed: Map<String, Value> = query
        .into_iter()
        .filter(|(k, _)| k != CALLBACK_PARAM)
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    Ok(script(StatusCode::OK, &callback, &Value::Object(echoed)))
}

/// Serves a valid callback script under an arbitrary status code.
async fn status(
    Path(code): Path<u16>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let callback = callback_name(&query)?;
    let code = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(script(code, &callback, &json!({ "status": code.as_u16() })))
}

/// Loads fine but never calls back.
async fn silent() -> Response {
    javascript(StatusCode::OK, "/* nothing to see */".to_string())
}

fn callback_name(query: &HashMap<String, String>) -> Result<String, StatusCode> {
    let name = query.get(CALLBACK_PARAM).ok_or(StatusCode::BAD_REQUEST)?;
    if !is_callback_path(name) {
        debug!("rejecting callback {name:?}");
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(name.clone())
}

/// Callback names are restricted to dotted identifiers so the served script
/// cannot carry anything but the call.
fn is_callback_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

fn script(status: StatusCode, callback: &str, value: &Value) -> Response {
    debug!("calling back {callback} with status {status}");
    javascript(status, format!("/**/{callback}({value});"))
}

fn javascript(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        body,
    )
        .into_response()
}
