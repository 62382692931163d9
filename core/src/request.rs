//! GET-only request descriptor.

use serde_json::Value;

use crate::body::{Body, BodyInit, Capabilities, ReadBody};
use crate::error::FetchError;
use crate::headers::Headers;

/// Methods whose spelling is normalized to upper case.
const METHODS: [&str; 6] = ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT"];

/// Options accepted alongside a URL when building a `Request`.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Option<Headers>,
    pub body: Option<BodyInit>,
}

/// A script-transport request. The method is always `GET`.
#[derive(Debug, Clone)]
pub struct Request {
    url: String,
    method: String,
    headers: Headers,
    body: Body,
}

impl Request {
    pub fn new(url: impl Into<String>, init: RequestInit) -> Result<Self, FetchError> {
        Self::with_capabilities(url, init, Capabilities::default())
    }

    pub fn with_capabilities(
        url: impl Into<String>,
        init: RequestInit,
        capabilities: Capabilities,
    ) -> Result<Self, FetchError> {
        if let Some(method) = init.method.as_deref() {
            let method = normalize_method(method);
            if method != "GET" {
                return Err(FetchError::UnsupportedMethod(method));
            }
        }
        if init.body.as_ref().is_some_and(carries_payload) {
            return Err(FetchError::UnsupportedBody);
        }
        Ok(Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: init.headers.unwrap_or_default(),
            body: Body::new(BodyInit::Empty, capabilities),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

impl ReadBody for Request {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// Whether `body` counts as a supplied body. Empty text, `null`, `false`,
/// `0` and `""` JSON values do not.
fn carries_payload(body: &BodyInit) -> bool {
    match body {
        BodyInit::Json(Value::Null) | BodyInit::Json(Value::Bool(false)) => false,
        BodyInit::Json(Value::Number(n)) => n.as_f64() != Some(0.0),
        BodyInit::Json(Value::String(s)) => !s.is_empty(),
        other => !other.is_empty(),
    }
}

/// Upper-case well-known methods, leave anything else untouched.
pub fn normalize_method(method: &str) -> String {
    let upcased = method.to_ascii_uppercase();
    if METHODS.contains(&upcased.as_str()) {
        upcased
    } else {
        method.to_string()
    }
}
