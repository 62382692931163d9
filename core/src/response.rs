//! Buffered response descriptor.

use crate::body::{Body, BodyInit, Capabilities, ReadBody};
use crate::headers::Headers;

/// Options used to build a `Response`.
#[derive(Debug, Clone, Default)]
pub struct ResponseInit {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub url: String,
}

/// Where a response came from. Script transport only produces `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Default,
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    ok: bool,
    status_text: String,
    headers: Headers,
    url: String,
    response_type: ResponseType,
    body: Body,
}

impl Response {
    pub fn new(body: BodyInit, init: ResponseInit, capabilities: Capabilities) -> Self {
        Self {
            status: init.status,
            ok: (200..300).contains(&init.status),
            status_text: init.status_text,
            headers: init.headers,
            url: init.url,
            response_type: ResponseType::Default,
            body: Body::new(body, capabilities),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// True iff the status is in `200..300`.
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }
}

impl ReadBody for Response {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}
