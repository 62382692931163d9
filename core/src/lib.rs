//! Fetch-style client core for JSONP endpoints.
//!
//! # Overview
//! Emulates the fetch contract (`Headers`, `Request`, `Response`, one call
//! that settles once) on top of script-tag loading: the request URL gets a
//! `callback=<name>` parameter, the endpoint serves `<name>(<json>)`, and
//! the payload handed to that call becomes the response body.
//!
//! # Design
//! - `JsonpClient` owns its callback registry; nothing is process-global and
//!   settled requests leave no trace behind.
//! - The I/O boundary is explicit (host-does-IO): `begin` produces the
//!   script URL, the host loads it, `deliver` / `script_loaded` /
//!   `script_failed` settle. `fetch` runs the same steps over a pluggable
//!   `Transport`; `UreqTransport` is the HTTP one.
//! - Body readers are gated by `Capabilities`, fixed when a body is built.
//! - The real HTTP status is never observable: a loaded script always
//!   yields status 200.
//!
//! # Security
//! A JSONP endpoint runs arbitrary script in the loading context. This crate
//! only reads a single call expression out of the body and never evaluates
//! anything else, but a browser host that injects the script element grants
//! the remote origin full script access to the page.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod registry;
pub mod request;
pub mod response;
pub mod script;
pub mod transport;

pub use body::{Blob, Body, BodyInit, Capabilities, FormData, ReadBody};
pub use client::{FetchInput, JsonpClient, ScriptRequest};
pub use config::ClientConfig;
pub use error::FetchError;
pub use headers::Headers;
pub use registry::CallbackToken;
pub use request::{Request, RequestInit};
pub use response::{Response, ResponseInit, ResponseType};
pub use transport::{FetchJsonp, ScriptLoad, Transport, UreqTransport};
