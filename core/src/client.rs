//! Script-transport fetch client.
//!
//! # Design
//! `JsonpClient` owns its callback registry. A request moves through three
//! steps, each of which the host can drive directly:
//!
//! 1. `begin` registers a token and returns the script URL to load.
//! 2. `deliver` (or `run_script`, which parses a script body and delivers
//!    its argument) records the payload the script called back with.
//! 3. `script_loaded` / `script_failed` settle the request and drop its
//!    registry entry.
//!
//! `fetch` runs all three against a `Transport`. Settling removes the
//! entry, so a request settles exactly once and a second attempt reports
//! `UnknownCallback`.

use std::time::Instant;

use log::{debug, warn};
use serde_json::Value;

use crate::body::BodyInit;
use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::headers::Headers;
use crate::registry::{CallbackRegistry, CallbackToken};
use crate::request::{Request, RequestInit};
use crate::response::{Response, ResponseInit};
use crate::script::parse_invocation;
use crate::transport::Transport;

/// Either a URL or a prebuilt request.
#[derive(Debug, Clone)]
pub enum FetchInput {
    Url(String),
    Request(Request),
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        FetchInput::Url(url)
    }
}

impl From<Request> for FetchInput {
    fn from(req: Request) -> Self {
        FetchInput::Request(req)
    }
}

/// A registered script load the host still has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub token: CallbackToken,
    /// Fully qualified name the script must call.
    pub callback_name: String,
    /// Request URL with the callback query parameter appended.
    pub script_url: String,
}

#[derive(Debug)]
pub struct JsonpClient {
    config: ClientConfig,
    registry: CallbackRegistry,
}

impl Default for JsonpClient {
    fn default() -> Self {
        Self::from_valid(ClientConfig::default())
    }
}

impl JsonpClient {
    /// Build a client, rejecting configurations whose callback names could
    /// never be called by a script.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ClientConfig) -> Self {
        let registry = CallbackRegistry::new(&config.registry_path);
        Self { config, registry }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of requests registered but not yet settled.
    pub fn pending(&self) -> usize {
        self.registry.len()
    }

    /// Resolve the request to send. A prebuilt request is reused only when
    /// no init accompanies it.
    pub fn prepare(
        &self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<Request, FetchError> {
        let caps = self.config.capabilities;
        match (input.into(), init) {
            (FetchInput::Request(req), None) => Ok(req),
            (FetchInput::Request(req), Some(init)) => {
                Request::with_capabilities(req.url(), init, caps)
            }
            (FetchInput::Url(url), init) => {
                Request::with_capabilities(url, init.unwrap_or_default(), caps)
            }
        }
    }

    /// Append `<callback_param>=<callback_name>` to `url`, before any fragment.
    pub fn script_url(&self, url: &str, callback_name: &str) -> String {
        append_callback(url, &self.config.callback_param, callback_name)
    }

    /// Register a new request and return the script load to perform.
    pub fn begin(
        &mut self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<ScriptRequest, FetchError> {
        let request = self.prepare(input, init)?;
        let param = &self.config.callback_param;
        let (token, script_url) = self.registry.register(
            |name| append_callback(request.url(), param, name),
            Instant::now(),
        );
        let callback_name = self.registry.callback_name(&token);
        debug!("begin {script_url}");
        Ok(ScriptRequest {
            token,
            callback_name,
            script_url,
        })
    }

    /// The callback for `token` was invoked with `payload`.
    pub fn deliver(&mut self, token: &CallbackToken, payload: Value) -> Result<(), FetchError> {
        self.registry.deliver(token, payload)
    }

    /// Execute a loaded script body: if it calls one of this client's
    /// pending callbacks, deliver its argument. Returns the token that was
    /// called back, if any.
    ///
    /// An empty argument list delivers `null`.
    pub fn run_script(&mut self, source: &str) -> Option<CallbackToken> {
        let Some(invocation) = parse_invocation(source) else {
            warn!("loaded script is not a callback invocation");
            return None;
        };
        let Some(token) = self.registry.lookup(&invocation.callee) else {
            warn!("script called unknown callback {}", invocation.callee);
            return None;
        };
        let payload = invocation.argument.unwrap_or(Value::Null);
        self.registry.deliver(&token, payload).ok()?;
        Some(token)
    }

    /// The script for `token` finished loading; settle with its payload.
    ///
    /// The status is always 200: script loading cannot observe the real
    /// HTTP status.
    pub fn script_loaded(&mut self, token: &CallbackToken, src: &str) -> Result<Response, FetchError> {
        let call = self.registry.take(token)?;
        let body = match call.payload {
            Some(v) => BodyInit::Json(v),
            None if self.config.strict_callback => {
                warn!("script {src} loaded without calling {token}");
                return Err(FetchError::CallbackNotInvoked);
            }
            None => {
                debug!("script {src} loaded without calling {token}, empty body");
                BodyInit::Empty
            }
        };
        let init = ResponseInit {
            status: 200,
            status_text: "Ok".to_string(),
            headers: Headers::new(),
            url: src.to_string(),
        };
        Ok(Response::new(body, init, self.config.capabilities))
    }

    /// The script for `token` failed to load; settle it and return the
    /// error to report: `NetworkError`, or `UnknownCallback` if `token` is
    /// not pending.
    pub fn script_failed(&mut self, token: &CallbackToken, reason: &str) -> FetchError {
        match self.registry.take(token) {
            Ok(call) => {
                warn!("script {} failed: {reason}", call.script_url);
                FetchError::NetworkError(reason.to_string())
            }
            Err(e) => e,
        }
    }

    /// Drop a pending request without settling it.
    pub fn cancel(&mut self, token: &CallbackToken) -> Result<(), FetchError> {
        self.registry.take(token).map(|_| ())
    }

    /// Settle every request older than the configured timeout with
    /// `Timeout`. Does nothing when no timeout is configured.
    pub fn expire(&mut self, now: Instant) -> Vec<(CallbackToken, FetchError)> {
        let Some(timeout) = self.config.timeout() else {
            return Vec::new();
        };
        self.registry
            .expired(now, timeout)
            .into_iter()
            .filter_map(|token| {
                let call = self.registry.take(&token).ok()?;
                warn!("script {} timed out", call.script_url);
                Some((token, FetchError::Timeout))
            })
            .collect()
    }

    /// Load the script through `transport` and settle the request.
    pub fn fetch<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<Response, FetchError> {
        let script = self.begin(input, init)?;
        match transport.load(&script.script_url) {
            Ok(load) => {
                self.run_script(&load.source);
                self.script_loaded(&script.token, &load.src)
            }
            Err(FetchError::Timeout) => {
                self.registry.take(&script.token)?;
                Err(FetchError::Timeout)
            }
            Err(FetchError::NetworkError(reason)) => Err(self.script_failed(&script.token, &reason)),
            Err(e) => Err(self.script_failed(&script.token, &e.to_string())),
        }
    }
}

fn append_callback(url: &str, param: &str, callback_name: &str) -> String {
    let (base, fragment) = match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{param}={callback_name}{fragment}")
}
