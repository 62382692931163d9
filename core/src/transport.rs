//! Script loading.
//!
//! # Design
//! The client never touches the network itself. A `Transport` loads the
//! script at a URL and hands its source back; the client then runs the
//! script through its callback registry. `UreqTransport` does this over
//! blocking HTTP. A host that executes scripts natively skips the trait and
//! drives `JsonpClient::begin` / `deliver` / `script_loaded` itself.
//!
//! Like a browser script element, the HTTP transport only reports load
//! success or failure: any response with a readable body counts as loaded,
//! whatever its status code.

use std::time::Duration;

use log::debug;

use crate::client::{FetchInput, JsonpClient};
use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::request::RequestInit;
use crate::response::Response;

/// Result of loading one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLoad {
    /// Resolved source URL of the script.
    pub src: String,
    /// Script body as served.
    pub source: String,
}

/// Something that can load a script by URL.
pub trait Transport {
    fn load(&self, script_url: &str) -> Result<ScriptLoad, FetchError>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> Result<ScriptLoad, FetchError>,
{
    fn load(&self, script_url: &str) -> Result<ScriptLoad, FetchError> {
        self(script_url)
    }
}

/// Blocking HTTP script loader.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Transport honouring the client's configured timeout.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout())
    }

    /// Load through an existing agent, keeping its configuration except for
    /// status handling: script bodies are read whatever the status.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn load(&self, script_url: &str) -> Result<ScriptLoad, FetchError> {
        let mut response = self
            .agent
            .get(script_url)
            .config()
            .http_status_as_error(false)
            .build()
            .call()
            .map_err(transport_error)?;
        debug!("script {script_url} answered {}", response.status());
        let source = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;
        Ok(ScriptLoad {
            src: script_url.to_string(),
            source,
        })
    }
}

fn transport_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Timeout(_) => FetchError::Timeout,
        other => FetchError::NetworkError(other.to_string()),
    }
}

/// `fetch_jsonp` on the ambient HTTP client.
pub trait FetchJsonp {
    fn fetch_jsonp(
        &self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<Response, FetchError>;
}

impl FetchJsonp for ureq::Agent {
    /// One-off script fetch with a default client. Like `fetch`, a script
    /// served under an error status still resolves.
    fn fetch_jsonp(
        &self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<Response, FetchError> {
        let transport = UreqTransport::from_agent(self.clone());
        JsonpClient::default().fetch(&transport, input, init)
    }
}
