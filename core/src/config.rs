//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::body::Capabilities;
use crate::error::FetchError;
use crate::script::is_callee_path;

pub const DEFAULT_REGISTRY_PATH: &str = "fetchp._callbacks";
pub const DEFAULT_CALLBACK_PARAM: &str = "callback";

/// Settings for a `JsonpClient`. Every field has a default, so a partial
/// JSON document is enough.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Dotted prefix under which callbacks are addressed in the script.
    pub registry_path: String,
    /// Query parameter carrying the callback name.
    pub callback_param: String,
    /// Seconds before a pending call is settled with `Timeout`.
    pub timeout_secs: Option<u64>,
    /// Treat a script that never calls back as an error instead of an
    /// empty body.
    pub strict_callback: bool,
    /// Readers available on response bodies.
    pub capabilities: Capabilities,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            registry_path: DEFAULT_REGISTRY_PATH.to_string(),
            callback_param: DEFAULT_CALLBACK_PARAM.to_string(),
            timeout_secs: None,
            strict_callback: false,
            capabilities: Capabilities::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, FetchError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| FetchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce callback names no script can call.
    pub fn validate(&self) -> Result<(), FetchError> {
        if !is_callee_path(self.registry_path.trim_end_matches('.')) {
            return Err(FetchError::Config(format!(
                "registry_path {:?} is not a dotted identifier",
                self.registry_path
            )));
        }
        if self.callback_param.is_empty() {
            return Err(FetchError::Config("callback_param is empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.registry_path, "fetchp._callbacks");
        assert_eq!(config.callback_param, "callback");
        assert!(config.timeout().is_none());
        assert!(!config.strict_callback);
        assert!(config.capabilities.blob);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ClientConfig::from_json(
            r#"{"timeout_secs": 5, "capabilities": {"blob": false}}"#,
        )
        .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert!(!config.capabilities.blob);
        assert!(config.capabilities.form_data);
        assert_eq!(config.registry_path, DEFAULT_REGISTRY_PATH);
    }

    #[test]
    fn registry_path_must_be_dotted_identifier() {
        for path in ["", "my-app.cb", "app..cb", "1app"] {
            let raw = format!(r#"{{"registry_path": {path:?}}}"#);
            let err = ClientConfig::from_json(&raw).unwrap_err();
            assert!(matches!(err, FetchError::Config(_)), "{path:?}");
        }
        assert!(ClientConfig::from_json(r#"{"registry_path": "$app.jsonp_cb"}"#).is_ok());
    }

    #[test]
    fn empty_callback_param_is_rejected() {
        let err = ClientConfig::from_json(r#"{"callback_param": ""}"#).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn bad_json_is_config_error() {
        let err = ClientConfig::from_json("{").unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
