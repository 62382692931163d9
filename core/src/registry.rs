//! Per-client table of pending script callbacks.
//!
//! Each in-flight request owns one entry keyed by a random token. The entry
//! captures the payload handed to the callback and is removed when the
//! request settles, so the table only ever holds live requests.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::Rng;
use serde_json::Value;

use crate::error::FetchError;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 9;

/// Identifier correlating a script load with its callback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackToken(String);

impl CallbackToken {
    /// `_` followed by nine random base-36 characters.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut token = String::with_capacity(TOKEN_LEN + 1);
        token.push('_');
        for _ in 0..TOKEN_LEN {
            let idx = rng.random_range(0..TOKEN_ALPHABET.len());
            token.push(TOKEN_ALPHABET[idx] as char);
        }
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallbackToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// State captured for one in-flight request.
#[derive(Debug)]
pub struct PendingCall {
    pub script_url: String,
    pub payload: Option<Value>,
    pub started: Instant,
}

/// Pending callbacks addressed as `<path>.<token>`.
#[derive(Debug)]
pub struct CallbackRegistry {
    path: String,
    pending: HashMap<CallbackToken, PendingCall>,
}

impl CallbackRegistry {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.trim_end_matches('.').to_string(),
            pending: HashMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reserve a fresh token and record the script URL built from its
    /// callback name. Tokens never collide with a pending entry.
    pub fn register(
        &mut self,
        script_url: impl FnOnce(&str) -> String,
        now: Instant,
    ) -> (CallbackToken, String) {
        let mut token = CallbackToken::generate();
        while self.pending.contains_key(&token) {
            warn!("callback token {token} collided, regenerating");
            token = CallbackToken::generate();
        }
        let script_url = script_url(&self.callback_name(&token));
        debug!("registered callback {token} for {script_url}");
        self.pending.insert(
            token.clone(),
            PendingCall {
                script_url: script_url.clone(),
                payload: None,
                started: now,
            },
        );
        (token, script_url)
    }

    /// Fully qualified name the remote script must call.
    pub fn callback_name(&self, token: &CallbackToken) -> String {
        format!("{}.{}", self.path, token)
    }

    /// Map a fully qualified callback name back to its pending token.
    pub fn lookup(&self, callback_name: &str) -> Option<CallbackToken> {
        let token = callback_name
            .strip_prefix(self.path.as_str())?
            .strip_prefix('.')?;
        let token = CallbackToken::from(token);
        self.pending.contains_key(&token).then_some(token)
    }

    pub fn get(&self, token: &CallbackToken) -> Option<&PendingCall> {
        self.pending.get(token)
    }

    /// Record the payload handed to the callback. Only the first call counts.
    pub fn deliver(&mut self, token: &CallbackToken, payload: Value) -> Result<(), FetchError> {
        let call = self
            .pending
            .get_mut(token)
            .ok_or_else(|| FetchError::UnknownCallback(token.to_string()))?;
        if call.payload.is_some() {
            warn!("callback {token} invoked more than once, keeping first payload");
            return Ok(());
        }
        debug!("callback {token} invoked");
        call.payload = Some(payload);
        Ok(())
    }

    /// Remove and return the entry for `token`, settling it.
    pub fn take(&mut self, token: &CallbackToken) -> Result<PendingCall, FetchError> {
        self.pending
            .remove(token)
            .ok_or_else(|| FetchError::UnknownCallback(token.to_string()))
    }

    /// Tokens whose entries are older than `timeout` at `now`.
    pub fn expired(&self, now: Instant, timeout: Duration) -> Vec<CallbackToken> {
        self.pending
            .iter()
            .filter(|(_, call)| now.saturating_duration_since(call.started) >= timeout)
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
