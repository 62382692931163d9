//! Error types for the JSONP client.
//!
//! # Design
//! Every failure the fetch surface can produce lands in one `FetchError`.
//! Header and request construction fail at the call site; body reads and
//! script settlement hand the error back as a value so the caller decides
//! what to do with it. Nothing here is retried.

use thiserror::Error;

/// Errors returned by `Headers`, `Request`, `Body` and `JsonpClient`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A header field name contains a character outside the token grammar.
    #[error("invalid character in header field name: {0:?}")]
    InvalidHeaderName(String),

    /// A body was supplied for a GET request.
    #[error("body not allowed for GET or HEAD requests")]
    UnsupportedBody,

    /// The request init asked for a method other than GET.
    #[error("method {0} is not supported by script transport")]
    UnsupportedMethod(String),

    /// The body has already been consumed by an earlier read.
    #[error("already read")]
    AlreadyRead,

    /// The stored body kind cannot be materialized by this reader.
    #[error("could not read {stored} body as {read}")]
    UnsupportedBodyRead {
        read: &'static str,
        stored: &'static str,
    },

    /// The reader is outside the body's capability set.
    #[error("{0} bodies are not supported in this environment")]
    CapabilityUnavailable(&'static str),

    /// The script failed to load.
    #[error("network request failed: {0}")]
    NetworkError(String),

    /// No pending call is registered under this token.
    #[error("no pending callback for token {0}")]
    UnknownCallback(String),

    /// The script loaded but never invoked its callback (strict mode only).
    #[error("script loaded without invoking its callback")]
    CallbackNotInvoked,

    /// The pending call outlived the configured timeout.
    #[error("script request timed out")]
    Timeout,

    /// The client configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
