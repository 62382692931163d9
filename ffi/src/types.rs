//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, and tagged enums with explicit
//! discriminants. Conversion functions live here to keep `lib.rs` focused on
//! the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use fetchp_core::{FetchError, ReadBody, Response, ScriptRequest};

/// Opaque handle to a `JsonpClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiJsonpClient {
    pub(crate) inner: fetchp_core::JsonpClient,
}

/// Build a C string, replacing interior NULs so conversion cannot fail.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', "\u{FFFD}"))
        .unwrap_or_default()
        .into_raw()
}

// ---------------------------------------------------------------------------
// Script request
// ---------------------------------------------------------------------------

/// A registered script load the host must perform.
///
/// The host inserts a script element with `script_url` as its source.
/// Running the script calls `callback_name`, which the host forwards to
/// `fetchp_deliver` with `token`; the load or error event is reported with
/// `fetchp_script_loaded` / `fetchp_script_failed`.
#[repr(C)]
pub struct FfiScriptRequest {
    pub token: *mut c_char,
    pub callback_name: *mut c_char,
    pub script_url: *mut c_char,
}

impl FfiScriptRequest {
    pub(crate) fn from_core(script: ScriptRequest) -> *mut Self {
        Box::into_raw(Box::new(FfiScriptRequest {
            token: c_string(script.token.as_str()),
            callback_name: c_string(script.callback_name),
            script_url: c_string(script.script_url),
        }))
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned by FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidHeaderName = 1,
    UnsupportedBody = 2,
    UnsupportedMethod = 3,
    AlreadyRead = 4,
    UnsupportedBodyRead = 5,
    CapabilityUnavailable = 6,
    Network = 7,
    UnknownCallback = 8,
    CallbackNotInvoked = 9,
    Timeout = 10,
    Config = 11,
    InvalidJson = 12,
    Panic = 13,
    NullArg = 14,
}

impl From<&FetchError> for FfiErrorCode {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::InvalidHeaderName(_) => FfiErrorCode::InvalidHeaderName,
            FetchError::UnsupportedBody => FfiErrorCode::UnsupportedBody,
            FetchError::UnsupportedMethod(_) => FfiErrorCode::UnsupportedMethod,
            FetchError::AlreadyRead => FfiErrorCode::AlreadyRead,
            FetchError::UnsupportedBodyRead { .. } => FfiErrorCode::UnsupportedBodyRead,
            FetchError::CapabilityUnavailable(_) => FfiErrorCode::CapabilityUnavailable,
            FetchError::NetworkError(_) => FfiErrorCode::Network,
            FetchError::UnknownCallback(_) => FfiErrorCode::UnknownCallback,
            FetchError::CallbackNotInvoked => FfiErrorCode::CallbackNotInvoked,
            FetchError::Timeout => FfiErrorCode::Timeout,
            FetchError::Config(_) => FfiErrorCode::Config,
        }
    }
}

/// A settled response exposed to C.
///
/// `body_json` is the callback payload serialized as JSON, or null when the
/// script never called back.
#[repr(C)]
pub struct FfiResponse {
    pub status: u16,
    pub ok: bool,
    pub status_text: *mut c_char,
    pub url: *mut c_char,
    pub body_json: *mut c_char,
}

/// Result envelope for settle operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `response`
/// points to the settled response. On failure `error_code` describes the
/// category, `error_message` is a human-readable C string and `response` is
/// null.
#[repr(C)]
pub struct FfiFetchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub response: *mut FfiResponse,
}

impl FfiFetchResult {
    pub(crate) fn ok(resp: Response) -> *mut Self {
        let body_json = match resp.json() {
            Some(v) => c_string(v.to_string()),
            None => std::ptr::null_mut(),
        };
        let ffi_resp = Box::new(FfiResponse {
            status: resp.status(),
            ok: resp.ok(),
            status_text: c_string(resp.status_text()),
            url: c_string(resp.url()),
            body_json,
        });
        Box::into_raw(Box::new(FfiFetchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            response: Box::into_raw(ffi_resp),
        }))
    }

    pub(crate) fn from_error(err: FetchError) -> *mut Self {
        Self::error(FfiErrorCode::from(&err), &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }

    fn error(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiFetchResult {
            error_code,
            error_message: c_string(msg),
            response: std::ptr::null_mut(),
        }))
    }
}
