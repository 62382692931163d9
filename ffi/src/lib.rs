//! C-ABI wrapper around `fetchp-core`.
//!
//! # Overview
//! Lets a host that executes scripts itself (a browser engine, a JS runtime
//! embedding) drive the JSONP client: `fetchp_begin` returns the script URL
//! to inject, the host forwards the callback invocation to `fetchp_deliver`
//! and reports the load or error event with `fetchp_script_loaded` /
//! `fetchp_script_failed`. Hosts that only have the script text can hand it
//! to `fetchp_run_script` instead of delivering by hand.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Settle operations return a single `FfiFetchResult` envelope carrying
//!   either a response or an error code and message.
//! - The C caller owns all returned pointers and must call the matching
//!   `fetchp_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::Instant;

use fetchp_core::{CallbackToken, ClientConfig, JsonpClient};

use types::*;

/// Borrow a C string as `&str`. Invalid UTF-8 reads as empty.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives the
/// returned reference.
unsafe fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(s) }.to_str().unwrap_or(""))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client.
///
/// `config_json` may be null for the default configuration; otherwise it is
/// a JSON object with any of `registry_path`, `callback_param`,
/// `timeout_secs`, `strict_callback` and `capabilities`.
/// Returns null if the configuration does not parse or is invalid, or an
/// internal panic occurs. The caller must free the returned pointer with
/// `fetchp_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_client_new(config_json: *const c_char) -> *mut FfiJsonpClient {
    catch_unwind(|| {
        let client = match unsafe { str_arg(config_json) } {
            None => Ok(JsonpClient::default()),
            Some(raw) => ClientConfig::from_json(raw).and_then(JsonpClient::new),
        };
        match client {
            Ok(inner) => Box::into_raw(Box::new(FfiJsonpClient { inner })),
            Err(e) => {
                log::warn!("fetchp_client_new: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `fetchp_client_new`. Safe to call with null.
/// Pending requests are dropped unsettled.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_client_free(client: *mut FfiJsonpClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Number of requests begun but not yet settled. Returns 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_client_pending(client: *const FfiJsonpClient) -> u32 {
    catch_unwind(|| {
        if client.is_null() {
            return 0;
        }
        let client = unsafe { &*client };
        client.inner.pending() as u32
    })
    .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Request lifecycle
// ---------------------------------------------------------------------------

/// Register a request for `url` and return the script load to perform.
///
/// Returns null if `client` or `url` is null.
/// The caller must free the returned pointer with
/// `fetchp_free_script_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_begin(client: *mut FfiJsonpClient, url: *const c_char) -> *mut FfiScriptRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(url) = (unsafe { str_arg(url) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &mut *client };
        match client.inner.begin(url, None) {
            Ok(script) => FfiScriptRequest::from_core(script),
            Err(e) => {
                log::warn!("fetchp_begin: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// The callback for `token` was invoked with `payload_json`.
///
/// A null `payload_json` delivers JSON `null`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_deliver(
    client: *mut FfiJsonpClient,
    token: *const c_char,
    payload_json: *const c_char,
) -> FfiErrorCode {
    catch_unwind(|| {
        if client.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(token) = (unsafe { str_arg(token) }) else {
            return FfiErrorCode::NullArg;
        };
        let payload = match unsafe { str_arg(payload_json) } {
            None => serde_json::Value::Null,
            Some(raw) => match serde_json::from_str(raw) {
                Ok(v) => v,
                Err(_) => return FfiErrorCode::InvalidJson,
            },
        };
        let client = unsafe { &mut *client };
        match client.inner.deliver(&CallbackToken::from(token), payload) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Run a loaded script body against the client's pending callbacks.
///
/// Returns true if the script called one of them back.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_run_script(client: *mut FfiJsonpClient, source: *const c_char) -> bool {
    catch_unwind(|| {
        if client.is_null() {
            return false;
        }
        let Some(source) = (unsafe { str_arg(source) }) else {
            return false;
        };
        let client = unsafe { &mut *client };
        client.inner.run_script(source).is_some()
    })
    .unwrap_or(false)
}

/// The script for `token` loaded from `src`; settle the request.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_script_loaded(
    client: *mut FfiJsonpClient,
    token: *const c_char,
    src: *const c_char,
) -> *mut FfiFetchResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiFetchResult::null_arg("client");
        }
        let Some(token) = (unsafe { str_arg(token) }) else {
            return FfiFetchResult::null_arg("token");
        };
        let Some(src) = (unsafe { str_arg(src) }) else {
            return FfiFetchResult::null_arg("src");
        };
        let client = unsafe { &mut *client };
        match client.inner.script_loaded(&CallbackToken::from(token), src) {
            Ok(resp) => FfiFetchResult::ok(resp),
            Err(e) => FfiFetchResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in fetchp_script_loaded"))
}

/// The script for `token` failed to load; settle with a network error.
///
/// `reason` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_script_failed(
    client: *mut FfiJsonpClient,
    token: *const c_char,
    reason: *const c_char,
) -> *mut FfiFetchResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiFetchResult::null_arg("client");
        }
        let Some(token) = (unsafe { str_arg(token) }) else {
            return FfiFetchResult::null_arg("token");
        };
        let reason = unsafe { str_arg(reason) }.unwrap_or("script load failed");
        let client = unsafe { &mut *client };
        FfiFetchResult::from_error(client.inner.script_failed(&CallbackToken::from(token), reason))
    })
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in fetchp_script_failed"))
}

/// Drop the pending request for `token` without settling it.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_cancel(client: *mut FfiJsonpClient, token: *const c_char) -> FfiErrorCode {
    catch_unwind(|| {
        if client.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(token) = (unsafe { str_arg(token) }) else {
            return FfiErrorCode::NullArg;
        };
        let client = unsafe { &mut *client };
        match client.inner.cancel(&CallbackToken::from(token)) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Settle every request older than the configured `timeout_secs` with
/// `Timeout`, dropping its registry entry.
///
/// Returns how many requests expired; 0 for null or when no timeout is
/// configured. Later settle calls for those tokens report `UnknownCallback`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_expire(client: *mut FfiJsonpClient) -> u32 {
    catch_unwind(|| {
        if client.is_null() {
            return 0;
        }
        let client = unsafe { &mut *client };
        let expired = client.inner.expire(Instant::now());
        for (token, err) in &expired {
            log::debug!("fetchp_expire: {token}: {err}");
        }
        expired.len() as u32
    })
    .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiScriptRequest` returned by `fetchp_begin`. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_free_script_request(script: *mut FfiScriptRequest) {
    if script.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let script = unsafe { Box::from_raw(script) };
        free_c_string(script.token);
        free_c_string(script.callback_name);
        free_c_string(script.script_url);
    });
}

/// Free an `FfiFetchResult` returned by a settle function. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.response.is_null() {
            let resp = unsafe { Box::from_raw(result.response) };
            free_c_string(resp.status_text);
            free_c_string(resp.url);
            free_c_string(resp.body_json);
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchp_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
