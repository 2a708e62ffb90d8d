//! C-ABI wrapper around `send-core`.
//!
//! # Overview
//! Exposes request execution to any language with a C FFI. A request is
//! passed as a JSON object (`{"url": "...", "method": "POST", "10018":
//! "agent"}`); numeric keys are raw transport codes.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `send_request` keeps the classic out-parameter contract: it returns
//!   the body or null, and fills `*error_out` with a diagnostic only for
//!   transport failures. Invalid requests leave `*error_out` untouched.
//! - `send_execute` returns an `FfiSendResult` envelope instead, with a
//!   status tag for every failure class.
//! - The C caller owns all returned pointers and must release them with
//!   `send_free_string` / `send_free_result`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use send_core::{Executor, InvalidRequest, RequestDescription, SendError, UreqTransport};

use types::*;

/// Decode the JSON request at `ptr`. Null, non-UTF-8 and malformed input
/// are all invalid requests.
fn read_request(ptr: *const c_char) -> Result<RequestDescription, InvalidRequest> {
    if ptr.is_null() {
        return Err(InvalidRequest::Malformed("null request".to_string()));
    }
    let json = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| InvalidRequest::Malformed(e.to_string()))?;
    RequestDescription::from_json(json)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Perform the request described by `request_json`.
///
/// Returns the response body, or null if the request is invalid or the
/// transport failed. If `error_out` is non-null, a verbose trace is
/// captured and, on transport failure, `*error_out` receives a diagnostic
/// string. HTTP error statuses are returned as bodies.
///
/// The caller must free the returned body and any `*error_out` string with
/// `send_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn send_request(
    request_json: *const c_char,
    error_out: *mut *mut c_char,
) -> *mut c_char {
    catch_unwind(|| {
        let request = match read_request(request_json) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(%err, "rejecting request");
                return std::ptr::null_mut();
            }
        };
        let executor = Executor::new(UreqTransport).capture_trace(!error_out.is_null());
        match executor.execute(&request) {
            Ok(body) => into_c_string(body),
            Err(SendError::Transport(failure)) => {
                if !error_out.is_null() {
                    unsafe { *error_out = into_c_string(failure.diagnostic()) };
                }
                std::ptr::null_mut()
            }
            Err(SendError::Invalid(err)) => {
                tracing::debug!(%err, "rejecting request");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Perform the request described by `request_json` and report the outcome
/// in an `FfiSendResult`.
///
/// The caller must free the returned pointer with `send_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn send_execute(request_json: *const c_char) -> *mut FfiSendResult {
    catch_unwind(|| {
        if request_json.is_null() {
            return FfiSendResult::null_arg("request_json");
        }
        let request = match read_request(request_json) {
            Ok(request) => request,
            Err(err) => return FfiSendResult::from_error(err.into()),
        };
        match Executor::new(UreqTransport).execute(&request) {
            Ok(body) => FfiSendResult::ok(body),
            Err(err) => FfiSendResult::from_error(err),
        }
    })
    .unwrap_or_else(|_| FfiSendResult::panic("panic in send_execute"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiSendResult` returned by `send_execute`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn send_free_result(result: *mut FfiSendResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.body.is_null() {
            drop(unsafe { CString::from_raw(result.body) });
        }
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn send_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn start_server() -> SocketAddr {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    }

    fn closed_addr() -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    fn request_json(url: &str) -> CString {
        CString::new(format!(r#"{{"url":"{url}"}}"#)).unwrap()
    }

    fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        send_free_string(ptr);
        s
    }

    #[test]
    fn send_request_returns_body() {
        let addr = start_server();
        let json = request_json(&format!("http://{addr}/ok"));
        let mut error: *mut c_char = std::ptr::null_mut();
        let body = send_request(json.as_ptr(), &mut error);
        assert_eq!(take_string(body), "OK");
        assert!(error.is_null());
    }

    #[test]
    fn send_request_null_json_returns_null() {
        let body = send_request(std::ptr::null(), std::ptr::null_mut());
        assert!(body.is_null());
    }

    #[test]
    fn send_request_missing_url_leaves_error_untouched() {
        let json = CString::new(r#"{"method":"GET"}"#).unwrap();
        let mut error: *mut c_char = std::ptr::null_mut();
        let body = send_request(json.as_ptr(), &mut error);
        assert!(body.is_null());
        assert!(error.is_null());
    }

    #[test]
    fn send_request_malformed_json_returns_null() {
        let json = CString::new("{not json").unwrap();
        let mut error: *mut c_char = std::ptr::null_mut();
        assert!(send_request(json.as_ptr(), &mut error).is_null());
        assert!(error.is_null());
    }

    #[test]
    fn send_request_transport_failure_fills_error() {
        let json = request_json(&format!("http://{}/ok", closed_addr()));
        let mut error: *mut c_char = std::ptr::null_mut();
        let body = send_request(json.as_ptr(), &mut error);
        assert!(body.is_null());
        let diagnostic = take_string(error);
        assert!(diagnostic.starts_with("curl error (7): "), "{diagnostic}");
        assert!(diagnostic.contains("Verbose information:"), "{diagnostic}");
    }

    #[test]
    fn send_request_without_error_slot_still_returns_null() {
        let json = request_json(&format!("http://{}/ok", closed_addr()));
        assert!(send_request(json.as_ptr(), std::ptr::null_mut()).is_null());
    }

    #[test]
    fn send_execute_ok() {
        let addr = start_server();
        let json = request_json(&format!("http://{addr}/status/503"));
        let result = send_execute(json.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiSendStatus::Ok);
        assert!(r.error_message.is_null());
        let body = unsafe { CStr::from_ptr(r.body) }.to_str().unwrap();
        assert_eq!(body, "status 503");
        send_free_result(result);
    }

    #[test]
    fn send_execute_post_reaches_server() {
        let addr = start_server();
        let json = CString::new(format!(
            r#"{{"url":"http://{addr}/echo","method":"POST","data":"a=1"}}"#
        ))
        .unwrap();
        let result = send_execute(json.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiSendStatus::Ok);
        let body_str = unsafe { CStr::from_ptr(r.body) }.to_str().unwrap();
        let body: serde_json::Value = serde_json::from_str(body_str).unwrap();
        assert_eq!(body["method"], "POST");
        assert_eq!(body["body"], "a=1");
        send_free_result(result);
    }

    #[test]
    fn send_execute_invalid_request() {
        let json = CString::new(r#"{"url":"http://example.test","method":"TRACE"}"#).unwrap();
        let result = send_execute(json.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiSendStatus::InvalidRequest);
        assert!(r.body.is_null());
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(msg.contains("unsupported method"), "{msg}");
        send_free_result(result);
    }

    #[test]
    fn send_execute_transport_failure() {
        let json = request_json(&format!("http://{}/ok", closed_addr()));
        let result = send_execute(json.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiSendStatus::Transport);
        assert_eq!(r.transport_code, 7);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(msg.starts_with("curl error (7): "), "{msg}");
        send_free_result(result);
    }

    #[test]
    fn send_execute_null_returns_null_arg() {
        let result = send_execute(std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiSendStatus::NullArg);
        send_free_result(result);
    }

    #[test]
    fn free_result_null_is_safe() {
        send_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        send_free_string(std::ptr::null_mut());
    }
}
