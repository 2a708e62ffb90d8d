//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! `FfiSendResult` is the structured envelope returned by `send_execute`:
//! a status tag, the transport's error code, and two owned C strings. The
//! conversion from `SendError` lives here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use send_core::SendError;

/// Outcome category of a request.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSendStatus {
    Ok = 0,
    InvalidRequest = 1,
    Transport = 2,
    NullArg = 3,
    Panic = 4,
}

/// Result envelope for `send_execute`.
///
/// On success `status` is `Ok`, `body` holds the response body and
/// `error_message` is null. On failure `body` is null and `error_message`
/// describes the problem; for `Transport` failures it is the full
/// diagnostic and `transport_code` holds the libcurl-numbered code.
#[repr(C)]
pub struct FfiSendResult {
    pub status: FfiSendStatus,
    pub transport_code: u32,
    pub body: *mut c_char,
    pub error_message: *mut c_char,
}

impl FfiSendResult {
    pub(crate) fn ok(body: String) -> *mut Self {
        Self::boxed(FfiSendResult {
            status: FfiSendStatus::Ok,
            transport_code: 0,
            body: into_c_string(body),
            error_message: std::ptr::null_mut(),
        })
    }

    pub(crate) fn from_error(err: SendError) -> *mut Self {
        let (status, transport_code, message) = match &err {
            SendError::Invalid(_) => (FfiSendStatus::InvalidRequest, 0, err.to_string()),
            SendError::Transport(failure) => {
                (FfiSendStatus::Transport, failure.code, failure.diagnostic())
            }
        };
        Self::boxed(FfiSendResult {
            status,
            transport_code,
            body: std::ptr::null_mut(),
            error_message: into_c_string(message),
        })
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiSendStatus::NullArg, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiSendStatus::Panic, msg.to_string())
    }

    fn failure(status: FfiSendStatus, message: String) -> *mut Self {
        Self::boxed(FfiSendResult {
            status,
            transport_code: 0,
            body: std::ptr::null_mut(),
            error_message: into_c_string(message),
        })
    }

    fn boxed(result: FfiSendResult) -> *mut Self {
        Box::into_raw(Box::new(result))
    }
}

/// Hand a Rust string to C. Interior NUL bytes are dropped, since a C
/// string cannot carry them.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let c_string = CString::new(s).unwrap_or_else(|err| {
        let mut bytes = err.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c_string.into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn into_c_string_strips_interior_nul() {
        let ptr = into_c_string("a\0b".to_string());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        drop(unsafe { CString::from_raw(ptr) });
        assert_eq!(s, "ab");
    }
}
