//! The transport seam between the executor and an HTTP client library.
//!
//! # Design
//! A `Transport` hands out one `TransportHandle` per call. The handle owns
//! everything the call needs (options, trace buffer, connection) and
//! releases it on drop, so every exit path of the executor frees it.

use crate::error::TransportError;
use crate::option::{OptionCode, OptionValue};

/// libcurl-numbered failure codes used by the bundled transports.
pub mod codes {
    pub const URL_MALFORMAT: u32 = 3;
    pub const COULDNT_RESOLVE_HOST: u32 = 6;
    pub const COULDNT_CONNECT: u32 = 7;
    pub const WEIRD_SERVER_REPLY: u32 = 8;
    pub const READ_ERROR: u32 = 26;
    pub const OPERATION_TIMEDOUT: u32 = 28;
    pub const SSL_CONNECT_ERROR: u32 = 35;
    pub const BAD_FUNCTION_ARGUMENT: u32 = 43;
    pub const TOO_MANY_REDIRECTS: u32 = 47;
    pub const RECV_ERROR: u32 = 56;
}

/// Factory for per-call handles.
pub trait Transport {
    type Handle: TransportHandle;

    fn open(&self) -> Self::Handle;
}

/// A single-use handle configured by options and performed once.
pub trait TransportHandle {
    /// Apply one option. Codes the handle does not understand are ignored.
    fn set_option(&mut self, code: OptionCode, value: &OptionValue);

    /// Record a verbose trace of the exchange for `take_trace`.
    fn capture_trace(&mut self);

    /// Perform the call and return the transferred body.
    fn perform(&mut self) -> Result<String, TransportError>;

    /// The captured trace, if capture was enabled.
    fn take_trace(&mut self) -> Option<String>;
}

/// Verbose trace writer shared by transports.
///
/// Lines go to the capture buffer when one is enabled and to
/// `tracing::debug!` when the `Verbose` option was set.
#[derive(Debug, Default)]
pub struct TraceLog {
    buffer: Option<String>,
    echo: bool,
}

impl TraceLog {
    pub fn capture(&mut self) {
        self.buffer.get_or_insert_with(String::new);
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    pub fn is_active(&self) -> bool {
        self.echo || self.buffer.is_some()
    }

    /// Append a line with a curl-style prefix: `*` info, `>` sent, `<` received.
    pub fn line(&mut self, prefix: char, text: &str) {
        if self.echo {
            tracing::debug!(target: "send_core::wire", "{prefix} {text}");
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(prefix);
            buffer.push(' ');
            buffer.push_str(text);
            buffer.push('\n');
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.buffer.take()
    }
}
