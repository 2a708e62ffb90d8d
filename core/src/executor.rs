//! One-shot request execution.
//!
//! # Design
//! `Executor::execute` validates and translates the description before it
//! opens a transport handle, so invalid input never reaches the network.
//! The handle is a local value: it is dropped on every return path, which
//! releases the connection and the trace buffer.

use crate::error::SendError;
use crate::request::RequestDescription;
use crate::transport::{Transport, TransportHandle};
use crate::translate::translate;
use crate::ureq_transport::UreqTransport;

/// Runs request descriptions against a transport, one call at a time.
#[derive(Debug, Clone)]
pub struct Executor<T> {
    transport: T,
    capture_trace: bool,
}

impl<T: Transport> Executor<T> {
    /// Trace capture is on by default.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            capture_trace: true,
        }
    }

    /// Whether transport failures carry a verbose trace of the attempt.
    pub fn capture_trace(mut self, enabled: bool) -> Self {
        self.capture_trace = enabled;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `request` and return the response body.
    ///
    /// HTTP error statuses are successful transfers; only an invalid
    /// description or a transport failure produce `Err`.
    pub fn execute(&self, request: &RequestDescription) -> Result<String, SendError> {
        let options = translate(request)?;

        let mut handle = self.transport.open();
        if self.capture_trace {
            handle.capture_trace();
        }
        for (code, value) in options.iter() {
            handle.set_option(code, value);
        }

        tracing::debug!(options = options.len(), "performing request");
        match handle.perform() {
            Ok(body) => {
                tracing::debug!(bytes = body.len(), "request completed");
                Ok(body)
            }
            Err(mut err) => {
                err.trace = handle.take_trace();
                tracing::debug!(code = err.code, message = %err.message, "request failed");
                Err(err.into())
            }
        }
    }
}

impl Default for Executor<UreqTransport> {
    fn default() -> Self {
        Self::new(UreqTransport)
    }
}
