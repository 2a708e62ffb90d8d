//! Error types for the request executor.
//!
//! # Design
//! Two failure classes exist. `InvalidRequest` is decided before any
//! network activity; `TransportError` carries what the transport reported
//! plus, when captured, the wire trace of the attempt. HTTP error statuses
//! are not errors here: a 404 body is a successful transfer.

use std::borrow::Cow;

/// Errors returned by `Executor::execute`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("invalid request: {0}")]
    Invalid(#[from] InvalidRequest),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SendError {
    /// The transport failure, if that is what this is.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            SendError::Transport(e) => Some(e),
            SendError::Invalid(_) => None,
        }
    }
}

/// Reasons a request description is rejected before a handle is opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("missing `url` option")]
    MissingUrl,

    #[error("unsupported method {0}")]
    UnsupportedMethod(String),

    /// The serialized description could not be decoded.
    #[error("malformed request description: {0}")]
    Malformed(String),
}

/// A failure reported by the transport while performing the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("curl error ({code}): {message}")]
pub struct TransportError {
    /// libcurl-numbered error code.
    pub code: u32,
    pub message: String,
    /// Verbose trace of the attempt; `None` when capture was off.
    pub trace: Option<String>,
}

impl TransportError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace: None,
        }
    }

    /// Render the composite diagnostic: code, escaped message, and the
    /// escaped verbose trace.
    pub fn diagnostic(&self) -> String {
        let trace = self.trace.as_deref().unwrap_or("");
        format!(
            "curl error ({}): {}\n\nVerbose information:\n{}\n",
            self.code,
            escape_html(&self.message),
            escape_html(trace)
        )
    }
}

/// Escape `& < > " '` for embedding in HTML.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
