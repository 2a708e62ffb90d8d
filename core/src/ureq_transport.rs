//! `Transport` implementation on top of ureq.
//!
//! # Design
//! Each handle builds its own `ureq::Agent`, so nothing is pooled or shared
//! between calls. Options are collected by `set_option` and only turned
//! into a request in `perform`. ureq is configured to return 4xx/5xx
//! responses as data; only transport failures become errors.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ureq::http::{Response, Version};
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;
use crate::http::split_header;
use crate::option::{OptionCode, OptionValue, TransportOption};
use crate::transport::{codes, TraceLog, Transport, TransportHandle};

/// Blocking transport backed by ureq.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    type Handle = UreqHandle;

    fn open(&self) -> UreqHandle {
        UreqHandle::default()
    }
}

/// Request body as the handle will send it.
#[derive(Debug)]
enum Payload {
    Bytes(Vec<u8>),
    Form(Vec<(String, String)>),
}

/// One configured call. Dropping it releases the agent and trace buffer.
#[derive(Debug, Default)]
pub struct UreqHandle {
    url: Option<OptionValue>,
    custom_method: Option<String>,
    /// Method implied by the last of `Post`, `Put`, `HttpGet`, `PostFields`.
    implied_method: Option<&'static str>,
    post_fields: Option<OptionValue>,
    headers: Vec<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    in_file: Option<PathBuf>,
    in_file_size: Option<u64>,
    no_body: bool,
    include_headers: bool,
    trace: TraceLog,
}

impl TransportHandle for UreqHandle {
    fn set_option(&mut self, code: OptionCode, value: &OptionValue) {
        let Some(option) = TransportOption::from_code(code) else {
            tracing::debug!(%code, "ureq transport ignores option");
            return;
        };
        match option {
            TransportOption::Url => self.url = Some(value.clone()),
            TransportOption::CustomRequest => {
                self.custom_method = value.as_text().map(str::to_string);
            }
            TransportOption::Post => self.imply_method(value.as_flag(), "POST"),
            TransportOption::Put => self.imply_method(value.as_flag(), "PUT"),
            TransportOption::HttpGet => self.imply_method(value.as_flag(), "GET"),
            TransportOption::PostFields => {
                self.post_fields = Some(value.clone());
                self.implied_method = Some("POST");
            }
            TransportOption::Timeout => {
                self.timeout = duration(value, Duration::from_secs);
            }
            TransportOption::TimeoutMs => {
                self.timeout = duration(value, Duration::from_millis);
            }
            TransportOption::ConnectTimeout => {
                self.connect_timeout = duration(value, Duration::from_secs);
            }
            TransportOption::ConnectTimeoutMs => {
                self.connect_timeout = duration(value, Duration::from_millis);
            }
            TransportOption::HttpHeader => {
                self.headers = value.as_list().into_iter().map(str::to_string).collect();
            }
            TransportOption::UserAgent => {
                self.user_agent = value.as_text().map(str::to_string);
            }
            TransportOption::InFile => self.in_file = value.as_text().map(PathBuf::from),
            TransportOption::InFileSize => self.in_file_size = value.as_u64(),
            TransportOption::NoBody => self.no_body = value.as_flag(),
            TransportOption::Header => self.include_headers = value.as_flag(),
            TransportOption::Verbose => self.trace.set_echo(value.as_flag()),
            // The body is always returned to the caller.
            TransportOption::ReturnTransfer => {}
        }
    }

    fn capture_trace(&mut self) {
        self.trace.capture();
    }

    fn perform(&mut self) -> Result<String, TransportError> {
        let url = match self.url.clone() {
            Some(OptionValue::Text(url)) => url,
            Some(other) => {
                return Err(self.fail(TransportError::new(
                    codes::URL_MALFORMAT,
                    format!("URL must be a string, got {other:?}"),
                )))
            }
            None => {
                return Err(self.fail(TransportError::new(codes::URL_MALFORMAT, "no URL set")))
            }
        };
        let method = self.effective_method();
        let payload = match self.payload(&method) {
            Ok(payload) => payload,
            Err(err) => return Err(self.fail(err)),
        };
        let headers = self.header_pairs(&payload);

        self.trace.line('*', &format!("Sending request to {url}"));
        if self.trace.is_active() {
            self.trace.line('>', &format!("{method} {url} HTTP/1.1"));
            for (name, value) in &headers {
                self.trace.line('>', &format!("{name}: {value}"));
            }
            if let Some(len) = payload_len(&payload) {
                self.trace.line('*', &format!("upload of {len} bytes"));
            }
        }

        let agent = self.agent();
        match dispatch(&agent, &method, &url, &headers, payload) {
            Ok(mut response) => self.read_response(&mut response),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn take_trace(&mut self) -> Option<String> {
        self.trace.take()
    }
}

impl UreqHandle {
    fn imply_method(&mut self, enabled: bool, method: &'static str) {
        if enabled {
            self.implied_method = Some(method);
        }
    }

    /// `CustomRequest` wins, then the last implied method, then `GET`. A
    /// body-less `GET` goes out as `HEAD`.
    fn effective_method(&self) -> String {
        let method = self
            .custom_method
            .clone()
            .unwrap_or_else(|| self.implied_method.unwrap_or("GET").to_string());
        if self.no_body && method == "GET" {
            return "HEAD".to_string();
        }
        method
    }

    fn payload(&self, method: &str) -> Result<Option<Payload>, TransportError> {
        if !matches!(method, "POST" | "PUT" | "PATCH") {
            if self.post_fields.is_some() || self.in_file.is_some() {
                tracing::warn!(method, "request body dropped for body-less method");
            }
            return Ok(None);
        }
        let prefer_file = method == "PUT" || self.post_fields.is_none();
        if let (true, Some(path)) = (prefer_file, &self.in_file) {
            return read_upload(path, self.in_file_size).map(|bytes| Some(Payload::Bytes(bytes)));
        }
        let payload = match &self.post_fields {
            None => None,
            Some(OptionValue::Text(body)) => Some(Payload::Bytes(body.clone().into_bytes())),
            Some(OptionValue::Integer(n)) => Some(Payload::Bytes(n.to_string().into_bytes())),
            Some(OptionValue::Form(fields)) => Some(Payload::Form(
                fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
            Some(other) => {
                tracing::warn!(value = ?other, "unsupported request body value");
                None
            }
        };
        Ok(payload)
    }

    /// Caller headers, then `User-Agent` and a default form content type
    /// for raw bodies, unless the caller already set them.
    fn header_pairs(&self, payload: &Option<Payload>) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(self.headers.len() + 2);
        for line in &self.headers {
            match split_header(line) {
                Some((name, value)) => pairs.push((name.to_string(), value.to_string())),
                None => tracing::warn!(header = %line, "skipping malformed header"),
            }
        }
        let has = |pairs: &[(String, String)], name: &str| {
            pairs.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
        };
        if let Some(agent) = &self.user_agent {
            if !has(&pairs, "user-agent") {
                pairs.push(("User-Agent".to_string(), agent.clone()));
            }
        }
        let raw_post_body = self.post_fields.is_some() && matches!(payload, Some(Payload::Bytes(_)));
        if raw_post_body && self.in_file.is_none() && !has(&pairs, "content-type") {
            pairs.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
        }
        pairs
    }

    fn agent(&self) -> Agent {
        Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout)
            .timeout_connect(self.connect_timeout)
            .build()
            .new_agent()
    }

    fn read_response(&mut self, response: &mut Response<Body>) -> Result<String, TransportError> {
        let status = response.status();
        let status_line = format!(
            "{} {} {}",
            version_str(response.version()),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        let header_lines: Vec<String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                format!("{name}: {}", String::from_utf8_lossy(value.as_bytes()))
            })
            .collect();

        self.trace.line('<', status_line.trim_end());
        for line in &header_lines {
            self.trace.line('<', line);
        }

        let mut out = String::new();
        if self.include_headers {
            out.push_str(status_line.trim_end());
            out.push_str("\r\n");
            for line in &header_lines {
                out.push_str(line);
                out.push_str("\r\n");
            }
            out.push_str("\r\n");
        }
        if !self.no_body {
            let read = response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_vec();
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(err) => return Err(self.fail(map_error(&err))),
            };
            self.trace.line('*', &format!("received {} bytes", bytes.len()));
            out.push_str(&String::from_utf8_lossy(&bytes));
        }
        Ok(out)
    }

    fn fail(&mut self, err: TransportError) -> TransportError {
        self.trace.line('*', &err.message);
        err
    }
}

fn dispatch(
    agent: &Agent,
    method: &str,
    url: &str,
    headers: &[(String, String)],
    payload: Option<Payload>,
) -> Result<Response<Body>, TransportError> {
    let result = match method {
        "GET" => with_headers(agent.get(url), headers).call(),
        "HEAD" => with_headers(agent.head(url), headers).call(),
        "DELETE" => with_headers(agent.delete(url), headers).call(),
        "POST" => send(with_headers(agent.post(url), headers), payload),
        "PUT" => send(with_headers(agent.put(url), headers), payload),
        "PATCH" => send(with_headers(agent.patch(url), headers), payload),
        other => {
            return Err(TransportError::new(
                codes::BAD_FUNCTION_ARGUMENT,
                format!("unsupported request method {other}"),
            ))
        }
    };
    result.map_err(|err| map_error(&err))
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(builder: RequestBuilder<WithBody>, payload: Option<Payload>) -> Result<Response<Body>, ureq::Error> {
    match payload {
        Some(Payload::Bytes(bytes)) => builder.send(&bytes[..]),
        Some(Payload::Form(fields)) => builder.send_form(fields),
        None => builder.send_empty(),
    }
}

/// A timeout of zero, or one that is not a non-negative integer, means
/// no timeout.
fn duration(value: &OptionValue, unit: fn(u64) -> Duration) -> Option<Duration> {
    value.as_u64().filter(|n| *n != 0).map(unit)
}

fn payload_len(payload: &Option<Payload>) -> Option<usize> {
    match payload {
        Some(Payload::Bytes(bytes)) => Some(bytes.len()),
        Some(Payload::Form(_)) | None => None,
    }
}

fn read_upload(path: &Path, limit: Option<u64>) -> Result<Vec<u8>, TransportError> {
    let read_error = |e: std::io::Error| {
        TransportError::new(
            codes::READ_ERROR,
            format!("failed to read upload file {}: {e}", path.display()),
        )
    };
    let file = File::open(path).map_err(read_error)?;
    let mut bytes = Vec::new();
    match limit {
        Some(limit) => file.take(limit).read_to_end(&mut bytes),
        None => (&file).read_to_end(&mut bytes),
    }
    .map_err(read_error)?;
    Ok(bytes)
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == Version::HTTP_2 {
        "HTTP/2"
    } else {
        "HTTP/1.1"
    }
}

/// Map a ureq failure onto libcurl's error numbering.
fn map_error(err: &ureq::Error) -> TransportError {
    let code = match err {
        ureq::Error::Timeout(_) => codes::OPERATION_TIMEDOUT,
        ureq::Error::HostNotFound => codes::COULDNT_RESOLVE_HOST,
        ureq::Error::ConnectionFailed => codes::COULDNT_CONNECT,
        ureq::Error::BadUri(_) => codes::URL_MALFORMAT,
        ureq::Error::Http(_) => codes::BAD_FUNCTION_ARGUMENT,
        ureq::Error::TooManyRedirects => codes::TOO_MANY_REDIRECTS,
        ureq::Error::Tls(_) => codes::SSL_CONNECT_ERROR,
        ureq::Error::Protocol(_) => codes::WEIRD_SERVER_REPLY,
        ureq::Error::Io(io) => match io.kind() {
            std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::AddrNotAvailable => {
                codes::COULDNT_CONNECT
            }
            std::io::ErrorKind::TimedOut => codes::OPERATION_TIMEDOUT,
            _ => codes::RECV_ERROR,
        },
        _ => codes::RECV_ERROR,
    };
    TransportError::new(code, err.to_string())
}
