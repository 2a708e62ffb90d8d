//! Validation and translation of request descriptions into transport options.
//!
//! # Design
//! `TRANSLATION_TABLE` is the only place symbolic names meet transport
//! codes. `translate` validates first and never touches a transport, so a
//! rejected description costs no network activity.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::InvalidRequest;
use crate::http::HttpMethod;
use crate::option::{OptionCode, OptionValue, TransportOption};
use crate::request::{RequestDescription, RequestOption};

/// Symbolic option names and the transport option each one sets.
pub const TRANSLATION_TABLE: [(&str, TransportOption); 16] = [
    ("url", TransportOption::Url),
    ("data", TransportOption::PostFields),
    ("post", TransportOption::Post),
    ("get", TransportOption::HttpGet),
    ("put", TransportOption::Put),
    ("method", TransportOption::CustomRequest),
    ("timeout", TransportOption::Timeout),
    ("timeout_ms", TransportOption::TimeoutMs),
    ("connect_timeout", TransportOption::ConnectTimeout),
    ("connect_timeout_ms", TransportOption::ConnectTimeoutMs),
    ("headers", TransportOption::HttpHeader),
    ("user_agent", TransportOption::UserAgent),
    ("file", TransportOption::InFile),
    ("file_size", TransportOption::InFileSize),
    ("no_body", TransportOption::NoBody),
    ("fetch_headers", TransportOption::Header),
];

static TRANSLATION: LazyLock<HashMap<&'static str, TransportOption>> =
    LazyLock::new(|| TRANSLATION_TABLE.into_iter().collect());

/// Transport option for a symbolic name, if the name is known.
pub fn lookup(name: &str) -> Option<TransportOption> {
    TRANSLATION.get(name).copied()
}

/// Ordered transport options. Setting a code twice overwrites the value in
/// place, keeping the position of the first setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(OptionCode, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: impl Into<OptionCode>, value: OptionValue) {
        let code = code.into();
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((code, value)),
        }
    }

    pub fn get(&self, code: impl Into<OptionCode>) -> Option<&OptionValue> {
        let code = code.into();
        self.entries.iter().find(|(c, _)| *c == code).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionCode, &OptionValue)> {
        self.entries.iter().map(|(c, v)| (*c, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that the description names a `url` and a supported method.
///
/// Returns the method, defaulting to `GET` when none is given.
pub fn validate(request: &RequestDescription) -> Result<HttpMethod, InvalidRequest> {
    if !request.contains("url") {
        return Err(InvalidRequest::MissingUrl);
    }
    match request.get("method") {
        None => Ok(HttpMethod::Get),
        Some(OptionValue::Text(name)) => name
            .parse()
            .map_err(|_| InvalidRequest::UnsupportedMethod(format!("{name:?}"))),
        Some(other) => Err(InvalidRequest::UnsupportedMethod(format!("{other:?}"))),
    }
}

/// Validate `request` and translate it into the option set handed to a
/// transport. `ReturnTransfer` is always forced on.
pub fn translate(request: &RequestDescription) -> Result<OptionSet, InvalidRequest> {
    let method = validate(request)?;

    let mut set = OptionSet::new();
    for option in request.options() {
        match option {
            RequestOption::Raw { code, value } => set.set(*code, value.clone()),
            RequestOption::Named { name, value } => match lookup(name) {
                Some(opt) => set.set(opt, value.clone()),
                None => tracing::debug!(option = %name, "ignoring unknown request option"),
            },
        }
    }
    if !request.contains("method") {
        set.set(TransportOption::CustomRequest, method.as_str().into());
    }
    set.set(TransportOption::ReturnTransfer, OptionValue::Flag(true));
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_no_duplicate_names() {
        assert_eq!(TRANSLATION.len(), TRANSLATION_TABLE.len());
    }

    #[test]
    fn lookup_known_and_unknown_names() {
        assert_eq!(lookup("user_agent"), Some(TransportOption::UserAgent));
        assert_eq!(lookup("fetch_headers"), Some(TransportOption::Header));
        assert_eq!(lookup("foo"), None);
        assert_eq!(lookup("URL"), None);
    }

    #[test]
    fn option_set_overwrites_in_place() {
        let mut set = OptionSet::new();
        set.set(TransportOption::Url, "http://a.test".into());
        set.set(TransportOption::Timeout, 5.into());
        set.set(TransportOption::Url, "http://b.test".into());
        let codes: Vec<OptionCode> = set.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec![TransportOption::Url.code(), TransportOption::Timeout.code()]);
        assert_eq!(set.get(TransportOption::Url), Some(&"http://b.test".into()));
    }

    #[test]
    fn missing_url_is_rejected() {
        let req = RequestDescription::empty().method(HttpMethod::Get);
        assert_eq!(translate(&req), Err(InvalidRequest::MissingUrl));
    }

    #[test]
    fn raw_url_code_does_not_satisfy_url() {
        let req = RequestDescription::empty().raw(TransportOption::Url, "http://example.test");
        assert_eq!(validate(&req), Err(InvalidRequest::MissingUrl));
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let req = RequestDescription::new("http://example.test").named("method", "PATCH");
        assert!(matches!(
            translate(&req),
            Err(InvalidRequest::UnsupportedMethod(m)) if m.contains("PATCH")
        ));
    }

    #[test]
    fn non_text_method_is_rejected() {
        let req = RequestDescription::new("http://example.test").named("method", true);
        assert!(matches!(
            validate(&req),
            Err(InvalidRequest::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn method_defaults_to_get() {
        let req = RequestDescription::new("http://example.test");
        let set = translate(&req).unwrap();
        assert_eq!(set.get(TransportOption::CustomRequest), Some(&"GET".into()));
    }

    #[test]
    fn explicit_method_is_translated() {
        let req = RequestDescription::new("http://example.test")
            .method(HttpMethod::Post)
            .data("a=1");
        let set = translate(&req).unwrap();
        assert_eq!(set.get(TransportOption::CustomRequest), Some(&"POST".into()));
        assert_eq!(set.get(TransportOption::PostFields), Some(&"a=1".into()));
    }

    #[test]
    fn raw_codes_pass_through_unmodified() {
        let req = RequestDescription::new("http://example.test")
            .raw(OptionCode(64), 0)
            .raw(TransportOption::UserAgent, "raw-agent");
        let set = translate(&req).unwrap();
        assert_eq!(set.get(OptionCode(64)), Some(&OptionValue::Integer(0)));
        assert_eq!(set.get(TransportOption::UserAgent), Some(&"raw-agent".into()));
    }

    #[test]
    fn unknown_names_do_not_change_the_set() {
        let plain = translate(&RequestDescription::new("http://example.test")).unwrap();
        let noisy =
            translate(&RequestDescription::new("http://example.test").named("foo", "bar")).unwrap();
        assert_eq!(plain, noisy);
    }

    #[test]
    fn return_transfer_is_forced_last() {
        let req = RequestDescription::new("http://example.test")
            .raw(TransportOption::ReturnTransfer, false);
        let set = translate(&req).unwrap();
        assert_eq!(
            set.get(TransportOption::ReturnTransfer),
            Some(&OptionValue::Flag(true))
        );
    }

    #[test]
    fn translation_does_not_mutate_the_description() {
        let req = RequestDescription::new("http://example.test");
        let before = req.clone();
        translate(&req).unwrap();
        assert_eq!(req, before);
    }
}
