//! Caller-side request descriptions.
//!
//! # Design
//! A `RequestDescription` is an ordered list of options. Each option is
//! either `Named`, routed through the translation table, or `Raw`, a
//! transport code passed through untouched. The caller decides which one
//! it is when building the description; nothing is inferred from the type
//! of a value at execution time.
//!
//! The JSON form is an object. Keys that parse as unsigned integers are raw
//! codes, every other key is a symbolic name. Document order is kept.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::InvalidRequest;
use crate::http::HttpMethod;
use crate::option::{OptionCode, OptionValue};

/// One entry of a request description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    Named { name: String, value: OptionValue },
    Raw { code: OptionCode, value: OptionValue },
}

/// Declarative description of one HTTP call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDescription {
    options: Vec<RequestOption>,
}

impl RequestDescription {
    /// Start a description with the required `url` option.
    pub fn new(url: &str) -> Self {
        Self::default().named("url", url)
    }

    /// An empty description. Executing it fails validation until `url` is set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode the JSON object form.
    pub fn from_json(json: &str) -> Result<Self, InvalidRequest> {
        serde_json::from_str(json).map_err(|e| InvalidRequest::Malformed(e.to_string()))
    }

    /// Append a symbolic option.
    pub fn named(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.options.push(RequestOption::Named {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Append a raw transport option.
    pub fn raw(mut self, code: impl Into<OptionCode>, value: impl Into<OptionValue>) -> Self {
        self.options.push(RequestOption::Raw {
            code: code.into(),
            value: value.into(),
        });
        self
    }

    pub fn method(self, method: HttpMethod) -> Self {
        self.named("method", method.as_str())
    }

    pub fn data(self, body: impl Into<String>) -> Self {
        self.named("data", body.into())
    }

    pub fn form(self, fields: BTreeMap<String, String>) -> Self {
        self.named("data", fields)
    }

    /// Append one `"Name: value"` header. Repeated calls accumulate into a
    /// single `headers` option.
    pub fn header(mut self, line: impl Into<String>) -> Self {
        let line = line.into();
        let existing = self.options.iter_mut().rev().find_map(|opt| match opt {
            RequestOption::Named { name, value } if name == "headers" => Some(value),
            _ => None,
        });
        if let Some(OptionValue::List(items)) = existing {
            items.push(line);
            return self;
        }
        self.options.push(RequestOption::Named {
            name: "headers".to_string(),
            value: OptionValue::List(vec![line]),
        });
        self
    }

    pub fn user_agent(self, agent: &str) -> Self {
        self.named("user_agent", agent)
    }

    pub fn timeout_ms(self, ms: i64) -> Self {
        self.named("timeout_ms", ms)
    }

    pub fn connect_timeout_ms(self, ms: i64) -> Self {
        self.named("connect_timeout_ms", ms)
    }

    pub fn options(&self) -> &[RequestOption] {
        &self.options
    }

    /// Value of the last symbolic option called `name`.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options.iter().rev().find_map(|opt| match opt {
            RequestOption::Named { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<'de> Deserialize<'de> for RequestDescription {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DescriptionVisitor)
    }
}

struct DescriptionVisitor;

impl<'de> Visitor<'de> for DescriptionVisitor {
    type Value = RequestDescription;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of request options")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut options = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            let value: Option<OptionValue> = map
                .next_value()
                .map_err(|e| de::Error::custom(format!("option `{key}`: {e}")))?;
            // A null value is an unset option.
            let Some(value) = value else {
                continue;
            };
            let option = match key.parse::<u32>() {
                Ok(code) => RequestOption::Raw {
                    code: OptionCode(code),
                    value,
                },
                Err(_) => RequestOption::Named { name: key, value },
            };
            options.push(option);
        }
        Ok(RequestDescription { options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::TransportOption;

    #[test]
    fn new_sets_url() {
        let req = RequestDescription::new("http://example.test");
        assert_eq!(req.get("url"), Some(&OptionValue::from("http://example.test")));
        assert_eq!(req.options().len(), 1);
    }

    #[test]
    fn headers_accumulate_into_one_option() {
        let req = RequestDescription::new("http://example.test")
            .header("Accept: text/plain")
            .header("X-Trace: 1");
        assert_eq!(
            req.get("headers"),
            Some(&OptionValue::List(vec![
                "Accept: text/plain".to_string(),
                "X-Trace: 1".to_string()
            ]))
        );
        assert_eq!(req.options().len(), 2);
    }

    #[test]
    fn get_returns_last_setting() {
        let req = RequestDescription::new("http://a.test").named("url", "http://b.test");
        assert_eq!(req.get("url"), Some(&OptionValue::from("http://b.test")));
    }

    #[test]
    fn from_json_treats_null_as_unset() {
        let req =
            RequestDescription::from_json(r#"{"url":"http://example.test","method":null}"#)
                .unwrap();
        assert!(!req.contains("method"));
        assert_eq!(req.options().len(), 1);
    }

    #[test]
    fn from_json_keeps_document_order() {
        let req = RequestDescription::from_json(
            r#"{"url":"http://example.test","method":"POST","data":"a=1"}"#,
        )
        .unwrap();
        let names: Vec<&str> = req
            .options()
            .iter()
            .map(|opt| match opt {
                RequestOption::Named { name, .. } => name.as_str(),
                RequestOption::Raw { .. } => "<raw>",
            })
            .collect();
        assert_eq!(names, vec!["url", "method", "data"]);
    }

    #[test]
    fn from_json_numeric_keys_are_raw_codes() {
        let req = RequestDescription::from_json(r#"{"url":"http://example.test","10018":"agent/1"}"#)
            .unwrap();
        assert_eq!(
            req.options()[1],
            RequestOption::Raw {
                code: TransportOption::UserAgent.code(),
                value: OptionValue::from("agent/1"),
            }
        );
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = RequestDescription::from_json("[1,2]").unwrap_err();
        assert!(matches!(err, InvalidRequest::Malformed(_)));
    }

    #[test]
    fn from_json_names_the_bad_option() {
        let err = RequestDescription::from_json(r#"{"url":"x","timeout":1.5}"#).unwrap_err();
        match err {
            InvalidRequest::Malformed(msg) => assert!(msg.contains("timeout"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
