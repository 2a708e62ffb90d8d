//! Transport option codes and values.
//!
//! # Design
//! Codes use libcurl's numbering so that raw codes written against libcurl
//! keep their meaning when handed to any `Transport`. `OptionCode` is the
//! open set a transport receives; `TransportOption` names the subset this
//! crate knows how to route. Values stay loosely typed: a transport coerces
//! them at the point of use (`as_flag`, `as_u64`, ...).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A transport option identifier, known or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionCode(pub u32);

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match TransportOption::from_code(*self) {
            Some(opt) => write!(f, "{opt:?}({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Transport options with a symbolic name in the translation table, plus
/// the two the executor sets on its own (`ReturnTransfer`, `Verbose`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TransportOption {
    Timeout = 13,
    InFileSize = 14,
    Verbose = 41,
    Header = 42,
    NoBody = 44,
    Post = 47,
    Put = 54,
    ConnectTimeout = 78,
    HttpGet = 80,
    TimeoutMs = 155,
    ConnectTimeoutMs = 156,
    Url = 10002,
    InFile = 10009,
    PostFields = 10015,
    UserAgent = 10018,
    HttpHeader = 10023,
    CustomRequest = 10036,
    ReturnTransfer = 19913,
}

impl TransportOption {
    const ALL: [TransportOption; 18] = [
        TransportOption::Timeout,
        TransportOption::InFileSize,
        TransportOption::Verbose,
        TransportOption::Header,
        TransportOption::NoBody,
        TransportOption::Post,
        TransportOption::Put,
        TransportOption::ConnectTimeout,
        TransportOption::HttpGet,
        TransportOption::TimeoutMs,
        TransportOption::ConnectTimeoutMs,
        TransportOption::Url,
        TransportOption::InFile,
        TransportOption::PostFields,
        TransportOption::UserAgent,
        TransportOption::HttpHeader,
        TransportOption::CustomRequest,
        TransportOption::ReturnTransfer,
    ];

    pub fn code(self) -> OptionCode {
        OptionCode(self as u32)
    }

    pub fn from_code(code: OptionCode) -> Option<Self> {
        Self::ALL.into_iter().find(|opt| opt.code() == code)
    }
}

impl From<TransportOption> for OptionCode {
    fn from(opt: TransportOption) -> Self {
        opt.code()
    }
}

/// Value attached to a request option.
///
/// Deserialized untagged from JSON: booleans, integers, strings, arrays of
/// strings, and objects with string values (form fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Text(String),
    List(Vec<String>),
    Form(BTreeMap<String, String>),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose truthiness: `0`, `""`, `"0"`, and empty collections are false.
    pub fn as_flag(&self) -> bool {
        match self {
            OptionValue::Flag(b) => *b,
            OptionValue::Integer(n) => *n != 0,
            OptionValue::Text(s) => !s.is_empty() && s != "0",
            OptionValue::List(items) => !items.is_empty(),
            OptionValue::Form(fields) => !fields.is_empty(),
        }
    }

    /// Non-negative integers, also accepted as numeric strings.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            OptionValue::Integer(n) => u64::try_from(*n).ok(),
            OptionValue::Text(s) => s.trim().parse().ok(),
            OptionValue::Flag(b) => Some(u64::from(*b)),
            _ => None,
        }
    }

    /// A single string counts as a one-element list.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            OptionValue::List(items) => items.iter().map(String::as_str).collect(),
            OptionValue::Text(s) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Flag(b)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Integer(n)
    }
}

impl From<i32> for OptionValue {
    fn from(n: i32) -> Self {
        OptionValue::Integer(i64::from(n))
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(items: Vec<String>) -> Self {
        OptionValue::List(items)
    }
}

impl From<BTreeMap<String, String>> for OptionValue {
    fn from(fields: BTreeMap<String, String>) -> Self {
        OptionValue::Form(fields)
    }
}
