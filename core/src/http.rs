//! HTTP vocabulary shared by the executor and the transports.
//!
//! # Design
//! The executor only accepts the four methods listed in `HttpMethod`; a
//! transport may still be asked for other verbs through a raw
//! `CustomRequest` option, which is why the transports keep methods as
//! strings and only the validation step goes through this enum.

use std::fmt;
use std::str::FromStr;

/// HTTP method accepted by request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method names are matched case-sensitively: `"get"` is not a method.
impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(other.to_string()),
        }
    }
}

/// Split a raw `"Name: value"` header line into its trimmed parts.
///
/// Returns `None` when the line has no colon or an empty name.
pub fn split_header(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_methods() {
        assert_eq!("GET".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("POST".parse::<HttpMethod>(), Ok(HttpMethod::Post));
        assert_eq!("PUT".parse::<HttpMethod>(), Ok(HttpMethod::Put));
        assert_eq!("DELETE".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
    }

    #[test]
    fn method_names_are_case_sensitive() {
        assert_eq!("get".parse::<HttpMethod>(), Err("get".to_string()));
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn split_header_trims_both_sides() {
        assert_eq!(
            split_header("  X-Token :  abc "),
            Some(("X-Token", "abc"))
        );
    }

    #[test]
    fn split_header_keeps_colons_in_value() {
        assert_eq!(
            split_header("Referer: http://a.test/x"),
            Some(("Referer", "http://a.test/x"))
        );
    }

    #[test]
    fn split_header_rejects_malformed_lines() {
        assert_eq!(split_header("no colon here"), None);
        assert_eq!(split_header(": value"), None);
    }
}
