//! Captured request types.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::str::FromStr;

/// The verbs the listener answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// CORS preflight. Answered, never captured.
    Options,
}

impl Method {
    /// Value for `Access-Control-Allow-Methods` and `Allow`.
    pub const ALLOWED: &'static str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }

    pub fn is_preflight(&self) -> bool {
        matches!(self, Method::Options)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb outside [`Method::ALLOWED`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method `{0}`")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    /// Methods are case-sensitive tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

/// Request headers with the client's spelling preserved.
///
/// Keeps first-seen order. A repeated name (compared case-insensitively)
/// replaces the earlier entry's value and spelling in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    entries: Vec<(String, String)>,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderFields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = HeaderFields::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl Serialize for HeaderFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One captured, non-preflight request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CapturedRequest {
    /// Local capture instant, ISO-8601 with microseconds.
    pub timestamp: String,
    pub method: Method,
    /// Raw request target as sent.
    pub url: String,
    pub path: String,
    pub query: String,
    pub headers: HeaderFields,
    /// Lossy UTF-8 decoding of the body; empty when there was none.
    pub body: String,
    pub client_ip: String,
}

/// Current local time in the snapshot's timestamp format.
pub fn capture_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_sensitive() {
        assert_eq!("PATCH".parse::<Method>(), Ok(Method::Patch));
        assert_eq!(
            "get".parse::<Method>(),
            Err(UnsupportedMethod("get".to_string()))
        );
        assert!("HEAD".parse::<Method>().is_err());
        assert!(Method::Options.is_preflight());
        assert!(!Method::Get.is_preflight());
    }

    #[test]
    fn duplicate_headers_collapse_to_last_value() {
        let headers: HeaderFields = [
            ("Accept", "text/html"),
            ("X-Token", "first"),
            ("x-token", "second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("X-TOKEN"), Some("second"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Accept", "x-token"]);
    }

    #[test]
    fn serializes_with_upper_case_method_and_header_object() {
        let request = CapturedRequest {
            timestamp: "2024-01-01T00:00:00.000000".to_string(),
            method: Method::Post,
            url: "/foo?x=1".to_string(),
            path: "/foo".to_string(),
            query: "x=1".to_string(),
            headers: [("Content-Type", "application/json")].into_iter().collect(),
            body: "{\"a\":1}".to_string(),
            client_ip: "127.0.0.1".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["headers"]["Content-Type"], "application/json");
        assert_eq!(value["body"], "{\"a\":1}");
    }

    #[test]
    fn timestamp_looks_like_iso_8601() {
        let ts = capture_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }
}
