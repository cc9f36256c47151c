use std::fmt;

use http::{HeaderMap, Method};
use serde_json::{Map, Value};

pub const BODY_PRINT_LIMIT: usize = 10_000;

/// Specifies limitations on printing request bodies when logging requests or reporting them
/// back in failure payloads. For some test suites the bodies may be too large to reasonably
/// print and it may be desirable to limit them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyPrintLimit {
    /// Maximum length of a body to print in bytes.
    Limited(usize),
    /// There is no limit to the size of a body that may be printed.
    Unlimited,
}

impl Default for BodyPrintLimit {
    fn default() -> Self {
        BodyPrintLimit::Limited(BODY_PRINT_LIMIT)
    }
}

/// An incoming request, as seen by the dispatch engine.
///
/// Only `method` and `path` are used for matching. `path` is the path *after* scope
/// resolution, i.e. with any `/scope-<name>` prefix already stripped.
/// `headers`, `query` and `body` are kept around to explain failures.
#[derive(Debug, Clone)]
pub struct MatchableRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MatchableRequest {
    /// A request with no headers, no query string and an empty body.
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: vec![],
            body: vec![],
        }
    }

    pub(crate) fn from_parts(
        parts: http::request::Parts,
        path: String,
        body: Vec<u8>,
    ) -> MatchableRequest {
        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self {
            method: parts.method,
            path,
            headers: parts.headers,
            query,
            body,
        }
    }

    /// A JSON rendition of the request, used as the `got` field of failure payloads.
    ///
    /// Bodies that are valid JSON are embedded as-is, other bodies as (lossy) strings.
    /// Bodies above `body_print_limit` are replaced by a note carrying their size.
    pub fn summary(&self, body_print_limit: BodyPrintLimit) -> Value {
        let mut headers = Map::new();
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>();
            headers.insert(name.to_string(), Value::String(values.join(",")));
        }

        let query = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();

        let body = match body_print_limit {
            BodyPrintLimit::Limited(limit) if self.body.len() > limit => Value::String(format!(
                "Too big to log. Had a length of {} bytes (limit: {} bytes)",
                self.body.len(),
                limit
            )),
            _ if self.body.is_empty() => Value::Null,
            _ => serde_json::from_slice(&self.body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into())),
        };

        serde_json::json!({
            "method": self.method.as_str(),
            "path": self.path,
            "headers": headers,
            "query": query,
            "body": body,
        })
    }

    pub(crate) fn print_with_limit(
        &self,
        mut buffer: impl fmt::Write,
        body_print_limit: BodyPrintLimit,
    ) -> fmt::Result {
        writeln!(buffer, "{} {}", self.method, self.path)?;
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>();
            writeln!(buffer, "{}: {}", name, values.join(","))?;
        }

        match body_print_limit {
            BodyPrintLimit::Limited(limit) if self.body.len() > limit => writeln!(
                buffer,
                "We truncated the body because it was too large: {} bytes (limit: {} bytes)",
                self.body.len(),
                limit
            ),
            _ => match std::str::from_utf8(&self.body) {
                Ok(body) => writeln!(buffer, "{}", body),
                Err(_) => writeln!(
                    buffer,
                    "Body is likely binary (invalid utf-8) size is {} bytes",
                    self.body.len()
                ),
            },
        }
    }
}

impl fmt::Display for MatchableRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_with_limit(f, BodyPrintLimit::default())
    }
}
