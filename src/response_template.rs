use http::{HeaderValue, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code returned when an [`Expectation`] does not configure one.
///
/// [`Expectation`]: crate::Expectation
pub const DEFAULT_STATUS: u16 = 200;

/// The blueprint for the response returned by a [`MockServer`] when an [`Expectation`] is
/// selected to answer an incoming request.
///
/// Both fields are optional on the wire: a missing status means `200`, a missing body means
/// an empty JSON object.
///
/// [`Expectation`]: crate::Expectation
/// [`MockServer`]: crate::MockServer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
}

impl ResponseTemplate {
    /// Start building a `ResponseTemplate` specifying the status code of the response.
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
        }
    }

    /// Set the response body from a JSON-serializable value.
    ///
    /// A value that fails to serialize leaves the body unset.
    pub fn set_body_json<B: Serialize>(mut self, body: B) -> Self {
        match serde_json::to_value(&body) {
            Ok(value) => self.body = Some(value),
            Err(e) => log::warn!("Failed to serialize the response body, leaving it empty: {}", e),
        }
        self
    }

    /// The configured status code, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The configured body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Apply the defaults and produce the response that will actually be sent.
    pub fn resolve(&self) -> MockResponse {
        let status = self.status.unwrap_or(DEFAULT_STATUS);
        let status = StatusCode::from_u16(status).unwrap_or_else(|_| {
            log::warn!(
                "Configured status code {} is not valid, answering with a 500 instead.",
                status
            );
            StatusCode::INTERNAL_SERVER_ERROR
        });
        MockResponse {
            status,
            body: self
                .body
                .clone()
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

/// A fully resolved response: what the [`MockServer`] writes back on the wire.
///
/// [`MockServer`]: crate::MockServer
#[derive(Clone, Debug, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl MockResponse {
    pub(crate) fn json(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Generate a hyper response, serializing the body as JSON.
    pub(crate) fn into_http(self) -> Response<Full<Bytes>> {
        let body = serde_json::to_vec(&self.body).unwrap_or_default();
        let mut response = Response::new(Full::from(body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
