//! Convenient re-exports of http types that are part of `scenario_mock`'s public API.
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
