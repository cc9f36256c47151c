use crate::scenario_store::DEFAULT_SCOPE;
use http::HeaderMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Default name of the header that selects the scope of a request.
pub const SCOPE_HEADER: &str = "x-test-mock-api-scope";

static SCOPE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/scope-([^/]+)").expect("The scope prefix regex is valid"));

/// Work out which scope a request belongs to, and the path to match it with.
///
/// Precedence: the `scope_header` header, then a `/scope-<name>` path prefix, then
/// [`DEFAULT_SCOPE`]. The path prefix is stripped whenever present, even if the header
/// picked the scope. A path that ends up empty becomes `/`.
pub(crate) fn resolve(headers: &HeaderMap, path: &str, scope_header: &str) -> (String, String) {
    let from_header = headers
        .get(scope_header)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let (from_path, path) = match SCOPE_PREFIX.captures(path) {
        Some(captures) => {
            let prefix_len = captures[0].len();
            let rest = &path[prefix_len..];
            let rest = if rest.is_empty() { "/" } else { rest };
            (Some(captures[1].to_string()), rest.to_string())
        }
        None => (None, path.to_string()),
    };

    let scope = from_header
        .or(from_path)
        .unwrap_or_else(|| DEFAULT_SCOPE.to_string());
    (scope, path)
}
