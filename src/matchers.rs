//! Matching an incoming request against an [`Expectation`].
//!
//! An expectation either does not match a request, or it matches with a given
//! *specificity*: an integer that ranks how precisely its criteria describe the request.
//! The rules are:
//!
//! - a wildcard (`*`) matches anything and contributes nothing;
//! - a concrete method that matches (case-insensitively) adds `1`;
//! - a concrete path pattern that matches subtracts `1` for each `:param` segment, so a
//!   literal path beats a parametric one, and fewer parameters beat more.
//!
//! Specificity is only meaningful when comparing expectations that already matched the
//! same request.
use crate::expectation::{Expectation, WILDCARD};
use crate::request::MatchableRequest;
use log::warn;
use once_cell::sync::OnceCell;
use regex::Regex;

/// The outcome of running the matcher on a single expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    Match { specificity: i64 },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Match { .. })
    }
}

/// Decide whether `expectation` matches `request`, and how specifically.
///
/// ### Example:
/// ```rust
/// use scenario_mock::matchers::{matches, MatchOutcome};
/// use scenario_mock::{Expectation, MatchableRequest};
/// use scenario_mock::http::Method;
///
/// let request = MatchableRequest::new(Method::GET, "/users/42");
///
/// let literal = Expectation::given("GET", "/users/42");
/// let parametric = Expectation::given("get", "/users/:id");
///
/// assert_eq!(matches(&request, &literal), MatchOutcome::Match { specificity: 1 });
/// assert_eq!(matches(&request, &parametric), MatchOutcome::Match { specificity: 0 });
/// assert_eq!(matches(&request, &Expectation::given("POST", "*")), MatchOutcome::NoMatch);
/// ```
pub fn matches(request: &MatchableRequest, expectation: &Expectation) -> MatchOutcome {
    let criteria = expectation.criteria();
    let mut specificity = 0;

    if criteria.method != WILDCARD {
        if !criteria
            .method
            .eq_ignore_ascii_case(request.method.as_str())
        {
            return MatchOutcome::NoMatch;
        }
        specificity += 1;
    }

    if criteria.path != WILDCARD {
        let Some(pattern) = expectation.path_pattern() else {
            return MatchOutcome::NoMatch;
        };
        if !pattern.matches(&request.path) {
            return MatchOutcome::NoMatch;
        }
        // Each route parameter weakens the match.
        specificity -= pattern.n_params() as i64;
    }

    MatchOutcome::Match { specificity }
}

/// A compiled path pattern.
///
/// Patterns follow the usual "path-to-regexp" conventions:
/// - `:name` matches exactly one non-empty path segment (no `/`);
/// - `:name?` makes the parameter, together with the `/` before it, optional;
/// - everything else is matched literally, case-insensitively;
/// - a trailing `/` on the request path is tolerated.
///
/// ```rust
/// use scenario_mock::matchers::PathPattern;
///
/// let pattern = PathPattern::new("/users/:id/posts").unwrap();
/// assert!(pattern.matches("/users/42/posts"));
/// assert!(pattern.matches("/users/42/posts/"));
/// assert!(!pattern.matches("/users/42/43/posts"));
/// assert_eq!(pattern.n_params(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
    n_params: usize,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&compile(pattern))?;
        let n_params = pattern
            .split('/')
            .filter(|segment| segment.starts_with(':'))
            .count();
        Ok(Self { regex, n_params })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Number of `/`-separated segments that start with `:`.
    pub fn n_params(&self) -> usize {
        self.n_params
    }
}

/// The [`PathPattern`] of an expectation, compiled on first use and carried along by clones.
///
/// A pattern that fails to compile is remembered as `None` and never matches.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledPath(OnceCell<Option<PathPattern>>);

impl CompiledPath {
    pub(crate) fn get(&self, pattern: &str) -> Option<&PathPattern> {
        self.0
            .get_or_init(|| match PathPattern::new(pattern) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    warn!("Path pattern `{}` cannot be compiled: {}", pattern, e);
                    None
                }
            })
            .as_ref()
    }

    #[cfg(test)]
    pub(crate) fn is_compiled(&self) -> bool {
        self.0.get().is_some()
    }
}

// Compilation state is a cache: it never makes two expectations different.
impl PartialEq for CompiledPath {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Translate a path pattern into the source of an anchored, case-insensitive regex.
fn compile(pattern: &str) -> String {
    let mut source = String::from("(?i)^");
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        let starts_param = c == ':' && chars.peek().copied().is_some_and(is_param_char);
        if !starts_param {
            literal.push(c);
            continue;
        }

        while chars.peek().copied().is_some_and(is_param_char) {
            chars.next();
        }
        let optional = chars.peek() == Some(&'?');
        if optional {
            chars.next();
            // The slash in front of an optional parameter is optional too.
            let prefix = if literal.ends_with('/') {
                literal.pop();
                "/"
            } else {
                ""
            };
            source.push_str(&regex::escape(&literal));
            source.push_str(&format!("(?:{}[^/#?]+?)?", regex::escape(prefix)));
        } else {
            source.push_str(&regex::escape(&literal));
            source.push_str("[^/#?]+?");
        }
        literal.clear();
    }

    source.push_str(&regex::escape(&literal));
    source.push_str("[/#?]?$");
    source
}
