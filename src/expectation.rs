use crate::matchers::{CompiledPath, PathPattern};
use crate::response_template::{ResponseTemplate, DEFAULT_STATUS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// The wildcard accepted by both [`MatchCriteria::method`] and [`MatchCriteria::path`]:
/// it matches anything and adds nothing to the specificity of a match.
pub const WILDCARD: &str = "*";

fn wildcard() -> String {
    WILDCARD.to_string()
}

/// The criteria an incoming request must satisfy for an [`Expectation`] to answer it.
///
/// Only the method and the path of a request are taken into account: headers, query
/// parameters and bodies are recorded for diagnostics but never matched upon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCriteria {
    /// An HTTP method, compared case-insensitively, or `*`.
    #[serde(default = "wildcard")]
    pub method: String,
    /// A path pattern (e.g. `/users/:id`) or `*`.
    #[serde(default = "wildcard")]
    pub path: String,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            method: wildcard(),
            path: wildcard(),
        }
    }
}

/// One rule of a [`Scenario`]: what to match, what to answer and how many times it has
/// been used so far.
///
/// ### Example:
/// ```rust
/// use scenario_mock::{Expectation, ResponseTemplate};
/// use serde_json::json;
///
/// let expectation = Expectation::given("GET", "/users/:id")
///     .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Ada" })));
///
/// assert_eq!(expectation.hits(), 0);
/// assert_eq!(expectation.criteria().path, "/users/:id");
/// ```
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(rename = "match", default)]
    criteria: MatchCriteria,
    #[serde(default)]
    response: ResponseTemplate,
    #[serde(default)]
    hits: u64,
    #[serde(skip)]
    compiled_path: CompiledPath,
}

impl Expectation {
    /// Expect a request with the given method and path pattern.
    /// Either of them can be the `*` wildcard.
    pub fn given<M, P>(method: M, path: P) -> Self
    where
        M: Into<String>,
        P: Into<String>,
    {
        Self {
            criteria: MatchCriteria {
                method: method.into(),
                path: path.into(),
            },
            response: ResponseTemplate::default(),
            hits: 0,
            compiled_path: CompiledPath::default(),
        }
    }

    /// Expect any request, regardless of its method or path.
    pub fn any() -> Self {
        Self::given(WILDCARD, WILDCARD)
    }

    /// Expect any method on the given path pattern.
    pub fn path<P: Into<String>>(path: P) -> Self {
        Self::given(WILDCARD, path)
    }

    pub fn respond_with(mut self, response: ResponseTemplate) -> Self {
        self.response = response;
        self
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    pub fn response(&self) -> &ResponseTemplate {
        &self.response
    }

    /// How many requests this expectation has answered.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// The compiled form of `criteria().path`. Only meaningful when the path is not `*`.
    pub(crate) fn path_pattern(&self) -> Option<&PathPattern> {
        self.compiled_path.get(&self.criteria.path)
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }
}

/// One line per expectation, with the response defaults applied.
impl Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = self.response.status().unwrap_or(DEFAULT_STATUS);
        let empty = Value::Object(Default::default());
        let body = self.response.body().unwrap_or(&empty);
        write!(
            f,
            "{} {}   =>   {} {}",
            self.criteria.method, self.criteria.path, status, body
        )
    }
}
