use crate::expectation::Expectation;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How a [`Scenario`] consumes its expectations.
///
/// On the wire a mode is an object tagged by `name`, e.g. `{"name": "stack"}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Mode {
    /// Requests can match expectations in any order, one or many times.
    /// Every expectation must be hit at least once for the scenario to be done.
    #[default]
    Fixture,
    /// Every expectation answers exactly one request, in any order.
    Pool,
    /// Every expectation answers exactly one request, in the declared order.
    Stack,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Fixture => "fixture",
            Mode::Pool => "pool",
            Mode::Stack => "stack",
        };
        f.write_str(name)
    }
}

/// The unit of configuration installed on a scope: a [`Mode`] plus an ordered list of
/// [`Expectation`]s.
///
/// The order of the expectations is the consumption order in [`Mode::Stack`]; in the other
/// modes it only serves as a deterministic tie-breaker.
///
/// ### Example:
/// ```rust
/// use scenario_mock::{Expectation, Mode, Scenario};
///
/// let scenario = Scenario::new(Mode::Stack)
///     .with(Expectation::given("GET", "/a"))
///     .with(Expectation::given("POST", "/b"));
///
/// assert_eq!(scenario.mode(), Mode::Stack);
/// assert_eq!(scenario.expectations().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    expectations: Vec<Expectation>,
    #[serde(default)]
    mode: Mode,
}

impl Scenario {
    pub fn new(mode: Mode) -> Self {
        Self {
            expectations: vec![],
            mode,
        }
    }

    /// Append an expectation at the end of the sequence.
    pub fn with(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub(crate) fn expectations_mut(&mut self) -> &mut Vec<Expectation> {
        &mut self.expectations
    }
}

impl<I> From<(Mode, I)> for Scenario
where
    I: IntoIterator<Item = Expectation>,
{
    fn from((mode, expectations): (Mode, I)) -> Self {
        Self {
            expectations: expectations.into_iter().collect(),
            mode,
        }
    }
}
