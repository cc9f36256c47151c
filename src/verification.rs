use crate::expectation::Expectation;
use crate::scenario::{Mode, Scenario};

/// The outcome of the completion check run on a fetched [`Scenario`].
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Every expectation was satisfied.
    Complete,
    /// Some expectations were never received; they are listed in scenario order.
    Incomplete(Vec<Expectation>),
}

impl VerificationOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, VerificationOutcome::Complete)
    }

    /// Turn the outcome into a `Result`, for callers that want to bubble the failure up.
    pub fn into_result(self) -> Result<(), IncompleteScenario> {
        match self {
            VerificationOutcome::Complete => Ok(()),
            VerificationOutcome::Incomplete(unmet) => Err(IncompleteScenario { unmet }),
        }
    }
}

impl Scenario {
    /// Check whether the scenario is done.
    ///
    /// - `fixture`: every expectation has been hit at least once;
    /// - `pool` and `stack`: no expectation is left to consume.
    ///
    /// ```rust
    /// use scenario_mock::{Expectation, Mode, Scenario, VerificationOutcome};
    ///
    /// let scenario = Scenario::new(Mode::Pool).with(Expectation::path("/a"));
    /// assert_eq!(
    ///     scenario.verify(),
    ///     VerificationOutcome::Incomplete(vec![Expectation::path("/a")])
    /// );
    /// assert!(Scenario::new(Mode::Stack).verify().is_complete());
    /// ```
    pub fn verify(&self) -> VerificationOutcome {
        let unmet: Vec<Expectation> = match self.mode() {
            Mode::Fixture => self
                .expectations()
                .iter()
                .filter(|expectation| expectation.hits() == 0)
                .cloned()
                .collect(),
            Mode::Pool | Mode::Stack => self.expectations().to_vec(),
        };

        if unmet.is_empty() {
            VerificationOutcome::Complete
        } else {
            VerificationOutcome::Incomplete(unmet)
        }
    }
}

/// A scenario was expected to be done but is not.
///
/// The message lists every expectation whose request never came.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "The scenario is expected to be done but is not. The following requests were expected but they never came:\n{}",
    render(.unmet)
)]
pub struct IncompleteScenario {
    pub unmet: Vec<Expectation>,
}

fn render(expectations: &[Expectation]) -> String {
    expectations
        .iter()
        .map(|expectation| format!("- {}\n", expectation))
        .collect()
}
