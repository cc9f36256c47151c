//! The per-request decision procedure.
//!
//! Given a scope and a request, [`dispatch`] looks up the scope's scenario, picks the
//! expectation that answers the request according to the scenario's [`Mode`], updates the
//! scenario and resolves the response to send.
//!
//! - `stack`: the head expectation is popped *before* it is checked. If it does not match,
//!   it is not put back: the scenario stays advanced and every later request is judged
//!   against the next step.
//! - `pool`: the first matching expectation, in installation order, answers and is removed.
//! - `fixture`: the most specific matching expectation answers (the earliest one on ties)
//!   and stays available for further requests.
use crate::expectation::Expectation;
use crate::matchers::{matches, MatchOutcome};
use crate::request::{BodyPrintLimit, MatchableRequest};
use crate::response_template::MockResponse;
use crate::scenario::{Mode, Scenario};
use crate::scenario_store::{ScenarioStore, UnknownScope};
use log::{debug, error};
use serde::Serialize;
use serde_json::Value;

/// Why a request could not be answered.
///
/// Serializes as `{"code": "<kind code>", ...diagnostics}`.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code")]
pub enum FailureKind {
    #[serde(rename = "unknown_scope")]
    #[error("{0}")]
    UnknownScope(UnknownScope),
    #[serde(rename = "empty_scenario")]
    #[error("The scenario has no expectations.")]
    EmptyScenario,
    #[serde(rename = "no_match_next_expected_step")]
    #[error("The request does not match the next expected step: {expected}")]
    StackMismatch { expected: Expectation },
    #[serde(rename = "no_match_any_remaining_step")]
    #[error("The request does not match any of the {} remaining step(s).", .remaining_steps.len())]
    PoolExhausted {
        #[serde(rename = "remainingSteps")]
        remaining_steps: Vec<Expectation>,
    },
    #[serde(rename = "no_match_any_step")]
    #[error("The request does not match any of the {} step(s).", .steps.len())]
    NoFixtureMatch { steps: Vec<Expectation> },
}

impl FailureKind {
    /// The machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::UnknownScope(_) => "unknown_scope",
            FailureKind::EmptyScenario => "empty_scenario",
            FailureKind::StackMismatch { .. } => "no_match_next_expected_step",
            FailureKind::PoolExhausted { .. } => "no_match_any_remaining_step",
            FailureKind::NoFixtureMatch { .. } => "no_match_any_step",
        }
    }
}

/// A request that could not be answered, together with the reason.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to dispatch `{} {}` in scope `{scope}`: {kind}", .request.method, .request.path)]
pub struct DispatchFailure {
    pub scope: String,
    pub request: MatchableRequest,
    pub kind: FailureKind,
}

impl DispatchFailure {
    /// The JSON payload sent back to the client: the failure code, the observed request
    /// under `got` and whatever scenario state explains the failure.
    pub fn report(&self, body_print_limit: BodyPrintLimit) -> Value {
        let mut report = match serde_json::to_value(&self.kind) {
            Ok(Value::Object(map)) => map,
            _ => Default::default(),
        };
        // `code` is always present, even if the diagnostics failed to serialize.
        report.insert("code".into(), Value::String(self.kind.code().into()));
        if let FailureKind::UnknownScope(unknown) = &self.kind {
            report.insert("message".into(), Value::String(unknown.to_string()));
        }
        report.insert("got".into(), self.request.summary(body_print_limit));
        Value::Object(report)
    }
}

/// Answer `request` using the scenario installed for `scope`.
pub(crate) async fn dispatch(
    store: &ScenarioStore,
    scope: &str,
    request: &MatchableRequest,
) -> Result<MockResponse, DispatchFailure> {
    let fail = |kind: FailureKind| DispatchFailure {
        scope: scope.to_string(),
        request: request.clone(),
        kind,
    };

    let slot = store
        .slot(scope)
        .await
        .map_err(|e| fail(FailureKind::UnknownScope(e)))?;
    // Held until the scenario has been updated: one request at a time per scope.
    let mut scenario = slot.lock().await;

    match select(&mut scenario, request) {
        Ok(expectation) => {
            debug!(
                "Scope `{}`: `{} {}` answered by `{}`.",
                scope, request.method, request.path, expectation
            );
            Ok(expectation.response().resolve())
        }
        Err(kind) => {
            error!(
                "Scope `{}`: {} ({})\n{}",
                scope,
                kind,
                kind.code(),
                request
            );
            Err(fail(kind))
        }
    }
}

/// Pick the expectation answering `request` and update `scenario` accordingly.
///
/// Returns a copy of the chosen expectation, hit counter already incremented.
pub fn select(
    scenario: &mut Scenario,
    request: &MatchableRequest,
) -> Result<Expectation, FailureKind> {
    if scenario.expectations().is_empty() {
        return Err(FailureKind::EmptyScenario);
    }

    let mode = scenario.mode();
    let expectations = scenario.expectations_mut();
    match mode {
        Mode::Stack => {
            let mut expectation = expectations.remove(0);
            if !matches(request, &expectation).is_match() {
                return Err(FailureKind::StackMismatch { expected: expectation });
            }
            expectation.record_hit();
            Ok(expectation)
        }
        Mode::Pool => {
            let position = expectations
                .iter()
                .position(|expectation| matches(request, expectation).is_match())
                .ok_or_else(|| FailureKind::PoolExhausted {
                    remaining_steps: expectations.clone(),
                })?;
            let mut expectation = expectations.remove(position);
            expectation.record_hit();
            Ok(expectation)
        }
        Mode::Fixture => {
            let position = most_specific(expectations, request).ok_or_else(|| {
                FailureKind::NoFixtureMatch {
                    steps: expectations.clone(),
                }
            })?;
            let expectation = &mut expectations[position];
            expectation.record_hit();
            Ok(expectation.clone())
        }
    }
}

/// Index of the matching expectation with the highest specificity.
/// On ties the earliest expectation wins: a later one must be strictly more specific.
fn most_specific(expectations: &[Expectation], request: &MatchableRequest) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (position, expectation) in expectations.iter().enumerate() {
        if let MatchOutcome::Match { specificity } = matches(request, expectation) {
            match best {
                Some((_, best_specificity)) if specificity <= best_specificity => {}
                _ => best = Some((position, specificity)),
            }
        }
    }
    best.map(|(position, _)| position)
}
