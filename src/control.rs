//! Wire types of the remote-control API.
//!
//! - `POST /scenario/set` with a [`SetScenario`] body installs a scenario for a scope;
//! - `POST /scenario/get` with a [`GetScenario`] body returns the scope's live
//!   [`Scenario`], hit counters included.
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};

pub const SET_SCENARIO_PATH: &str = "/scenario/set";
pub const GET_SCENARIO_PATH: &str = "/scenario/get";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetScenario {
    pub scope: String,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetScenario {
    pub scope: String,
}
