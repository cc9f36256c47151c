use crate::scenario::Scenario;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// The scope used when a request carries neither a scope header nor a `/scope-<name>`
/// path prefix.
pub const DEFAULT_SCOPE: &str = "default";

/// Returned when no scenario has ever been set for a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error(
    "The given scope \"{scope}\" does not exist. Maybe a typo, or the scenario for it was never set? Known scopes: {known_scopes:?}"
)]
pub struct UnknownScope {
    pub scope: String,
    pub known_scopes: Vec<String>,
}

/// A live scenario, guarded so that select-and-mutate runs atomically per request.
pub(crate) type ScenarioSlot = Arc<Mutex<Scenario>>;

/// Maps each scope to its live [`Scenario`].
///
/// Every scope has its own lock: requests against the same scope are serialized, requests
/// against different scopes never wait on each other (beyond a short read of the index).
/// Setting a scope swaps the whole slot, so a request in flight keeps working on the
/// scenario it started with.
#[derive(Debug, Default)]
pub(crate) struct ScenarioStore {
    scenarios: RwLock<HashMap<String, ScenarioSlot>>,
}

impl ScenarioStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Install `scenario` for `scope`, replacing whatever was there before.
    pub(crate) async fn set(&self, scope: String, scenario: Scenario) {
        debug!(
            "Setting a {} scenario with {} expectation(s) for scope `{}`.",
            scenario.mode(),
            scenario.expectations().len(),
            scope
        );
        self.scenarios
            .write()
            .await
            .insert(scope, Arc::new(Mutex::new(scenario)));
    }

    pub(crate) async fn slot(&self, scope: &str) -> Result<ScenarioSlot, UnknownScope> {
        let scenarios = self.scenarios.read().await;
        match scenarios.get(scope) {
            Some(slot) => Ok(slot.clone()),
            None => {
                let mut known_scopes: Vec<String> = scenarios.keys().cloned().collect();
                known_scopes.sort();
                Err(UnknownScope {
                    scope: scope.to_string(),
                    known_scopes,
                })
            }
        }
    }

    /// A snapshot of the scenario currently installed for `scope`, live counters included.
    pub(crate) async fn get(&self, scope: &str) -> Result<Scenario, UnknownScope> {
        let slot = self.slot(scope).await?;
        let scenario = slot.lock().await.clone();
        Ok(scenario)
    }

    /// Forget every scenario.
    pub(crate) async fn reset(&self) {
        self.scenarios.write().await.clear();
    }
}
