use crate::control::{GetScenario, SetScenario, GET_SCENARIO_PATH, SET_SCENARIO_PATH};
use crate::expectation::Expectation;
use crate::scenario::{Mode, Scenario};
use crate::scenario_store::DEFAULT_SCOPE;
use crate::verification::IncompleteScenario;
use log::debug;
use reqwest::StatusCode;

/// Where the driving client finds the mock server, and which scenario it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Base url of the mock server, e.g. `http://localhost:9000`.
    pub server: String,
    pub scope: String,
    pub mode: Mode,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server: "http://localhost:9000".to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            mode: Mode::Fixture,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to reach the mock server")]
    Transport(#[from] reqwest::Error),
    #[error("The mock server rejected the request with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error(transparent)]
    Incomplete(#[from] IncompleteScenario),
}

/// Drives a remote [`MockServer`]: accumulates expectations, installs them as a scenario
/// on its scope and checks, at the end of a test, that the scenario is done.
///
/// ### Example:
/// ```rust
/// use scenario_mock::{ClientSettings, Expectation, MockServer, Mode, ScenarioClient};
///
/// #[async_std::main]
/// async fn main() {
///     let mock_server = MockServer::start().await;
///     let mut client = ScenarioClient::new(ClientSettings {
///         server: mock_server.uri(),
///         scope: "checkout".into(),
///         mode: Mode::Stack,
///     });
///
///     client
///         .add(Expectation::given("GET", "/cart"))
///         .add(Expectation::given("POST", "/orders"));
///     client.start().await.unwrap();
///
///     // Nothing was requested yet: both steps are still pending.
///     assert!(client.done().await.is_err());
/// }
/// ```
///
/// [`MockServer`]: crate::MockServer
#[derive(Debug, Clone)]
pub struct ScenarioClient {
    settings: ClientSettings,
    expectations: Vec<Expectation>,
    http: reqwest::Client,
}

impl ScenarioClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            expectations: vec![],
            http: reqwest::Client::new(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Queue an expectation. It only reaches the server on [`start`](Self::start).
    pub fn add(&mut self, expectation: Expectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    /// Forget the queued expectations.
    pub fn reset(&mut self) -> &mut Self {
        self.expectations.clear();
        self
    }

    /// The scenario that [`start`](Self::start) installs.
    pub fn scenario(&self) -> Scenario {
        Scenario::from((self.settings.mode, self.expectations.iter().cloned()))
    }

    /// Install the queued expectations on the server, replacing the scope's scenario.
    pub async fn start(&self) -> Result<(), ClientError> {
        debug!(
            "Installing {} expectation(s) on scope `{}`.",
            self.expectations.len(),
            self.settings.scope
        );
        let body = SetScenario {
            scope: self.settings.scope.clone(),
            scenario: self.scenario(),
        };
        self.post(SET_SCENARIO_PATH, &body).await?;
        Ok(())
    }

    /// Fetch the scope's live scenario from the server.
    pub async fn fetch(&self) -> Result<Scenario, ClientError> {
        let body = GetScenario {
            scope: self.settings.scope.clone(),
        };
        let response = self.post(GET_SCENARIO_PATH, &body).await?;
        Ok(response.json().await?)
    }

    /// Check that the scenario is done: every fixture hit at least once, or every pool/stack
    /// step consumed. Fails with [`ClientError::Incomplete`] listing what never came.
    pub async fn done(&self) -> Result<(), ClientError> {
        let scenario = self.fetch().await?;
        scenario.verify().into_result()?;
        Ok(())
    }

    async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.settings.server.trim_end_matches('/'), path);
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Rejected { status, body })
        }
    }
}
