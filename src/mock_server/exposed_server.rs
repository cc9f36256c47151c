use crate::mock_server::bare_server::BareMockServer;
use crate::mock_server::MockServerBuilder;
use crate::scenario::Scenario;
use crate::scenario_store::UnknownScope;
use crate::verification::VerificationOutcome;
use log::debug;
use std::net::SocketAddr;

/// An HTTP web-server running in the background, answering requests according to the
/// [`Scenario`]s installed on its scopes.
///
/// Scenarios can be installed in-process with [`MockServer::set_scenario`] or remotely, by
/// any process, through the `POST /scenario/set` endpoint (see [`ScenarioClient`]).
/// Every other request is dispatched to the scenario of its scope:
/// - the scope named by the `x-test-mock-api-scope` header, if present;
/// - otherwise the scope named by a `/scope-<name>` path prefix, which is stripped before
///   matching;
/// - otherwise the `default` scope.
///
/// ### Example:
/// ```rust
/// use scenario_mock::{Expectation, MockServer, Mode, ResponseTemplate, Scenario};
///
/// #[async_std::main]
/// async fn main() {
///     // Arrange
///     let mock_server = MockServer::start().await;
///     let scenario = Scenario::new(Mode::Fixture)
///         .with(Expectation::given("GET", "/hello").respond_with(ResponseTemplate::new(200)));
///     mock_server.set_scenario("default", scenario).await;
///
///     // Act
///     let status = reqwest::get(format!("{}/hello", &mock_server.uri()))
///         .await
///         .unwrap()
///         .status();
///
///     // Assert
///     assert_eq!(status, 200);
///     mock_server.verify("default").await;
/// }
/// ```
///
/// [`ScenarioClient`]: crate::ScenarioClient
pub struct MockServer(BareMockServer);

impl MockServer {
    pub(super) fn new(server: BareMockServer) -> Self {
        Self(server)
    }

    /// You can use `MockServer::builder` if you need to specify custom configuration - e.g.
    /// run on a specific port or use another scope header.
    ///
    /// If this is not your case, use [`MockServer::start`].
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Start a new instance of a `MockServer` listening on a random port.
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Install `scenario` on `scope`, replacing any scenario previously set for it.
    pub async fn set_scenario<S: Into<String>>(&self, scope: S, scenario: Scenario) {
        self.0.set_scenario(scope.into(), scenario).await
    }

    /// The scenario currently installed on `scope`, with its live hit counters.
    pub async fn scenario(&self, scope: &str) -> Result<Scenario, UnknownScope> {
        self.0.scenario(scope).await
    }

    /// Drop the scenarios of all scopes.
    pub async fn reset(&self) {
        self.0.reset().await;
    }

    /// Verify that the scenario installed on `scope` is done. Panics otherwise, listing the
    /// requests that were expected but never came.
    pub async fn verify(&self, scope: &str) {
        debug!("Verify the scenario of scope `{}`.", scope);
        let error_message = match self.0.scenario(scope).await {
            Ok(scenario) => match scenario.verify().into_result() {
                Ok(()) => return,
                Err(incomplete) => format!("Verification failed for scope `{}`:\n{}", scope, incomplete),
            },
            Err(unknown) => format!("Verification failed: {}", unknown),
        };
        if std::thread::panicking() {
            debug!("{}", &error_message);
        } else {
            panic!("{}", &error_message);
        }
    }

    /// Run the completion check on `scope` without panicking.
    pub async fn verification(&self, scope: &str) -> Result<VerificationOutcome, UnknownScope> {
        Ok(self.0.scenario(scope).await?.verify())
    }

    /// Return the base uri of this running instance of `MockServer`, e.g. `http://127.0.0.1:4372`.
    ///
    /// Use this method to compose uris when interacting with this instance of `MockServer` via
    /// an HTTP client.
    pub fn uri(&self) -> String {
        self.0.uri()
    }

    /// Return the base uri of `scope`, e.g. `http://127.0.0.1:4372/scope-users`.
    ///
    /// Requests sent below this uri are dispatched to the scenario of `scope`.
    pub fn scope_uri(&self, scope: &str) -> String {
        format!("{}/scope-{}", self.0.uri(), scope)
    }

    /// Return the socket address of this running instance of `MockServer`, e.g. `127.0.0.1:4372`.
    pub fn address(&self) -> &SocketAddr {
        self.0.address()
    }

    /// The name of the header selecting the scope of a request.
    pub fn scope_header(&self) -> &str {
        self.0.scope_header()
    }
}
