//! `scenario_mock` is a programmable HTTP mock server for black-box testing: a test installs
//! a *scenario* (a list of expected requests and canned responses), exercises its real code
//! against the server, and finally checks that everything it expected actually happened.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Modes](#modes)
//! 3. [Matching](#matching)
//! 4. [Scopes](#scopes)
//! 5. [Remote control](#remote-control)
//!
//! ## Getting started
//! ```rust
//! use scenario_mock::{Expectation, MockServer, Mode, ResponseTemplate, Scenario};
//! use serde_json::json;
//!
//! #[async_std::main]
//! async fn main() {
//!     // Start a background HTTP server on a random local port
//!     let mock_server = MockServer::start().await;
//!
//!     // Arrange the behaviour of the MockServer: a fixture answering `GET /users/:id`.
//!     let scenario = Scenario::new(Mode::Fixture).with(
//!         Expectation::given("GET", "/users/:id")
//!             .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Ada" }))),
//!     );
//!     mock_server.set_scenario("default", scenario).await;
//!
//!     // If we probe the MockServer using any HTTP client it behaves as expected.
//!     let response = reqwest::get(format!("{}/users/1", &mock_server.uri()))
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status(), 200);
//!
//!     // A request that matches no expectation gets a 500 explaining why.
//!     let response = reqwest::get(format!("{}/missing", &mock_server.uri()))
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status(), 500);
//!
//!     // Every fixture was hit at least once: the scenario is done.
//!     mock_server.verify("default").await;
//! }
//! ```
//!
//! ## Modes
//!
//! Each [`Scenario`] runs in one [`Mode`]:
//! - [`Mode::Fixture`]: expectations answer any number of requests, in any order. The
//!   scenario is done when every expectation was hit at least once.
//! - [`Mode::Pool`]: each expectation answers exactly one request, in any order.
//! - [`Mode::Stack`]: each expectation answers exactly one request, in the declared order.
//!   The first out-of-order request fails and the step it was checked against is consumed.
//!
//! Pool and stack scenarios are done when every expectation has been consumed.
//!
//! ## Matching
//!
//! Only the method and the path of a request are matched. Both accept the `*` wildcard and
//! paths accept `:name` parameters. When several fixtures match, the most specific one
//! answers - see the [`matchers`] module.
//!
//! ## Scopes
//!
//! A single server hosts many independent scenarios, one per *scope*. A request is routed
//! to the scope named by its `x-test-mock-api-scope` header, or by a `/scope-<name>` path
//! prefix, or to the `default` scope.
//!
//! ## Remote control
//!
//! Scenarios can be installed and fetched over HTTP (`POST /scenario/set`,
//! `POST /scenario/get`), which lets a test process drive a server it did not start -
//! [`ScenarioClient`] does exactly that.
mod client;
pub mod control;
mod dispatch;
mod expectation;
pub mod http;
pub mod matchers;
mod mock_server;
mod request;
mod response_template;
mod scenario;
mod scenario_store;
mod scope;
mod verification;

pub use client::{ClientError, ClientSettings, ScenarioClient};
pub use dispatch::{select, DispatchFailure, FailureKind};
pub use expectation::{Expectation, MatchCriteria, WILDCARD};
pub use mock_server::{
    MockServer, MockServerBuilder, BODY_PRINT_LIMIT_ENV, DEFAULT_BODY_SIZE_LIMIT,
};
pub use request::{BodyPrintLimit, MatchableRequest};
pub use response_template::{MockResponse, ResponseTemplate, DEFAULT_STATUS};
pub use scenario::{Mode, Scenario};
pub use scenario_store::{UnknownScope, DEFAULT_SCOPE};
pub use scope::SCOPE_HEADER;
pub use verification::{IncompleteScenario, VerificationOutcome};
