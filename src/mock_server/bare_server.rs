use crate::mock_server::hyper::run_server;
use crate::request::BodyPrintLimit;
use crate::scenario::Scenario;
use crate::scenario_store::{ScenarioStore, UnknownScope};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

/// Everything the request handlers need, shared between the [`BareMockServer`] front-end and
/// the `hyper` server running in the background.
pub(crate) struct MockServerState {
    pub(super) store: ScenarioStore,
    pub(super) scope_header: String,
    pub(super) body_print_limit: BodyPrintLimit,
    pub(super) body_size_limit: usize,
}

/// An HTTP web-server running in the background, answering requests according to the
/// scenarios installed on each scope.
///
/// `BareMockServer` is the actual mock server behind the publicly-exposed `MockServer`.
pub(crate) struct BareMockServer {
    state: Arc<MockServerState>,
    server_address: SocketAddr,
    // When `_shutdown_trigger` gets dropped the listening server terminates gracefully.
    _shutdown_trigger: tokio::sync::oneshot::Sender<()>,
}

impl BareMockServer {
    /// Start a new instance of a `BareMockServer` listening on the specified
    /// [`TcpListener`](std::net::TcpListener).
    ///
    /// The server runs on a dedicated thread with its own `tokio` runtime: it works no matter
    /// which executor (if any) the caller is using.
    pub(super) async fn start(
        listener: TcpListener,
        scope_header: String,
        body_print_limit: BodyPrintLimit,
        body_size_limit: usize,
    ) -> Self {
        let (shutdown_trigger, shutdown_receiver) = tokio::sync::oneshot::channel();
        let server_address = listener
            .local_addr()
            .expect("Failed to get server address.");
        let state = Arc::new(MockServerState {
            store: ScenarioStore::new(),
            scope_header,
            body_print_limit,
            body_size_limit,
        });

        let server_state = state.clone();
        std::thread::spawn(move || {
            let server_future = run_server(listener, server_state, shutdown_receiver);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Cannot build local tokio runtime");

            runtime.block_on(server_future)
        });

        Self {
            state,
            server_address,
            _shutdown_trigger: shutdown_trigger,
        }
    }

    pub(crate) async fn set_scenario(&self, scope: String, scenario: Scenario) {
        self.state.store.set(scope, scenario).await;
    }

    pub(crate) async fn scenario(&self, scope: &str) -> Result<Scenario, UnknownScope> {
        self.state.store.get(scope).await
    }

    /// Drop all scenarios from an instance of `BareMockServer`.
    pub(crate) async fn reset(&self) {
        self.state.store.reset().await;
    }

    /// Return the base uri of this running instance of `BareMockServer`, e.g. `http://127.0.0.1:4372`.
    pub(crate) fn uri(&self) -> String {
        format!("http://{}", self.server_address)
    }

    /// Return the socket address of this running instance of `BareMockServer`, e.g. `127.0.0.1:4372`.
    pub(crate) fn address(&self) -> &SocketAddr {
        &self.server_address
    }

    pub(crate) fn scope_header(&self) -> &str {
        &self.state.scope_header
    }
}
