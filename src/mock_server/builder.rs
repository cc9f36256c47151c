use crate::mock_server::bare_server::BareMockServer;
use crate::request::BodyPrintLimit;
use crate::scope::SCOPE_HEADER;
use crate::MockServer;
use std::env;
use std::net::TcpListener;

/// Environment variable overriding the default [`BodyPrintLimit`].
pub const BODY_PRINT_LIMIT_ENV: &str = "SCENARIO_MOCK_BODY_PRINT_LIMIT";

/// Largest request body the server reads by default: 200 MB.
pub const DEFAULT_BODY_SIZE_LIMIT: usize = 200 * 1024 * 1024;

/// A builder providing a fluent API to assemble a [`MockServer`] step-by-step.
/// Use [`MockServer::builder`] to get started.
pub struct MockServerBuilder {
    listener: Option<TcpListener>,
    port: Option<u16>,
    scope_header: String,
    body_print_limit: BodyPrintLimit,
    body_size_limit: usize,
}

impl MockServerBuilder {
    pub(super) fn new() -> Self {
        let body_print_limit = match env::var(BODY_PRINT_LIMIT_ENV)
            .ok()
            .and_then(|x| x.parse::<usize>().ok())
        {
            Some(limit) => BodyPrintLimit::Limited(limit),
            None => BodyPrintLimit::default(),
        };
        Self {
            listener: None,
            port: None,
            scope_header: SCOPE_HEADER.to_string(),
            body_print_limit,
            body_size_limit: DEFAULT_BODY_SIZE_LIMIT,
        }
    }

    /// Each instance of [`MockServer`] is, by default, running on a random
    /// port available on your local machine.
    /// With `MockServerBuilder::listener` you can choose to start the `MockServer`
    /// instance on a specific port you have already bound.
    ///
    /// ### Example:
    /// ```rust
    /// use scenario_mock::MockServer;
    ///
    /// #[async_std::main]
    /// async fn main() {
    ///     // Arrange
    ///     let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    ///     let expected_server_address = listener
    ///         .local_addr()
    ///         .expect("Failed to get server address.");
    ///
    ///     // Act
    ///     let mock_server = MockServer::builder().listener(listener).start().await;
    ///
    ///     // Assert
    ///     assert_eq!(&expected_server_address, mock_server.address());
    /// }
    /// ```
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Listen on `127.0.0.1:<port>`. Ignored if a [`listener`](Self::listener) was provided.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The header that selects the scope of a mock request.
    /// Defaults to `x-test-mock-api-scope`.
    pub fn scope_header<T: Into<String>>(mut self, name: T) -> Self {
        self.scope_header = name.into().to_ascii_lowercase();
        self
    }

    /// The mock server includes the requests it could not answer in its logs and in its
    /// error responses. By default, the size of the printed body is limited.
    ///
    /// You may want to change this if you're working with services with very large
    /// bodies. You can also configure this limit with the
    /// `SCENARIO_MOCK_BODY_PRINT_LIMIT` environment variable.
    pub fn body_print_limit(mut self, limit: BodyPrintLimit) -> Self {
        self.body_print_limit = limit;
        self
    }

    /// Requests whose body is larger than `limit` bytes are answered with a `500`.
    /// Defaults to 200 MB.
    pub fn body_size_limit(mut self, limit: usize) -> Self {
        self.body_size_limit = limit;
        self
    }

    /// Finalise the builder to get an instance of a [`BareMockServer`].
    pub(super) async fn build_bare(self) -> BareMockServer {
        let listener = match (self.listener, self.port) {
            (Some(listener), _) => listener,
            (None, Some(port)) => TcpListener::bind(("127.0.0.1", port))
                .unwrap_or_else(|e| panic!("Failed to bind port {} for a mock server: {}", port, e)),
            (None, None) => TcpListener::bind("127.0.0.1:0")
                .expect("Failed to bind an OS port for a mock server."),
        };
        BareMockServer::start(
            listener,
            self.scope_header,
            self.body_print_limit,
            self.body_size_limit,
        )
        .await
    }

    /// Finalise the builder and launch the [`MockServer`] instance!
    ///
    /// Panics if the requested port cannot be bound.
    pub async fn start(self) -> MockServer {
        MockServer::new(self.build_bare().await)
    }
}
