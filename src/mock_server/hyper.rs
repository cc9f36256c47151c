use crate::control::{GetScenario, SetScenario, GET_SCENARIO_PATH, SET_SCENARIO_PATH};
use crate::dispatch::dispatch;
use crate::mock_server::bare_server::MockServerState;
use crate::request::MatchableRequest;
use crate::response_template::MockResponse;
use crate::scope;
use http::{Method, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use log::{debug, error, warn};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;

/// Failures that are not part of the mock protocol: they are turned into plain error
/// responses at the service boundary.
#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error("Failed to read the request body: {0}")]
    Body(Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid remote-control request: {0}")]
    InvalidControlRequest(serde_json::Error),
    #[error("Failed to serialize the response: {0}")]
    Serialization(serde_json::Error),
}

/// The actual HTTP server responding to incoming requests according to the installed scenarios.
pub(super) async fn run_server(
    listener: std::net::TcpListener,
    server_state: Arc<MockServerState>,
    mut shutdown_signal: tokio::sync::oneshot::Receiver<()>,
) {
    let listener = match listener
        .set_nonblocking(true)
        .and_then(|_| tokio::net::TcpListener::from_std(listener))
    {
        Ok(listener) => listener,
        Err(e) => {
            error!("Mock server failed to start listening: {}", e);
            return;
        }
    };
    loop {
        let stream = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Failed to accept a connection: {}", e);
                    continue;
                }
            },
            // This resolves when either:
            // - the sender half of the channel gets dropped (i.e. MockServer is dropped)
            // - the sender is used, therefore sending a poison pill willingly as a shutdown signal
            _ = &mut shutdown_signal => break,
        };

        let server_state = server_state.clone();
        tokio::spawn(async move {
            let service = service_fn(move |request: hyper::Request<Incoming>| {
                let server_state = server_state.clone();
                async move { Ok::<_, Infallible>(handle_request(&server_state, request).await) }
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Error while serving a connection: {}", e);
            }
        });
    }
    debug!("Mock server shutting down.");
}

async fn handle_request(
    state: &MockServerState,
    request: hyper::Request<Incoming>,
) -> Response<Full<Bytes>> {
    match route(state, request).await {
        Ok(response) => response,
        Err(ServerError::InvalidControlRequest(e)) => {
            warn!("Rejected a remote-control request: {}", e);
            MockResponse::json(
                StatusCode::BAD_REQUEST,
                json!({ "code": "invalid_control_request", "message": e.to_string() }),
            )
            .into_http()
        }
        Err(e) => {
            error!("uncaught_error: {}", e);
            MockResponse::json(StatusCode::INTERNAL_SERVER_ERROR, json!({})).into_http()
        }
    }
}

async fn route(
    state: &MockServerState,
    request: hyper::Request<Incoming>,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let (parts, body) = request.into_parts();
    let body = Limited::new(body, state.body_size_limit)
        .collect()
        .await
        .map_err(ServerError::Body)?
        .to_bytes()
        .to_vec();

    if parts.method == Method::POST && parts.uri.path() == SET_SCENARIO_PATH {
        let SetScenario { scope, scenario } =
            serde_json::from_slice(&body).map_err(ServerError::InvalidControlRequest)?;
        state.store.set(scope, scenario).await;
        let mut response = Response::new(Full::default());
        *response.status_mut() = StatusCode::OK;
        return Ok(response);
    }

    if parts.method == Method::POST && parts.uri.path() == GET_SCENARIO_PATH {
        let GetScenario { scope } =
            serde_json::from_slice(&body).map_err(ServerError::InvalidControlRequest)?;
        debug!("Fetching the scenario for scope `{}`.", scope);
        let response = match state.store.get(&scope).await {
            Ok(scenario) => MockResponse::json(
                StatusCode::OK,
                serde_json::to_value(&scenario).map_err(ServerError::Serialization)?,
            ),
            Err(unknown) => {
                warn!("{}", unknown);
                let mut report = match serde_json::to_value(&unknown) {
                    Ok(Value::Object(map)) => map,
                    _ => Default::default(),
                };
                report.insert("code".into(), "unknown_scope".into());
                report.insert("message".into(), unknown.to_string().into());
                MockResponse::json(StatusCode::INTERNAL_SERVER_ERROR, Value::Object(report))
            }
        };
        return Ok(response.into_http());
    }

    let (scope, path) = scope::resolve(&parts.headers, parts.uri.path(), &state.scope_header);
    let request = MatchableRequest::from_parts(parts, path, body);
    if log::log_enabled!(log::Level::Debug) {
        let mut printed = String::new();
        if request
            .print_with_limit(&mut printed, state.body_print_limit)
            .is_ok()
        {
            debug!("Scope `{}`: handling request\n{}", scope, printed);
        }
    }

    let response = match dispatch(&state.store, &scope, &request).await {
        Ok(response) => response,
        Err(failure) => MockResponse::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            failure.report(state.body_print_limit),
        ),
    };
    Ok(response.into_http())
}
