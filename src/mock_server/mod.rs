//! All bits and pieces concerning the HTTP mock server are in this module.
//!
//! `bare_server::BareMockServer` is the "front-end" to drive behaviour for the `hyper` HTTP
//! server running in the background, defined in the `hyper` sub-module.
//!
//! `bare_server::BareMockServer` is not exposed directly: crate users only get to interact with
//! `exposed_server::MockServer`, assembled with `builder::MockServerBuilder`.
mod bare_server;
mod builder;
mod exposed_server;
mod hyper;

pub use builder::{MockServerBuilder, BODY_PRINT_LIMIT_ENV, DEFAULT_BODY_SIZE_LIMIT};
pub use exposed_server::MockServer;
