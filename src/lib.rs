//! Authenticated, throttled HTTP client for the reddit OAuth API.
//!
//! All outbound calls go through one [`queue::RequestQueue`]: one request in
//! flight at a time, FIFO order, a configurable minimum interval between
//! dispatches, and a hard capacity. [`AuthClient`] owns the OAuth tokens.
//! It picks the host and `Authorization` header from the current state. When
//! the server answers 401 and a refresh token is held, it refreshes once and
//! retries the original request once.

mod client;
pub mod config;
mod errors;
pub mod queue;
pub mod request_context;
pub mod telemetry;
pub mod token;
pub mod transport;
pub mod types;

pub use client::{AuthClient, PendingRequest};
pub use config::{Config, ConfigLocation, read_config};
pub use errors::Error;
pub use request_context::RequestOptions;
pub use token::TokenSnapshot;
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiResponse, AuthorizationCallback};

#[cfg(test)]
mod tests;
