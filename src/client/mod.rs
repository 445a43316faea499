use std::sync::Arc;

use crate::queue::RequestQueue;
use crate::token::TokenGuard;

mod impls;
mod oauth;

pub use impls::PendingRequest;

pub(crate) const ACCESS_TOKEN_PATH: &str = "/api/v1/access_token";
pub(crate) const AUTHORIZE_PATH: &str = "/api/v1/authorize";

/// Authenticated, throttled client for the provider's REST API.
///
/// Cloning is cheap; clones share the credential state and the request queue.
#[derive(Clone)]
pub struct AuthClient {
    shared: Arc<ClientShared>,
}

struct ClientShared {
    app_id: String,
    app_secret: String,
    redirect_uri: String,
    user_agent: String,
    auth_base_url: String,
    public_base_url: String,
    guard: TokenGuard,
    queue: RequestQueue,
}
