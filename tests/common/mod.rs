#![allow(dead_code)]

use reddit_oauth::Config;
use wiremock::{MockServer, Request};

pub const APP_ID: &str = "app";
pub const APP_SECRET: &str = "secret";
pub const REDIRECT_URI: &str = "http://localhost:8080/cb";

/// Stand-ins for `oauth.<provider>` and `ssl.<provider>`.
pub struct Hosts {
    pub auth: MockServer,
    pub public: MockServer,
}

impl Hosts {
    pub async fn start() -> Self {
        Self {
            auth: MockServer::start().await,
            public: MockServer::start().await,
        }
    }

    pub fn config(&self) -> Config {
        Config::from_values(APP_ID, APP_SECRET, REDIRECT_URI)
            .with_user_agent("integration-tests/1.0")
            .with_base_urls(self.auth.uri(), self.public.uri())
    }

    pub async fn public_requests(&self) -> Vec<Request> {
        self.public.received_requests().await.unwrap_or_default()
    }

    pub async fn auth_requests(&self) -> Vec<Request> {
        self.auth.received_requests().await.unwrap_or_default()
    }
}

pub fn authorization(req: &Request) -> Option<String> {
    req.headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}
