use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::Error;
use crate::telemetry::refresh::{RefreshOutcome, RefreshTelemetry};

use super::{Credentials, TokenSnapshot};

/// Tokens freshly issued by the token endpoint.
#[derive(Clone, Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Owns the credential state and serializes refreshes.
///
/// Reads and writes of the tokens take a short synchronous lock that is never
/// held across an await. Refreshes additionally hold an async lock for their
/// whole duration, so concurrent 401s share a single refresh grant.
pub struct TokenGuard {
    credentials: Mutex<Credentials>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TokenGuard {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn credentials(&self) -> MutexGuard<'_, Credentials> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        self.credentials().to_snapshot()
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials().access_token().map(str::to_owned)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.credentials().refresh_token().is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_authenticated()
    }

    pub fn clear(&self) {
        self.credentials().clear();
    }

    pub fn store(&self, issued: IssuedTokens) {
        self.credentials()
            .store(issued.access_token, issued.refresh_token);
    }

    /// Runs `refresh_cb` with the current refresh token, at most one at a time.
    ///
    /// Unless `force_refresh` is set, a waiter that finds an access token
    /// different from `stale_token` returns [`RefreshOutcome::Shared`]
    /// without calling the token endpoint again.
    pub async fn ensure_fresh<F, Fut>(
        &self,
        force_refresh: bool,
        stale_token: Option<&str>,
        refresh_cb: F,
        telemetry: &RefreshTelemetry,
    ) -> Result<RefreshOutcome, Error>
    where
        F: FnOnce(String) -> Fut + Send,
        Fut: Future<Output = Result<IssuedTokens, Error>> + Send,
    {
        let _flight = self.refresh_lock.lock().await;

        let refresh_token = {
            let mut creds = self.credentials();
            if !force_refresh
                && let Some(current) = creds.access_token()
                && Some(current) != stale_token
            {
                debug!(
                    attempt_id = %telemetry.attempt_id(),
                    context = %telemetry.context(),
                    "refresh.shared"
                );
                return Ok(RefreshOutcome::Shared);
            }
            let Some(refresh_token) = creds.refresh_token().map(str::to_owned) else {
                let err = Error::MissingRefreshToken;
                telemetry.emit_failure(&err);
                return Err(err);
            };
            creds.clear_access();
            refresh_token
        };

        telemetry.emit_start();
        match refresh_cb(refresh_token).await {
            Ok(issued) => {
                self.store(issued);
                telemetry.emit_success(RefreshOutcome::Refreshed);
                Ok(RefreshOutcome::Refreshed)
            }
            Err(err) => {
                telemetry.emit_failure(&err);
                Err(err)
            }
        }
    }
}
