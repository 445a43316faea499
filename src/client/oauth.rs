use reqwest::Method;
use tracing::{info, warn};
use urlencoding::encode;

use crate::{
    AuthClient,
    client::{ACCESS_TOKEN_PATH, AUTHORIZE_PATH},
    errors::Error,
    request_context::{RequestContext, RequestOptions},
    telemetry::refresh::{RefreshOutcome, RefreshTelemetry},
    token::IssuedTokens,
    types::{AuthorizationCallback, TokenResponse},
};

impl AuthClient {
    /// Password grant. Clears both tokens first; on success only an access
    /// token is stored, since this grant yields no refresh token.
    pub async fn password_authenticate(&self, username: &str, password: &str) -> Result<(), Error> {
        self.shared.guard.clear();
        let issued = self
            .token_grant(vec![
                ("grant_type", "password".to_string()),
                ("username", username.to_string()),
                ("password", password.to_string()),
            ])
            .await
            .map_err(|err| {
                warn!(error = %err, "password grant failed");
                Error::AuthFailure(Box::new(err))
            })?;
        info!("password grant ok (token len={})", issued.access_token.len());
        self.shared.guard.store(IssuedTokens {
            access_token: issued.access_token,
            refresh_token: None,
        });
        Ok(())
    }

    /// URL to send the user's browser to for the authorization-code flow.
    pub fn build_authorization_url<I, S>(&self, state: &str, scopes: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}{AUTHORIZE_PATH}?client_id={}&response_type=code&state={}&redirect_uri={}&duration=permanent&scope={}",
            self.shared.public_base_url,
            encode(&self.shared.app_id),
            encode(state),
            encode(&self.shared.redirect_uri),
            encode(&scope),
        )
    }

    /// Exchanges the code from the provider's redirect for access and refresh
    /// tokens.
    ///
    /// The state and code are checked before anything else: a mismatch
    /// leaves the current tokens untouched and sends nothing.
    pub async fn exchange_authorization_code(
        &self,
        expected_state: &str,
        callback: &AuthorizationCallback,
    ) -> Result<(), Error> {
        if callback.state.as_deref() != Some(expected_state) {
            warn!(
                expected = expected_state,
                received = ?callback.state,
                "authorization callback state mismatch"
            );
            return Err(Error::StateMismatch(
                "state parameter does not match".to_string(),
            ));
        }
        let Some(code) = callback.code.as_deref().filter(|c| !c.is_empty()) else {
            let reason = match &callback.error {
                Some(error) => format!("provider returned error '{error}'"),
                None => "authorization code missing".to_string(),
            };
            warn!("authorization callback rejected: {}", reason);
            return Err(Error::StateMismatch(reason));
        };

        self.shared.guard.clear();
        let issued = self
            .token_grant(vec![
                ("grant_type", "authorization_code".to_string()),
                ("code", code.to_string()),
                ("redirect_uri", self.shared.redirect_uri.clone()),
            ])
            .await
            .map_err(|err| {
                warn!(error = %err, "authorization code exchange failed");
                Error::AuthFailure(Box::new(err))
            })?;
        info!(
            "authorization code exchanged (token len={}, refresh_token={})",
            issued.access_token.len(),
            issued.refresh_token.is_some()
        );
        self.shared.guard.store(issued);
        Ok(())
    }

    /// Swaps the refresh token for a new access token. The refresh token is
    /// kept unless the server rotates it.
    pub async fn refresh_access_token(&self) -> Result<(), Error> {
        let telemetry = RefreshTelemetry::new("refresh_access_token");
        self.refresh_with(true, None, &telemetry)
            .await
            .map(|_| ())
            .map_err(|err| Error::AuthFailure(Box::new(err)))
    }

    pub(crate) async fn refresh_with(
        &self,
        force_refresh: bool,
        stale_token: Option<&str>,
        telemetry: &RefreshTelemetry,
    ) -> Result<RefreshOutcome, Error> {
        let client = self.clone();
        self.shared
            .guard
            .ensure_fresh(
                force_refresh,
                stale_token,
                move |refresh_token| async move {
                    client
                        .token_grant(vec![
                            ("grant_type", "refresh_token".to_string()),
                            ("refresh_token", refresh_token),
                        ])
                        .await
                },
                telemetry,
            )
            .await
    }

    /// POSTs a grant to the token endpoint with the app's basic-auth
    /// credentials. Runs as a token-grant attempt, so a 401 here is final.
    async fn token_grant(&self, grant: Vec<(&'static str, String)>) -> Result<IssuedTokens, Error> {
        let options = RequestOptions::new()
            .method(Method::POST)
            .form(grant)
            .basic_auth(self.shared.app_id.clone(), self.shared.app_secret.clone());
        let response = self
            .dispatch(RequestContext::token_grant(ACCESS_TOKEN_PATH, options))?
            .await?;
        let token: TokenResponse = response.parse()?;
        if let Some(reason) = token.error {
            return Err(Error::GrantRejected(reason));
        }
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::GrantRejected("response has no access_token".to_string()))?;
        Ok(IssuedTokens {
            access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
        })
    }
}
