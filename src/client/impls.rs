use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use tracing::{info, warn};

use crate::{
    AuthClient,
    client::ClientShared,
    config::Config,
    errors::Error,
    queue::{Completion, RequestDescriptor, RequestQueue},
    request_context::{RequestContext, RequestOptions},
    telemetry::refresh::RefreshTelemetry,
    token::{Credentials, TokenGuard, TokenSnapshot},
    transport::{ReqwestTransport, Transport},
    types::ApiResponse,
};

impl AuthClient {
    /// Create a client that talks to the provider over reqwest.
    ///
    /// Must be called inside a tokio runtime: the request queue spawns its
    /// dispatch task immediately.
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_transport(config, ReqwestTransport::default())
    }

    pub fn with_transport<T: Transport>(config: Config, transport: T) -> Result<Self, Error> {
        config.validate()?;
        let queue = RequestQueue::spawn(transport, config.request_buffer(), config.min_interval())?;
        let guard = TokenGuard::new(Credentials::new(
            config.access_token.clone(),
            config.refresh_token.clone(),
        ));
        info!(
            capacity = queue.capacity(),
            min_interval_ms = config.min_interval_ms.unwrap_or(0),
            authenticated = guard.is_authenticated(),
            "client.ready"
        );
        Ok(Self {
            shared: Arc::new(ClientShared {
                app_id: config.app_id.clone(),
                app_secret: config.app_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                user_agent: config.user_agent().to_string(),
                auth_base_url: config.auth_base_url(),
                public_base_url: config.public_base_url(),
                guard,
                queue,
            }),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.guard.is_authenticated()
    }

    /// Current tokens, for callers that persist sessions themselves.
    pub fn tokens(&self) -> TokenSnapshot {
        self.shared.guard.snapshot()
    }

    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// Requests currently pending or in flight.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Enqueue a request without waiting for it.
    ///
    /// Fails synchronously with [`Error::QueueFull`] when the queue is at
    /// capacity. Awaiting the returned [`PendingRequest`] yields the result,
    /// including the transparent refresh-and-retry on an expired token.
    pub fn submit(&self, path: &str, options: RequestOptions) -> Result<PendingRequest, Error> {
        self.dispatch(RequestContext::original(path, options))
    }

    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, Error> {
        self.submit(path, options)?.await
    }

    /// GET with `params` in the query string.
    pub async fn get<K, V>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<ApiResponse, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.request(path, RequestOptions::new().query(params)).await
    }

    /// POST with `params` form-encoded in the body.
    pub async fn post<K, V>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<ApiResponse, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.request(path, RequestOptions::new().method(Method::POST).form(params))
            .await
    }

    pub(crate) fn dispatch(&self, context: RequestContext) -> Result<PendingRequest, Error> {
        let (completion, sent_token) = self.enqueue(&context)?;
        Ok(PendingRequest {
            client: self.clone(),
            context,
            completion,
            sent_token,
        })
    }

    fn enqueue(&self, context: &RequestContext) -> Result<(Completion, Option<String>), Error> {
        let (descriptor, sent_token) = self.build_descriptor(context)?;
        let completion = self.shared.queue.add(descriptor).inspect_err(|err| {
            warn!(path = %context.path, error = %err, "request.rejected");
        })?;
        Ok((completion, sent_token))
    }

    /// Resolves host and headers from the authentication state at this moment.
    /// Also returns the bearer token that was attached, if any.
    pub(crate) fn build_descriptor(
        &self,
        context: &RequestContext,
    ) -> Result<(RequestDescriptor, Option<String>), Error> {
        let options = &context.options;
        let access_token = self.shared.guard.access_token();

        let raw_url = match &options.url {
            Some(url) => url.clone(),
            None => {
                let base = if access_token.is_some() {
                    &self.shared.auth_base_url
                } else {
                    &self.shared.public_base_url
                };
                format!("{}/{}", base, context.path.trim_start_matches('/'))
            }
        };
        let url = Url::parse(&raw_url)
            .map_err(|e| Error::Config(format!("Invalid request URL '{raw_url}': {e}")))?;

        // Explicit basic auth (token grants) wins over the bearer token.
        let sent_token = match options.basic_auth {
            Some(_) => None,
            None => access_token,
        };

        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case("user-agent")
                    && !(sent_token.is_some() && name.eq_ignore_ascii_case("authorization"))
            })
            .cloned()
            .collect();
        headers.push(("User-Agent".to_string(), self.shared.user_agent.clone()));
        if let Some(token) = &sent_token {
            headers.push(("Authorization".to_string(), format!("bearer {token}")));
        }

        let descriptor = RequestDescriptor {
            method: options.method.clone().unwrap_or(Method::GET),
            url,
            headers,
            query: options.query.clone(),
            form: options.form.clone(),
            basic_auth: options.basic_auth.clone(),
        };
        Ok((descriptor, sent_token))
    }
}

/// A request sitting in the queue (or being retried after a refresh).
///
/// Await it to get the result. Dropping it discards the result; the request
/// itself still goes out.
pub struct PendingRequest {
    client: AuthClient,
    context: RequestContext,
    completion: Completion,
    sent_token: Option<String>,
}

impl PendingRequest {
    async fn resolve(mut self) -> Result<ApiResponse, Error> {
        loop {
            let raw = self.completion.wait().await?;
            if raw.status == StatusCode::OK {
                return raw.into_api_response();
            }

            if raw.status == StatusCode::UNAUTHORIZED
                && self.context.may_refresh()
                && self.client.shared.guard.has_refresh_token()
            {
                warn!(
                    path = %self.context.path,
                    status = raw.status.as_u16(),
                    "request.unauthorized: refreshing access token"
                );
                let telemetry = RefreshTelemetry::new(format!("retry {}", self.context.path));
                if let Err(err) = self
                    .client
                    .refresh_with(false, self.sent_token.as_deref(), &telemetry)
                    .await
                {
                    warn!(
                        path = %self.context.path,
                        error = %err,
                        "request.refresh_failed: returning original response"
                    );
                    return Err(raw.into_error());
                }

                self.context = self.context.into_retry();
                let (completion, sent_token) = self.client.enqueue(&self.context)?;
                self.completion = completion;
                self.sent_token = sent_token;
                continue;
            }

            warn!(
                path = %self.context.path,
                status = raw.status.as_u16(),
                attempt = ?self.context.attempt,
                body = %raw.body,
                "request.failed"
            );
            return Err(raw.into_error());
        }
    }
}

impl IntoFuture for PendingRequest {
    type Output = Result<ApiResponse, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.resolve())
    }
}
