use std::future::Future;

use reqwest::Client;

use crate::errors::Error;
use crate::queue::{RawResponse, RequestDescriptor};

/// The single capability the dispatch loop needs: run one request to completion.
///
/// Implementations are called at most once per dispatched descriptor and must
/// not retry on their own.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send {
        let client = self.http_client.clone();
        async move {
            let RequestDescriptor {
                method,
                url,
                headers,
                query,
                form,
                basic_auth,
            } = request;

            let mut builder = client.request(method, url);
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !query.is_empty() {
                builder = builder.query(&query);
            }
            if !form.is_empty() {
                builder = builder.form(&form);
            }
            if let Some((username, password)) = basic_auth {
                builder = builder.basic_auth(username, Some(password));
            }

            let resp = builder.send().await?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.text().await?;
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        }
    }
}
