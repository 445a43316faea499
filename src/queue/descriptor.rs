use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};

use crate::errors::Error;
use crate::types::ApiResponse;

/// One outbound call, fully resolved: target, headers and body are fixed
/// when the descriptor is built and never change while it waits in the queue.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
}

impl RequestDescriptor {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What the transport hands back when the server answered at all.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Parses a 200 body. Invalid JSON fails the whole call.
    pub fn into_api_response(self) -> Result<ApiResponse, Error> {
        match serde_json::from_str(&self.body) {
            Ok(json) => Ok(ApiResponse {
                status: self.status,
                headers: self.headers,
                body: self.body,
                json,
            }),
            Err(source) => Err(Error::MalformedResponse {
                source,
                body: self.body,
            }),
        }
    }

    pub fn into_error(self) -> Error {
        if self.status == StatusCode::UNAUTHORIZED {
            Error::Unauthorized { body: self.body }
        } else {
            Error::Status {
                status: self.status,
                headers: self.headers,
                body: self.body,
            }
        }
    }
}
