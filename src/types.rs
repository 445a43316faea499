use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::Error;

/// A successful (200) API response with its body already parsed as JSON.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub json: serde_json::Value,
}

impl ApiResponse {
    /// Deserializes the payload into a caller-defined type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.json.clone()).map_err(|source| Error::MalformedResponse {
            source,
            body: self.body.clone(),
        })
    }
}

/// Body returned by `/api/v1/access_token`.
///
/// The provider signals a refused grant with a 200 and an `error` field, so
/// `access_token` is optional here and checked by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
}

/// Query parameters the provider appends to the redirect URI after the user
/// answers the authorization prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationCallback {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

impl AuthorizationCallback {
    pub fn new(state: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            code: Some(code.into()),
            error: None,
        }
    }

    pub fn from_redirect_url(url: &str) -> Result<Self, Error> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| Error::Config(format!("Invalid redirect URL '{url}': {e}")))?;
        let mut callback = Self::default();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "state" => callback.state = Some(value.into_owned()),
                "code" => callback.code = Some(value.into_owned()),
                "error" => callback.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(callback)
    }
}
