use serde::{Deserialize, Serialize};

/// Serializable copy of the current tokens, for callers that persist sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Mutable OAuth state. Only the client's completion handling writes to it.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Before a password or authorization-code grant.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }

    /// Before a refresh grant; the refresh token stays.
    pub fn clear_access(&mut self) {
        self.access_token = None;
    }

    pub fn store(&mut self, access_token: String, refresh_token: Option<String>) {
        self.access_token = Some(access_token);
        if let Some(refresh) = refresh_token {
            self.refresh_token = Some(refresh);
        }
    }

    pub fn to_snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}
