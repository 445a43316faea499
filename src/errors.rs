use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Network or timeout failure from the reqwest transport. Never retried.
    Http(reqwest::Error),
    Timeout(Duration),
    Config(String),
    QueueFull {
        capacity: usize,
    },
    QueueClosed,
    /// A 401 that could not be recovered by a refresh.
    Unauthorized {
        body: String,
    },
    /// Any other non-200 response, delivered with its raw payload.
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
    /// A 200 response whose body is not the expected JSON.
    MalformedResponse {
        source: serde_json::Error,
        body: String,
    },
    /// The token endpoint answered 200 but refused the grant.
    GrantRejected(String),
    MissingRefreshToken,
    /// A token grant or refresh failed; wraps the underlying cause.
    AuthFailure(Box<Error>),
    StateMismatch(String),
}

impl Error {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::Status { status, .. } => Some(*status),
            Error::MalformedResponse { .. } => Some(StatusCode::OK),
            Error::Http(err) => err.status(),
            Error::AuthFailure(cause) => cause.status(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Http(err) => write!(f, "transport error: {err}"),
            Error::Timeout(after) => write!(f, "request timed out after {after:?}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::QueueFull { capacity } => {
                write!(f, "request queue is full (capacity {capacity})")
            }
            Error::QueueClosed => write!(f, "request queue is closed"),
            Error::Unauthorized { body } => write!(f, "HTTP 401 Unauthorized: {body}"),
            Error::Status { status, body, .. } => write!(f, "HTTP {status}: {body}"),
            Error::MalformedResponse { source, .. } => {
                write!(f, "malformed response body: {source}")
            }
            Error::GrantRejected(reason) => write!(f, "token grant rejected: {reason}"),
            Error::MissingRefreshToken => write!(f, "no refresh token available"),
            Error::AuthFailure(cause) => write!(f, "authentication failed: {cause}"),
            Error::StateMismatch(msg) => write!(f, "authorization callback rejected: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Http(err) => Some(err),
            Error::MalformedResponse { source, .. } => Some(source),
            Error::AuthFailure(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}
