use reqwest::Method;

/// Caller-supplied shape of one request. Anything left unset gets the
/// client's defaults: GET, host picked from the authentication state.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    /// Full URL; bypasses host selection.
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    /// Replaces the bearer header when set.
    pub basic_auth: Option<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn form<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }
}

/// Where an in-flight request sits in the refresh-and-retry continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    /// First submission; a 401 may trigger one refresh.
    Original,
    /// Re-issued after a refresh; a 401 is final.
    RefreshRetry,
    /// A call against the token endpoint itself; never refreshes.
    TokenGrant,
}

/// Everything needed to (re)build a request, plus its retry state.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub path: String,
    pub options: RequestOptions,
    pub attempt: Attempt,
}

impl RequestContext {
    pub fn original(path: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            path: path.into(),
            options,
            attempt: Attempt::Original,
        }
    }

    pub fn token_grant(path: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            path: path.into(),
            options,
            attempt: Attempt::TokenGrant,
        }
    }

    pub fn may_refresh(&self) -> bool {
        self.attempt == Attempt::Original
    }

    /// The same request, marked so a further 401 will not recurse.
    pub fn into_retry(self) -> Self {
        Self {
            attempt: Attempt::RefreshRetry,
            ..self
        }
    }
}
