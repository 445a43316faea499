//! read client configuration from a file, the environment, or AWS Secrets Manager

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;

use crate::errors::Error;

pub const DEFAULT_PROVIDER_DOMAIN: &str = "reddit.com";
pub const DEFAULT_REQUEST_BUFFER: usize = 2000;
pub const DEFAULT_USER_AGENT: &str = concat!("reddit-oauth-rust/", env!("CARGO_PKG_VERSION"));

pub enum ConfigLocation {
    File(String),
    Env,
    Secret,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    pub user_agent: Option<String>,
    /// Resume a previous session.
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Queue capacity (pending plus in-flight requests).
    pub request_buffer: Option<usize>,
    pub min_interval_ms: Option<u64>,
    pub provider_domain: Option<String>,
    /// Overrides `https://oauth.<provider_domain>`.
    pub auth_base_url: Option<String>,
    /// Overrides `https://ssl.<provider_domain>`.
    pub public_base_url: Option<String>,
}

impl Config {
    pub fn from_values(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_uri: redirect_uri.into(),
            user_agent: None,
            access_token: None,
            refresh_token: None,
            request_buffer: None,
            min_interval_ms: None,
            provider_domain: None,
            auth_base_url: None,
            public_base_url: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::from_values(
            required_env("REDDIT_APP_ID")?,
            required_env("REDDIT_APP_SECRET")?,
            required_env("REDDIT_REDIRECT_URI")?,
        );
        config.user_agent = std::env::var("REDDIT_USER_AGENT").ok();
        config.access_token = std::env::var("REDDIT_ACCESS_TOKEN").ok();
        config.refresh_token = std::env::var("REDDIT_REFRESH_TOKEN").ok();
        config.request_buffer = parsed_env("REDDIT_REQUEST_BUFFER")?;
        config.min_interval_ms = parsed_env("REDDIT_MIN_INTERVAL_MS")?;
        Ok(config)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_tokens(mut self, access_token: Option<String>, refresh_token: Option<String>) -> Self {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self
    }

    pub fn with_request_buffer(mut self, capacity: usize) -> Self {
        self.request_buffer = Some(capacity);
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_base_urls(mut self, auth: impl Into<String>, public: impl Into<String>) -> Self {
        self.auth_base_url = Some(auth.into());
        self.public_base_url = Some(public.into());
        self
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn request_buffer(&self) -> usize {
        self.request_buffer.unwrap_or(DEFAULT_REQUEST_BUFFER)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms.unwrap_or(0))
    }

    fn provider_domain(&self) -> &str {
        self.provider_domain
            .as_deref()
            .unwrap_or(DEFAULT_PROVIDER_DOMAIN)
    }

    pub fn auth_base_url(&self) -> String {
        match &self.auth_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://oauth.{}", self.provider_domain()),
        }
    }

    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://ssl.{}", self.provider_domain()),
        }
    }

    /// Checks everything that can be checked before any network call.
    pub fn validate(&self) -> Result<(), Error> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("app_id must not be empty".to_string()));
        }
        if self.request_buffer() == 0 {
            return Err(Error::Config("request_buffer must be at least 1".to_string()));
        }
        for (label, url) in [
            ("auth", self.auth_base_url()),
            ("public", self.public_base_url()),
        ] {
            reqwest::Url::parse(&url).map_err(|e| {
                Error::Config(format!("Invalid {label} base URL '{url}': {e}"))
            })?;
        }
        Ok(())
    }
}

pub async fn read_config(loc: ConfigLocation) -> Result<Config, Error> {
    let config = match loc {
        ConfigLocation::File(path) => Config::from_file(path)?,
        ConfigLocation::Env => Config::from_env()?,
        ConfigLocation::Secret => read_config_from_secret().await?,
    };
    Ok(config)
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("Missing {name} env var")))
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {name}: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

async fn read_config_from_secret() -> Result<Config, Error> {
    let secret_arn = required_env("REDDIT_CONFIG_SECRET_ARN")?;
    let client = aws_sdk_secretsmanager::Client::new(
        &aws_config::load_defaults(BehaviorVersion::latest()).await,
    );
    let resp = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
    let secret = match resp.secret_string() {
        Some(s) => Ok(s),
        None => Err(Error::Config(
            "Failed to get secret string, returned None".to_string(),
        )),
    }?;
    let config: Config = serde_json::from_str(secret)?;
    Ok(config)
}
