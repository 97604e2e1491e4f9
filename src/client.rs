//! Lettermint async client implementation.

use crate::{EmailBuilder, Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Default Lettermint API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.lettermint.co/v1";

/// Default HTTP timeout for all requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// SDK version, sent in the default user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const TOKEN_HEADER: &str = "x-lettermint-token";
const ENV_API_TOKEN: &str = "LETTERMINT_API_TOKEN";
const ENV_BASE_URL: &str = "LETTERMINT_BASE_URL";

/// Async client for the Lettermint email API.
///
/// Cloning is cheap: clones share the underlying connection pool, so a single
/// client can be handed to many tasks.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_token: HeaderValue,
    base_url: String,
    user_agent: HeaderValue,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder(api_token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_token)
    }

    /// Create a client with default settings.
    ///
    /// # Errors
    /// Returns [`Error::InvalidApiToken`] if `api_token` is empty or not a
    /// valid header value.
    ///
    /// # Examples
    /// ```no_run
    /// # use lettermint::Client;
    /// # fn main() -> Result<(), lettermint::Error> {
    /// let client = Client::new("your-api-token")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_token).build()
    }

    /// Create a client from the environment.
    ///
    /// Reads the token from `LETTERMINT_API_TOKEN` and, when set, the base URL
    /// from `LETTERMINT_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var(ENV_API_TOKEN).map_err(|_| Error::MissingEnv(ENV_API_TOKEN))?;

        let mut builder = ClientBuilder::new(api_token);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            builder = builder.base_url(base_url);
        }
        builder.build()
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start composing an email.
    ///
    /// # Examples
    /// ```no_run
    /// # use lettermint::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), lettermint::Error> {
    /// let client = Client::new("your-api-token")?;
    /// let response = client
    ///     .email()
    ///     .from("sender@example.com")
    ///     .to("recipient@example.com")
    ///     .subject("Hello")
    ///     .html("<p>World</p>")
    ///     .send()
    ///     .await?;
    /// println!("{}", response.message_id);
    /// # Ok(())
    /// # }
    /// ```
    pub fn email(&self) -> EmailBuilder<'_> {
        EmailBuilder::new(self)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Full URL for an API path.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Build headers for API requests.
    pub(crate) fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(TOKEN_HEADER, self.api_token.clone());
        headers
    }
}

/// Builder for configuring a Lettermint client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_token: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Base URL [`DEFAULT_BASE_URL`]
    /// - Timeout [`DEFAULT_TIMEOUT`]
    /// - User agent `lettermint-rust/<version>`
    /// - No proxy
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("lettermint-rust/{VERSION}"),
            proxy: None,
            http: None,
        }
    }

    /// Override the API base URL.
    ///
    /// Useful for testing or for a custom API endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the timeout applied to every request (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL (e.g., "socks5://127.0.0.1:1080").
    ///
    /// This uses reqwest's proxy support for all requests.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Use a preconfigured `reqwest::Client`.
    ///
    /// The timeout and proxy settings of this builder are ignored; configure
    /// them on the supplied client instead.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns [`Error::InvalidApiToken`] for an empty token or one that cannot
    /// be sent as a header (e.g. with a trailing newline),
    /// [`Error::InvalidRequest`] for an invalid user agent, and
    /// [`Error::Request`] if the proxy URL is invalid or the HTTP client
    /// cannot be constructed.
    ///
    /// # Examples
    /// ```no_run
    /// # use std::time::Duration;
    /// # use lettermint::Client;
    /// # fn main() -> Result<(), lettermint::Error> {
    /// let client = Client::builder("your-api-token")
    ///     .base_url("https://custom-api.example.com")
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Client> {
        if self.api_token.is_empty() {
            return Err(Error::InvalidApiToken);
        }
        let mut api_token =
            HeaderValue::from_str(&self.api_token).map_err(|_| Error::InvalidApiToken)?;
        api_token.set_sensitive(true);
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| Error::InvalidRequest("invalid user agent".to_string()))?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder().timeout(self.timeout);
                if let Some(proxy_url) = &self.proxy {
                    builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
                }
                builder.build()?
            }
        };

        Ok(Client {
            http,
            api_token,
            base_url: self.base_url,
            user_agent,
        })
    }
}
