//! Option sources: where search results come from.
//!
//! `HttpOptionSource` talks to the host's search endpoint:
//! `GET <optionUrl>?term=<term>` returning a JSON array of `{value, label}`.
//!
//! # Security Note - Logging
//!
//! The security token is held in a `SecretString` and the header value is
//! marked sensitive, so neither `Debug` output nor reqwest's request logging
//! shows it.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::{SECURITY_HEADER, WidgetConfig};
use crate::error::{Result, SuggestError};
use crate::option::{SuggestOption, normalize_options};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Common interface for option sources
pub trait OptionSource: Send + Sync + 'static {
    /// Look up the options matching `term`
    fn search(&self, term: &str) -> impl Future<Output = Result<Vec<SuggestOption>>> + Send;
}

/// Search endpoint reached over HTTP
pub struct HttpOptionSource {
    client: Client,
    option_url: String,
    base_url: Option<String>,
    security_token: Option<SecretString>,
}

impl std::fmt::Debug for HttpOptionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOptionSource")
            .field("option_url", &self.option_url)
            .field("base_url", &self.base_url)
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl HttpOptionSource {
    /// Create a source for the given endpoint.
    ///
    /// Configures the HTTP client with a 10s connect timeout and 30s total
    /// timeout. The endpoint is not validated here: an unusable URL makes
    /// each search fail, which the gateway reports as "no results".
    pub fn new(option_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            option_url: option_url.into(),
            base_url: None,
            security_token: None,
        })
    }

    /// Create a source from a widget configuration
    pub fn from_config(config: &WidgetConfig) -> Result<Self> {
        let mut source = Self::new(config.option_url.clone())?;
        source.base_url = config.base_url.clone();
        source.security_token = config
            .security_token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()));
        Ok(source)
    }

    /// Resolve relative endpoints against this base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attach the host's security token to every request
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.security_token = (!token.is_empty()).then(|| SecretString::from(token));
        self
    }

    /// Build the request URL for a term, appending `term` to any existing query
    pub fn search_url(&self, term: &str) -> Result<Url> {
        let mut url = match Url::parse(&self.option_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_deref().ok_or_else(|| {
                    SuggestError::InvalidEndpoint(
                        self.option_url.clone(),
                        "relative URL without a base URL".to_string(),
                    )
                })?;
                Url::parse(base)
                    .and_then(|b| b.join(&self.option_url))
                    .map_err(|e| SuggestError::InvalidEndpoint(self.option_url.clone(), e.to_string()))?
            }
            Err(e) => {
                return Err(SuggestError::InvalidEndpoint(
                    self.option_url.clone(),
                    e.to_string(),
                ));
            }
        };

        if !term.is_empty() {
            url.query_pairs_mut().append_pair("term", term);
        }
        Ok(url)
    }

    fn security_header(&self) -> Result<Option<HeaderValue>> {
        let Some(token) = &self.security_token else {
            return Ok(None);
        };
        let mut value =
            HeaderValue::from_str(token.expose_secret()).map_err(|_| SuggestError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

impl OptionSource for HttpOptionSource {
    async fn search(&self, term: &str) -> Result<Vec<SuggestOption>> {
        let url = self.search_url(term)?;

        let mut request = self.client.get(url);
        if let Some(header) = self.security_header()? {
            request = request.header(SECURITY_HEADER, header);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Status(status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SuggestError::MalformedPayload(e.to_string()))?;
        normalize_options(&body)
    }
}
