//! Rate-limited, bearer-authenticated REST client.
//!
//! Every collaborator service leadpipe talks to is a JSON-over-HTTPS API
//! keyed by one static token. [`Client`] builds URLs from path segments on
//! a configured host, attaches `Authorization: Bearer <key>` (or the key
//! under a named header for gateway-fronted APIs), waits on the shared
//! [`RateLimiter`], sends the request once, and maps every failure to a
//! distinct [`LeadPipeError`] variant. There is no retry.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use leadpipe_shared::{LeadPipeError, RateLimiter, Result};

/// Host used when no override is configured.
pub const DEFAULT_HOST: &str = "api.airtable.com/v0";

/// Default request budget per second.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("leadpipe/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Optional overrides applied when constructing a [`Client`].
#[derive(Debug, Default, Clone)]
pub struct ClientOptions {
    base: Option<String>,
    rate_limit: Option<Arc<RateLimiter>>,
    http_client: Option<reqwest::Client>,
    key_header: Option<HeaderName>,
    headers: HeaderMap,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the host (authority plus optional path prefix).
    ///
    /// `api.example.com/v1` is served over HTTPS; an explicit `http://` or
    /// `https://` prefix is kept as given.
    pub fn with_host(mut self, host: &str) -> Result<Self> {
        self.base = Some(validate_host(host)?);
        Ok(self)
    }

    /// Share an existing limiter instead of the default 5 requests/second.
    pub fn with_rate_limit(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limit = Some(limiter);
        self
    }

    /// Use a preconfigured transport.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Send the key verbatim under `name` instead of as a bearer token.
    pub fn with_api_key_header(mut self, name: &str) -> Result<Self> {
        self.key_header = Some(header_name(name)?);
        Ok(self)
    }

    /// Add a static header to every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| LeadPipeError::config(format!("invalid value for header {name:?}: {e}")))?;
        self.headers.insert(header_name(name)?, value);
        Ok(self)
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| LeadPipeError::config(format!("invalid header name {name:?}: {e}")))
}

/// Normalize a host string into a base URL and check that it parses.
fn validate_host(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };

    let parsed = Url::parse(&base).map_err(|e| {
        LeadPipeError::config(format!("invalid host {host:?}: {e}"))
    })?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(LeadPipeError::config(format!("invalid host {host:?}: missing authority")));
    }

    Ok(base)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client bound to one host. Cheap to clone; clones share the
/// transport and the rate limiter.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    base: String,
    limiter: Arc<RateLimiter>,
    http: reqwest::Client,
    key_header: Option<HeaderName>,
    headers: HeaderMap,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base", &self.base)
            .field("limiter", &self.limiter)
            .field("key_header", &self.key_header)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for `api_key` with the given overrides.
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let base = match options.base {
            Some(base) => base,
            None => validate_host(DEFAULT_HOST)?,
        };

        let limiter = match options.rate_limit {
            Some(limiter) => limiter,
            None => Arc::new(RateLimiter::per_second(DEFAULT_REQUESTS_PER_SECOND)?),
        };

        let http = match options.http_client {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| {
                    LeadPipeError::config(format!("failed to build HTTP client: {e}"))
                })?,
        };

        Ok(Self {
            api_key: api_key.into(),
            base,
            limiter,
            http,
            key_header: options.key_header,
            headers: options.headers,
        })
    }

    /// Base URL every path is joined onto.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Join `segments` onto the base URL and append `params` verbatim.
    ///
    /// The first parameter is introduced with `?`, the rest with `&`.
    /// Values are not escaped; callers pass pre-escaped values.
    pub fn build_url(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        let mut raw = self.base.clone();
        for segment in segments.iter().map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            raw.push('/');
            raw.push_str(segment);
        }
        for (i, (key, value)) in params.iter().enumerate() {
            raw.push(if i == 0 { '?' } else { '&' });
            raw.push_str(key);
            raw.push('=');
            raw.push_str(value);
        }

        Url::parse(&raw).map_err(|source| LeadPipeError::InvalidUrl { url: raw, source })
    }

    /// `GET` the resource and return the raw body.
    pub async fn get(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Vec<u8>> {
        let url = self.build_url(segments, params)?;
        self.send(Method::GET, url, None).await
    }

    /// `POST` a JSON body and return the raw response body.
    pub async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<Vec<u8>> {
        let url = self.build_url(segments, &[])?;
        let body = encode(body)?;
        self.send(Method::POST, url, Some(body)).await
    }

    /// `PATCH` a JSON body and return the raw response body.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Vec<u8>> {
        let url = self.build_url(segments, &[])?;
        let body = encode(body)?;
        self.send(Method::PATCH, url, Some(body)).await
    }

    /// `DELETE` the resource and return the raw response body.
    pub async fn delete(&self, segments: &[&str]) -> Result<Vec<u8>> {
        let url = self.build_url(segments, &[])?;
        self.send(Method::DELETE, url, None).await
    }

    /// `GET` and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        decode(&self.get(segments, params).await?)
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        decode(&self.post(segments, body).await?)
    }

    /// `PATCH` a JSON body and decode the JSON response.
    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        decode(&self.patch(segments, body).await?)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(self.headers.clone());
        request = match &self.key_header {
            Some(name) => request.header(name.clone(), &self.api_key),
            None => request.bearer_auth(&self.api_key),
        };
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        self.limiter.acquire().await;
        debug!(%method, %url, "sending request");

        let response = request.send().await.map_err(|source| LeadPipeError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadPipeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| LeadPipeError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(bytes.to_vec())
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|source| LeadPipeError::Encode {
        what: "request body",
        source,
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| LeadPipeError::Decode {
        what: "response body",
        source,
    })
}
