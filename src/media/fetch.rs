//! Remote media fetching
//!
//! Blocking HTTP fetcher for share sources that live behind a URL. Applies
//! the same protections as any outbound fetch in the delivery path:
//! - scheme allow-list and host validation before any connection
//! - DNS resolution with per-IP validation, pinned to prevent rebinding
//! - redirects disabled
//! - size limit enforced against Content-Length and the fetched body
//! - bounded timeout

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::Resolver;
use thiserror::Error;

use crate::media::ssrf::{self, SsrfError};

/// Maximum URL length (2KB)
pub const MAX_URL_LENGTH: usize = 2048;

/// Default fetch timeout in milliseconds (30s)
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Maximum fetch timeout in milliseconds (5 minutes)
pub const MAX_FETCH_TIMEOUT_MS: u64 = 300_000;

/// Default maximum response size (50MB)
pub const DEFAULT_MAX_SIZE: u64 = 50 * 1024 * 1024;

/// Errors that can occur during a media fetch
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("SSRF protection: {0}")]
    Ssrf(#[from] SsrfError),

    #[error("URL too long: {size} chars (max {max})")]
    UrlTooLong { size: usize, max: usize },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("response too large: {size} bytes (max {max})")]
    ResponseTooLarge { size: u64, max: u64 },
}

/// Result of a successful media fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The fetched bytes
    pub bytes: Vec<u8>,

    /// Content-Type from response headers, if present
    pub content_type: Option<String>,

    /// Actual size of the fetched content
    pub size: u64,
}

/// Configuration for media fetching
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum response size in bytes (default: 50MB)
    pub max_size: u64,

    /// Request timeout in milliseconds (default: 30s, capped at 5min)
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl FetchConfig {
    /// Set a custom max size
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set a custom timeout, capped at [`MAX_FETCH_TIMEOUT_MS`]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.min(MAX_FETCH_TIMEOUT_MS);
        self
    }
}

/// Blocking media fetcher.
///
/// The bridge performs the whole share hand-off on the invoking thread, so
/// the fetch path is synchronous as well.
pub struct MediaFetcher {
    config: FetchConfig,
}

impl Default for MediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Fetch media bytes from an http(s) URL.
    ///
    /// Validates the URL, resolves and validates DNS, pins the validated IP,
    /// then downloads with redirects disabled and the size limit enforced.
    pub fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        if url.len() > MAX_URL_LENGTH {
            return Err(FetchError::UrlTooLong {
                size: url.len(),
                max: MAX_URL_LENGTH,
            });
        }

        ssrf::validate_url(url)?;

        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("URL has no host".to_string()))?
            .to_string();
        let port = parsed.port_or_known_default().unwrap_or(443);

        let timeout = Duration::from_millis(self.config.timeout_ms.min(MAX_FETCH_TIMEOUT_MS));
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none());

        // Hostname targets get resolved here so every candidate IP can be
        // validated, then the first validated IP is pinned for the request.
        if host.parse::<IpAddr>().is_err() && !host.starts_with('[') {
            let validated_ip = resolve_and_validate(&host)?;
            let socket_addr = std::net::SocketAddr::new(validated_ip, port);
            builder = builder.resolve(&host, socket_addr);

            tracing::debug!(
                target: "media",
                url = %url,
                resolved_ip = %validated_ip,
                "DNS resolved and validated for media fetch"
            );
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::HttpRequest(format!("failed to create HTTP client: {e}")))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| FetchError::HttpRequest(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.config.max_size {
                return Err(FetchError::ResponseTooLarge {
                    size: content_length,
                    max: self.config.max_size,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::HttpRequest(format!("failed to read body: {e}")))?;

        if bytes.len() as u64 > self.config.max_size {
            return Err(FetchError::ResponseTooLarge {
                size: bytes.len() as u64,
                max: self.config.max_size,
            });
        }

        let size = bytes.len() as u64;
        Ok(FetchResult {
            bytes: bytes.to_vec(),
            content_type,
            size,
        })
    }
}

/// Resolve a hostname and validate every returned address.
///
/// Returns the first validated IP, which the caller pins for the connection.
fn resolve_and_validate(host: &str) -> Result<IpAddr, FetchError> {
    let resolver = Resolver::new(ResolverConfig::default(), ResolverOpts::default())
        .map_err(|e| FetchError::DnsResolution(format!("resolver init failed: {e}")))?;

    let lookup = resolver
        .lookup_ip(host)
        .map_err(|e| FetchError::DnsResolution(format!("{host}: {e}")))?;

    let mut validated: Option<IpAddr> = None;
    for ip in lookup.iter() {
        ssrf::validate_resolved_ip(&ip, host)?;
        if validated.is_none() {
            validated = Some(ip);
        }
    }

    validated.ok_or_else(|| FetchError::DnsResolution(format!("no addresses returned for {host}")))
}
