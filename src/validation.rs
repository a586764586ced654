use crate::error::ShortenError;
use regex::Regex;
use std::sync::LazyLock;
use validator::ValidateUrl;

static CUSTOM_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("custom short pattern"));

/// Path segments served by fixed routes; a short code there could never resolve.
const RESERVED_SHORTS: &[&str] = &["api", "health", "ready"];

/// Longest mapping lifetime a request may ask for (ten years).
pub const MAX_EXPIRY_HOURS: u64 = 10 * 365 * 24;

/// Request validation utilities
#[derive(Debug, Clone)]
pub struct RequestValidator {
    domain: String,
}

impl RequestValidator {
    /// `domain` is the service's own public host, e.g. `sho.rt` or `localhost:3000`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Validates URL syntax. Scheme-less input is judged as if `http://` were prefixed.
    pub fn validate_url(&self, url: &str) -> Result<(), ShortenError> {
        let url = url.trim();
        if url.is_empty() || url.chars().any(char::is_whitespace) {
            return Err(ShortenError::InvalidUrl);
        }

        let candidate = Self::enforce_http(url);
        if !candidate.validate_url() {
            return Err(ShortenError::InvalidUrl);
        }

        Ok(())
    }

    /// Rejects URLs that point back at this service.
    pub fn check_domain(&self, url: &str) -> Result<(), ShortenError> {
        if url.eq_ignore_ascii_case(&self.domain) {
            return Err(ShortenError::UnsafeDomain);
        }

        let host = strip_scheme(url.trim());
        let host = strip_prefix_ignore_case(host, "www.");
        let host = host.split('/').next().unwrap_or_default();

        if host.eq_ignore_ascii_case(&self.domain) {
            return Err(ShortenError::UnsafeDomain);
        }

        Ok(())
    }

    /// Prefixes `http://` unless the URL already carries an http(s) scheme.
    pub fn enforce_http(url: &str) -> String {
        let url = url.trim();
        if has_http_scheme(url) {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    }

    /// Custom codes become a URL path segment, so only a safe alphabet is allowed.
    pub fn validate_custom_short(code: &str) -> Result<(), ShortenError> {
        if !CUSTOM_SHORT.is_match(code) {
            return Err(ShortenError::InvalidCustomShort);
        }

        if RESERVED_SHORTS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(code))
        {
            return Err(ShortenError::InvalidCustomShort);
        }

        Ok(())
    }

    /// Requested lifetime in hours, bounded by [`MAX_EXPIRY_HOURS`].
    pub fn validate_expiry(hours: u64) -> Result<(), ShortenError> {
        if hours > MAX_EXPIRY_HOURS {
            return Err(ShortenError::InvalidExpiry);
        }

        Ok(())
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_scheme(url: &str) -> &str {
    let url = strip_prefix_ignore_case(url, "https://");
    strip_prefix_ignore_case(url, "http://")
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}
