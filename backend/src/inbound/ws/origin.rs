//! Origin allow-list for WebSocket upgrades.
//!
//! An empty allow-list admits every origin, including requests without an
//! `Origin` header. Once any entry is configured the upgrade must carry
//! exactly one parseable `Origin` that matches an entry. Entries are
//! origins such as `https://chat.example.com` or subdomain wildcards such as
//! `https://*.example.com`.

use actix_web::HttpRequest;
use actix_web::http::header::{HeaderValue, ORIGIN};
use tracing::{error, warn};
use url::Url;

/// Configuration errors for allow-list entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginPolicyError {
    #[error("allowed origin `{entry}` is not an absolute http(s) origin")]
    InvalidEntry { entry: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostMatch {
    Exact(String),
    /// Holds the parent domain with a leading dot, e.g. `.example.com`.
    Subdomain(String),
}

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigin {
    scheme: String,
    host: HostMatch,
    port: Option<u16>,
}

impl AllowedOrigin {
    /// Parse an entry from its configured form.
    pub fn parse(entry: &str) -> Result<Self, OriginPolicyError> {
        let invalid = || OriginPolicyError::InvalidEntry {
            entry: entry.to_owned(),
        };
        let trimmed = entry.trim();
        let (scheme, rest) = trimmed.split_once("://").ok_or_else(invalid)?;
        let (wildcard, authority) = match rest.strip_prefix("*.") {
            Some(authority) => (true, authority),
            None => (false, rest),
        };
        let url = Url::parse(&format!("{scheme}://{authority}")).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.path() != "/" {
            return Err(invalid());
        }
        let host = url.host_str().ok_or_else(invalid)?.to_owned();
        Ok(Self {
            scheme: url.scheme().to_owned(),
            host: if wildcard {
                HostMatch::Subdomain(format!(".{host}"))
            } else {
                HostMatch::Exact(host)
            },
            port: url.port_or_known_default(),
        })
    }

    fn matches(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        let host_ok = match &self.host {
            HostMatch::Exact(expected) => host == expected,
            HostMatch::Subdomain(suffix) => host
                .strip_suffix(suffix.as_str())
                .is_some_and(|label| !label.is_empty()),
        };
        host_ok && origin.scheme() == self.scheme && origin.port_or_known_default() == self.port
    }
}

/// Origins permitted to open chat connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    #[default]
    Any,
    AllowList(Vec<AllowedOrigin>),
}

impl OriginPolicy {
    /// Build a policy from configured entries; no entries means [`OriginPolicy::Any`].
    ///
    /// # Examples
    /// ```
    /// use chat_gateway::inbound::ws::origin::OriginPolicy;
    ///
    /// let policy = OriginPolicy::from_entries(["https://*.example.com"]).unwrap();
    /// assert!(!policy.is_open());
    /// assert!(OriginPolicy::from_entries(Vec::<String>::new()).unwrap().is_open());
    /// ```
    pub fn from_entries<I, S>(entries: I) -> Result<Self, OriginPolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = entries
            .into_iter()
            .filter(|entry| !entry.as_ref().trim().is_empty())
            .map(|entry| AllowedOrigin::parse(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if allowed.is_empty() {
            Ok(Self::Any)
        } else {
            Ok(Self::AllowList(allowed))
        }
    }

    /// Whether every origin is admitted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Check the `Origin` header(s) of an upgrade request.
    pub fn check(&self, req: &HttpRequest) -> actix_web::Result<()> {
        let Self::AllowList(allowed) = self else {
            return Ok(());
        };
        let mut origin_iter = req.headers().get_all(ORIGIN);
        let origin_header = origin_iter.next().ok_or_else(|| {
            warn!("missing Origin header on WebSocket upgrade");
            actix_web::error::ErrorForbidden("Origin not allowed")
        })?;
        if origin_iter.next().is_some() {
            warn!("multiple Origin headers on WebSocket upgrade");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
        validate_origin(allowed, origin_header)
    }
}

fn validate_origin(allowed: &[AllowedOrigin], origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        error!(error = %error, "failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.iter().any(|entry| entry.matches(&origin)) {
        Ok(())
    } else {
        warn!(origin = origin_value, "rejected WebSocket upgrade from disallowed Origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
