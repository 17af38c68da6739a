//! The single upstream every proxied request is sent to.
//!
//! [`UpstreamTarget::resolve`] validates the configured base address once at
//! startup. [`UpstreamTarget::rewrite_uri`] then points each inbound URI at
//! the upstream's scheme and authority, keeping the request's own path and
//! query.

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use url::Url;

use crate::error::{ConfigError, ProxyError};

#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    url: Url,
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    pub fn resolve(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUpstream {
            address: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => {
                return Err(invalid(format!(
                    "unsupported scheme '{other}' (expected http or https)"
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".into()))?;
        let authority = url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"))
            .parse::<Authority>()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            url,
            scheme,
            authority,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn authority(&self) -> &Authority {
        &self.authority
    }

    #[must_use]
    pub fn is_https(&self) -> bool {
        self.scheme == Scheme::HTTPS
    }

    /// `true` when the base address carries a path beyond `/`. That path is
    /// not prepended to forwarded requests.
    #[must_use]
    pub fn has_base_path(&self) -> bool {
        self.url.path() != "/"
    }

    /// Replace scheme and authority of `uri` with the upstream's.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, ProxyError> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let rewritten = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?;
        Ok(rewritten)
    }
}
