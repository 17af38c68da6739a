//! Query-string credential injection.
//!
//! [`inject_credential`] drops any caller-supplied parameter that shares the
//! credential's name and appends the configured credential. The configured
//! value always wins, so callers cannot substitute their own key. Every other
//! parameter is forwarded exactly as the caller encoded it.

use std::borrow::Cow;

use axum::http::uri::PathAndQuery;
use axum::http::Uri;
use url::form_urlencoded;

use crate::config::Credential;
use crate::error::ProxyError;

/// Ordered query parameters, kept as the raw `name=value` segments they
/// arrived as. Repeated names stay separate entries. Names and values are
/// only decoded for comparison and lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    segments: Vec<String>,
}

/// Decoded `(name, value)` of one raw segment.
fn decode_segment(segment: &str) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
    form_urlencoded::parse(segment.as_bytes()).next()
}

impl QueryParams {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let segments = raw
            .map(|q| {
                q.split('&')
                    .filter(|segment| !segment.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self { segments }
    }

    /// All decoded values recorded for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        self.segments
            .iter()
            .filter_map(|segment| decode_segment(segment))
            .filter(move |(k, _)| *k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Replace every value of `name` with the single `value`.
    pub fn set(&mut self, name: &str, value: &str) {
        self.segments
            .retain(|segment| decode_segment(segment).map_or(true, |(k, _)| k != name));
        self.segments.push(
            form_urlencoded::Serializer::new(String::new())
                .append_pair(name, value)
                .finish(),
        );
    }

    #[must_use]
    pub fn encode(&self) -> String {
        self.segments.join("&")
    }
}

/// Return `uri` with the credential parameter set in its query string.
pub fn inject_credential(uri: &Uri, credential: &Credential) -> Result<Uri, ProxyError> {
    let mut params = QueryParams::parse(uri.query());
    params.set(&credential.name, &credential.value);

    let path_and_query = format!("{}?{}", uri.path(), params.encode());
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query).map_err(|e| ProxyError::InvalidUri(e.into()))?,
    );
    Uri::from_parts(parts).map_err(|e| ProxyError::InvalidUri(e.into()))
}
