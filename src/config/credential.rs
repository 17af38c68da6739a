//! The upstream credential injected as a query parameter.

use std::fmt;

use crate::error::ConfigError;

/// Separator between parameter name and value in the combined credential string.
pub const CREDENTIAL_SEPARATOR: char = ':';

/// Query parameter name and value sent with every forwarded request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub value: String,
}

impl Credential {
    /// Split a combined `name<separator>value` string.
    ///
    /// The separator must occur exactly once. Either side may be empty:
    /// anonymous demo upstreams accept an empty key.
    pub fn parse(raw: &str, separator: char) -> Result<Self, ConfigError> {
        let occurrences = raw.matches(separator).count();
        match raw.split_once(separator) {
            Some((name, value)) if occurrences == 1 => Ok(Self {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => Err(ConfigError::MalformedCredential {
                separator,
                occurrences,
            }),
        }
    }
}

// The value is a secret; keep it out of logs and panics.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}
