//! Absolute, host-qualified resource identifiers.
//!
//! Every stored document is addressed by exactly one [`Identifier`]. Two
//! identifiers are equal when their canonical (WHATWG-normalized)
//! serializations are equal, so `https://Example.COM:443/a` and
//! `https://example.com/a` name the same document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Identifier parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Input is not a parseable URL
    Malformed(String),
    /// URL has no host component (e.g. `mailto:` or `data:`)
    MissingHost(String),
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::Malformed(e) => write!(f, "Malformed identifier: {e}"),
            IdentifierError::MissingHost(s) => write!(f, "Identifier has no host: {s}"),
        }
    }
}

impl std::error::Error for IdentifierError {}

/// A canonicalized absolute locator naming one document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(Url);

impl Identifier {
    /// Parse and canonicalize an identifier.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let url = Url::parse(input)
            .map_err(|e| IdentifierError::Malformed(format!("{input}: {e}")))?;
        Self::from_url(url)
    }

    /// Wrap an already parsed URL, rejecting host-less URLs.
    pub fn from_url(url: Url) -> Result<Self, IdentifierError> {
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self(url)),
            _ => Err(IdentifierError::MissingHost(url.to_string())),
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Host component, lowercased by canonicalization.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// `host[:port]`, with the port only present when it is not the
    /// scheme's default.
    pub fn authority(&self) -> String {
        match self.0.port() {
            Some(port) => format!("{}:{port}", self.host()),
            None => self.host().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.0
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// The same identifier with query and fragment stripped.
    pub fn without_query(&self) -> Identifier {
        let mut url = self.0.clone();
        url.set_query(None);
        url.set_fragment(None);
        Identifier(url)
    }

    /// The identifier without query, with the given query pairs appended.
    pub fn with_query(&self, pairs: &[(&str, String)]) -> Identifier {
        let mut url = self.without_query().0;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Identifier(url)
    }

    /// Append a path segment: `https://h/users/a` + `inbox` →
    /// `https://h/users/a/inbox`.
    pub fn child(&self, segment: &str) -> Identifier {
        let mut url = self.without_query().0;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        Identifier(url)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.as_str())
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0.into()
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
