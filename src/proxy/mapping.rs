//! Listen/target prefix pair and URL rewriting.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("{0} prefix is empty")]
    Empty(&'static str),
    #[error("{which} prefix {value:?} is not an absolute URL: {reason}")]
    NotAbsolute {
        which: &'static str,
        value: String,
        reason: String,
    },
    #[error("{which} prefix {value:?} uses scheme {scheme:?}; only http is supported")]
    UnsupportedScheme {
        which: &'static str,
        value: String,
        scheme: String,
    },
}

/// The advertised base URL and the upstream base URL it stands for.
///
/// The listen prefix is put in the same normalized form as inbound request
/// URLs (lowercase host, default port dropped) so the two compare as text.
/// The target prefix keeps the exact text it was configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyMapping {
    listen_prefix: String,
    target_prefix: String,
}

impl ProxyMapping {
    pub fn new(
        listen_prefix: impl Into<String>,
        target_prefix: impl Into<String>,
    ) -> Result<Self, MappingError> {
        let listen_prefix = listen_prefix.into();
        let target_prefix = target_prefix.into();
        let listen_url = validate("listen", &listen_prefix)?;
        validate("target", &target_prefix)?;
        let listen_prefix = normalize_prefix(&listen_prefix, &listen_url);
        Ok(Self {
            listen_prefix,
            target_prefix,
        })
    }

    pub fn listen_prefix(&self) -> &str {
        &self.listen_prefix
    }

    pub fn target_prefix(&self) -> &str {
        &self.target_prefix
    }

    /// Replaces every occurrence of the listen prefix in `url` with the
    /// target prefix.
    ///
    /// Matching is plain substring matching, not anchored at the start, so an
    /// occurrence inside a query string is rewritten too. A URL without the
    /// listen prefix comes back unchanged.
    ///
    /// ```
    /// # use relay::proxy::ProxyMapping;
    /// let mapping = ProxyMapping::new("http://localhost:8080", "http://example.com").unwrap();
    /// assert_eq!(mapping.rewrite("http://localhost:8080/page"), "http://example.com/page");
    /// ```
    pub fn rewrite(&self, url: &str) -> String {
        url.replace(&self.listen_prefix, &self.target_prefix)
    }
}

fn validate(which: &'static str, value: &str) -> Result<Url, MappingError> {
    if value.trim().is_empty() {
        return Err(MappingError::Empty(which));
    }
    let not_absolute = |reason: String| MappingError::NotAbsolute {
        which,
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| not_absolute(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(not_absolute("missing host".to_string()));
    }
    if url.scheme() != "http" {
        return Err(MappingError::UnsupportedScheme {
            which,
            value: value.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}

/// Serialized form of `url`, without the root slash the parser adds when
/// `value` had no path.
fn normalize_prefix(value: &str, url: &Url) -> String {
    let mut normalized = url.to_string();
    let bare_root = url.path() == "/" && url.query().is_none() && url.fragment().is_none();
    if bare_root && !value.ends_with('/') {
        normalized.pop();
    }
    normalized
}
