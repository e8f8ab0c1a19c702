//! Cookie parsing and rendering.
//!
//! Requests carry cookies as `name=value` pairs in a `Cookie` header;
//! responses set them one at a time through `Set-Cookie`, each with its own
//! attributes.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieError {
    #[error("cookie has no name=value pair: {0:?}")]
    MissingPair(String),
    #[error("cookie has an empty name")]
    EmptyName,
}

/// A single cookie with the attributes the proxy carries across.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// `Expires` as sent, an HTTP-date.
    pub expires: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Parses one `Set-Cookie` header value.
    ///
    /// Unknown attributes are ignored, as is a `Max-Age` that is not an
    /// integer.
    pub fn parse_set_cookie(header: &str) -> Result<Self, CookieError> {
        let mut parts = header.split(';');
        let pair = parts.next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| CookieError::MissingPair(header.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }

        let mut cookie = Cookie::new(name, value.trim());
        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr.trim(), None),
            };
            match (key.to_ascii_lowercase().as_str(), val) {
                ("domain", Some(v)) => cookie.domain = Some(v.trim_start_matches('.').to_string()),
                ("path", Some(v)) => cookie.path = Some(v.to_string()),
                ("expires", Some(v)) => cookie.expires = Some(v.to_string()),
                ("max-age", Some(v)) => cookie.max_age = v.parse().ok(),
                ("httponly", _) => cookie.http_only = true,
                ("secure", _) => cookie.secure = true,
                _ => {}
            }
        }
        Ok(cookie)
    }

    /// Copy of this cookie bound to `domain`, every other attribute kept.
    pub fn rehomed(&self, domain: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            ..self.clone()
        }
    }

    /// The `name=value` form used in a request `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Renders the `Set-Cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={}", expires)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Splits a request `Cookie` header into cookies. Pairs without `=` or with
/// an empty name are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| Cookie::new(name, value.trim()))
        })
        .collect()
}

/// Joins cookies into a request `Cookie` header value.
pub fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(Cookie::pair)
        .collect::<Vec<_>>()
        .join("; ")
}
