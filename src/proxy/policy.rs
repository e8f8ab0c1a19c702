//! Which headers and cookies cross the proxy, and how.

use crate::http::cookie::Cookie;
use crate::http::headers::HeaderMap;

/// Headers never copied generically because the response sets them through
/// dedicated fields: content type, length, connection handling and cookies.
pub const EXCLUDED_HEADERS: [&str; 4] = ["Content-Type", "Content-Length", "Connection", "Set-Cookie"];

pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Copies every non-excluded header from `src` into `dst`, one entry per
/// value.
///
/// A header `dst` refuses is logged and skipped; the rest are still
/// copied. Returns the number of headers copied.
pub fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) -> usize {
    let mut copied = 0;
    for (name, value) in src.iter() {
        if is_excluded(name) {
            continue;
        }
        match dst.try_append(name, value) {
            Ok(()) => copied += 1,
            Err(e) => {
                tracing::warn!(header = name, error = %e, "Copying response header failed");
            }
        }
    }
    copied
}

/// Re-binds each cookie to `host`, keeping name, value, path, expiry and
/// flags.
pub fn rehome_cookies(cookies: &[Cookie], host: &str) -> Vec<Cookie> {
    cookies.iter().map(|c| c.rehomed(host)).collect()
}
