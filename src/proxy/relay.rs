//! Copies an upstream response onto the client's response.

use bytes::BytesMut;

use crate::http::response::Response;
use crate::proxy::error::ProxyError;
use crate::proxy::forward::{UpstreamBody, UpstreamResponse};
use crate::proxy::policy;

/// Size of each read from the upstream body.
pub const RELAY_CHUNK_SIZE: usize = 256;

/// Charset label every relayed response is sent with.
pub const RELAY_CHARSET: &str = "utf-8";

/// Writes `upstream` onto `res`.
///
/// Existing headers on `res` are cleared first. The body is read to the
/// end before anything is set from it, and Content-Length is the number of
/// bytes actually read. Cookies are re-homed to `client_host`. The upstream
/// connection is released when this returns, whatever the outcome.
pub async fn relay_response(
    upstream: UpstreamResponse,
    client_host: &str,
    res: &mut Response,
) -> Result<(), ProxyError> {
    let cookies = upstream.cookies();
    let content_type = upstream.content_type().map(str::to_string);
    let UpstreamResponse {
        status,
        reason,
        headers,
        body,
    } = upstream;

    res.headers.clear();
    res.cookies.clear();
    res.status = status;
    res.reason = Some(reason);

    let copied = policy::copy_headers(&headers, &mut res.headers);
    tracing::trace!(copied, total = headers.len(), "Copied response headers");

    res.content_type = content_type;

    let data = drain(body).await?;
    res.content_encoding = Some(RELAY_CHARSET.to_string());
    res.content_length = Some(data.len() as u64);
    res.body = data;

    res.cookies = policy::rehome_cookies(&cookies, client_host);
    Ok(())
}

/// Reads `body` to the end in fixed-size pieces, then drops it.
async fn drain(mut body: UpstreamBody) -> Result<Vec<u8>, ProxyError> {
    let mut chunk = [0u8; RELAY_CHUNK_SIZE];
    let mut acc = BytesMut::new();

    loop {
        let n = body
            .read(&mut chunk)
            .await
            .map_err(|e| ProxyError::relay(format!("{:#}", e)))?;
        if n == 0 {
            break;
        }
        acc.extend_from_slice(&chunk[..n]);
    }

    Ok(acc.to_vec())
}
