//! Upgrade checks and the opening handshake.

use base64::Engine;
use bytes::Bytes;
use http::{header, HeaderValue, Request, StatusCode};
use http_body_util::Full;
use sha1::{Digest, Sha1};
use switchyard_core::Response;

use crate::error::{WsError, WsResult};

/// The GUID appended to the client key during the handshake.
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const SEC_WEBSOCKET_KEY: &str = "sec-websocket-key";
const SEC_WEBSOCKET_ACCEPT: &str = "sec-websocket-accept";

/// Checks that `request` asks to upgrade to `protocol` and returns the
/// handshake accept key.
///
/// The `Upgrade` header must equal `protocol`, ignoring ASCII case, and a
/// `Sec-WebSocket-Key` must be present.
///
/// # Errors
///
/// Returns [`WsError::NotUpgradeRequest`] if either check fails.
pub fn check_upgrade<B>(request: &Request<B>, protocol: &str) -> WsResult<String> {
    let upgrade = request
        .headers()
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| WsError::not_upgrade("missing Upgrade header"))?;
    if !upgrade.trim().eq_ignore_ascii_case(protocol) {
        return Err(WsError::not_upgrade(format!(
            "Upgrade header '{upgrade}' does not match '{protocol}'"
        )));
    }

    let key = request
        .headers()
        .get(SEC_WEBSOCKET_KEY)
        .and_then(|v| v.to_str().ok())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| WsError::not_upgrade("missing Sec-WebSocket-Key header"))?;

    Ok(compute_accept_key(key))
}

/// Computes the `Sec-WebSocket-Accept` value for a client key.
///
/// ```rust
/// use switchyard_ws::compute_accept_key;
///
/// assert_eq!(
///     compute_accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
///     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
/// );
/// ```
#[must_use]
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Builds the `101 Switching Protocols` response.
///
/// # Errors
///
/// Returns [`WsError::NotUpgradeRequest`] if a header value is not valid.
pub fn upgrade_response(accept_key: &str, protocol: &str) -> WsResult<Response> {
    let accept = HeaderValue::from_str(accept_key)
        .map_err(|_| WsError::not_upgrade("accept key is not a valid header value"))?;
    let upgrade = HeaderValue::from_str(protocol)
        .map_err(|_| WsError::not_upgrade("protocol is not a valid header value"))?;

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("Upgrade"));
    headers.insert(header::UPGRADE, upgrade);
    headers.insert(SEC_WEBSOCKET_ACCEPT, accept);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(upgrade: Option<&str>, key: Option<&str>) -> Request<()> {
        let mut builder = Request::get("/chat");
        if let Some(upgrade) = upgrade {
            builder = builder.header(header::UPGRADE, upgrade);
        }
        if let Some(key) = key {
            builder = builder.header(SEC_WEBSOCKET_KEY, key);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_accepts_matching_protocol() {
        let key = check_upgrade(
            &request(Some("websocket"), Some("dGhlIHNhbXBsZSBub25jZQ==")),
            "websocket",
        )
        .unwrap();
        assert_eq!(key, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");

        assert!(check_upgrade(&request(Some("WebSocket"), Some("k")), "websocket").is_ok());
    }

    #[test]
    fn test_rejects_missing_or_wrong_upgrade() {
        assert!(check_upgrade(&request(None, Some("k")), "websocket")
            .unwrap_err()
            .is_rejection());
        assert!(check_upgrade(&request(Some("h2c"), Some("k")), "websocket").is_err());
    }

    #[test]
    fn test_rejects_missing_key() {
        let err = check_upgrade(&request(Some("websocket"), None), "websocket").unwrap_err();
        assert!(err.to_string().contains("Sec-WebSocket-Key"));
    }

    #[test]
    fn test_upgrade_response() {
        let response = upgrade_response("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=", "websocket").unwrap();
        assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert_eq!(response.headers()[header::UPGRADE], "websocket");
        assert_eq!(response.headers()[header::CONNECTION], "Upgrade");
        assert_eq!(
            response.headers()[SEC_WEBSOCKET_ACCEPT],
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }
}
