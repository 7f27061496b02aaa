//! Slack request signing verification and the form extractor that applies it.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use std::sync::Arc;

use axum::extract::{FromRequest, Request};
use axum::http::HeaderMap;
use ring::hmac;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::response::ApiError;
use crate::AppState;

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";
const VERSION: &str = "v0";
/// Requests older (or newer) than this are treated as replays.
const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed {0} header")]
    MissingHeader(&'static str),
    #[error("request timestamp is outside the allowed window")]
    Stale,
    #[error("request signature does not match")]
    Mismatch,
}

/// Check `X-Slack-Signature` against an HMAC-SHA256 of `v0:{timestamp}:{body}`.
pub fn verify_request(
    signing_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let timestamp: i64 = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;

    if (now - timestamp).abs() > MAX_CLOCK_SKEW_SECS {
        return Err(SignatureError::Stale);
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("v0="))
        .and_then(|v| hex::decode(v).ok())
        .ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, signing_secret.as_bytes());
    hmac::verify(&key, &base_string(timestamp, body), &signature)
        .map_err(|_| SignatureError::Mismatch)
}

fn base_string(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut base = format!("{VERSION}:{timestamp}:").into_bytes();
    base.extend_from_slice(body);
    base
}

/// Form-encoded body extractor that verifies the Slack signature first
/// (when a signing secret is configured) and rejects with JSend errors.
pub struct SlackForm<T>(pub T);

#[axum::async_trait]
impl<T> FromRequest<Arc<AppState>> for SlackForm<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, ApiError> {
        let (parts, body) = req.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::bad_request("Failed to read request body"))?;

        if let Some(secret) = state.config.slack.signing_secret.as_deref() {
            let now = chrono::Utc::now().timestamp();
            verify_request(secret, &parts.headers, &body, now).map_err(|e| {
                tracing::warn!(error = %e, "Rejected unverified slash command");
                ApiError::unauthorized(e.to_string())
            })?;
        }

        let text = std::str::from_utf8(&body)
            .map_err(|_| ApiError::bad_request("Request body is not valid UTF-8"))?;
        serde_qs::from_str(text)
            .map(SlackForm)
            .map_err(|e| ApiError::bad_request(format!("Invalid form body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = b"command=%2Fget&text=Alice&user_id=U123";

    fn sign(timestamp: i64, body: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, SECRET.as_bytes());
        let tag = hmac::sign(&key, &base_string(timestamp, body));
        format!("v0={}", hex::encode(tag.as_ref()))
    }

    fn headers(timestamp: &str, signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(timestamp).unwrap());
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        headers
    }

    #[test]
    fn test_valid_signature() {
        let ts = 1_700_000_000;
        let h = headers(&ts.to_string(), &sign(ts, BODY));
        assert_eq!(verify_request(SECRET, &h, BODY, ts + 10), Ok(()));
    }

    #[test]
    fn test_tampered_body() {
        let ts = 1_700_000_000;
        let h = headers(&ts.to_string(), &sign(ts, BODY));
        assert_eq!(
            verify_request(SECRET, &h, b"command=%2Fget&text=Bob", ts),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let ts = 1_700_000_000;
        let h = headers(&ts.to_string(), &sign(ts, BODY));
        assert_eq!(
            verify_request("other-secret", &h, BODY, ts),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp() {
        let ts = 1_700_000_000;
        let h = headers(&ts.to_string(), &sign(ts, BODY));
        assert_eq!(
            verify_request(SECRET, &h, BODY, ts + MAX_CLOCK_SKEW_SECS + 1),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn test_missing_headers() {
        assert_eq!(
            verify_request(SECRET, &HeaderMap::new(), BODY, 0),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );

        let h = headers("1700000000", "v1=abcd");
        assert_eq!(
            verify_request(SECRET, &h, BODY, 1_700_000_000),
            Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
        );
    }
}
