//! Webhook signature verification.
//!
//! Lettermint signs each delivery with an `X-Lettermint-Signature` header of
//! the form `t=<unix-seconds>,v1=<hex>`, where the hash is the lower-case hex
//! HMAC-SHA256 of `"<t>.<raw body>"` keyed with the endpoint's signing
//! secret. The same timestamp is also sent in `X-Lettermint-Delivery`.

use crate::{Error, Result, WebhookEvent};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use sha2::Sha256;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum age of a webhook timestamp.
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(5 * 60);

/// Header carrying the signature token.
pub const HEADER_SIGNATURE: &str = "x-lettermint-signature";

/// Header carrying the delivery timestamp (Unix seconds).
pub const HEADER_DELIVERY: &str = "x-lettermint-delivery";

/// Parsed `X-Lettermint-Signature` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureToken {
    /// Unix timestamp the signature is bound to.
    pub timestamp: i64,
    /// Hex-encoded HMAC-SHA256, as sent.
    pub hash: String,
}

impl SignatureToken {
    /// Parse a `t=<timestamp>,v1=<hash>` token.
    ///
    /// Pairs may come in any order and unknown keys are ignored. Fails with
    /// [`Error::InvalidSignature`] if fewer than two segments are present, `t`
    /// is not an integer, or `t`/`v1` is missing or empty.
    pub fn parse(signature: &str) -> Result<Self> {
        let parts: Vec<&str> = signature.split(',').collect();
        if parts.len() < 2 {
            return Err(Error::InvalidSignature(
                "invalid signature format, expected t={timestamp},v1={hash}".to_string(),
            ));
        }

        let mut timestamp = 0;
        let mut hash = "";
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.trim() {
                "t" => {
                    timestamp = value.trim().parse::<i64>().map_err(|_| {
                        Error::InvalidSignature("invalid timestamp in signature".to_string())
                    })?;
                }
                "v1" => hash = value.trim(),
                _ => {}
            }
        }

        if timestamp == 0 {
            return Err(Error::InvalidSignature(
                "missing timestamp (t=) in signature".to_string(),
            ));
        }
        if hash.is_empty() {
            return Err(Error::InvalidSignature(
                "missing hash (v1=) in signature".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            hash: hash.to_string(),
        })
    }
}

impl FromStr for SignatureToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={},v1={}", self.timestamp, self.hash)
    }
}

/// Reusable verifier bound to a signing secret and tolerance.
///
/// # Example
///
/// ```no_run
/// use lettermint::Webhook;
/// use std::time::Duration;
///
/// # fn handle(signature: &str, body: &[u8]) -> Result<(), lettermint::Error> {
/// let webhook = Webhook::new("whsec_secret").with_tolerance(Duration::from_secs(60));
/// let event = webhook.verify(signature, body, None)?;
/// println!("{}", event.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Webhook {
    secret: String,
    tolerance: Duration,
}

impl Webhook {
    /// Create a verifier using [`DEFAULT_WEBHOOK_TOLERANCE`].
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: DEFAULT_WEBHOOK_TOLERANCE,
        }
    }

    /// Override the timestamp tolerance.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Maximum distance allowed between a signed timestamp and now.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// See [`verify_webhook`].
    pub fn verify(
        &self,
        signature: &str,
        payload: &[u8],
        delivery_timestamp: Option<i64>,
    ) -> Result<WebhookEvent> {
        verify_webhook(
            signature,
            payload,
            delivery_timestamp,
            &self.secret,
            self.tolerance,
        )
    }

    /// See [`verify_webhook_request`].
    pub fn verify_request<R: Read>(&self, headers: &HeaderMap, body: R) -> Result<WebhookEvent> {
        verify_webhook_request(headers, body, &self.secret, self.tolerance)
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Webhook")
            .field("secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

/// Verify a webhook signature and return the parsed event.
///
/// # Arguments
/// * `signature` - The `X-Lettermint-Signature` header value
/// * `payload` - The raw request body, exactly as received
/// * `delivery_timestamp` - The `X-Lettermint-Delivery` value; `None` or `0` skips the cross-check
/// * `signing_secret` - The endpoint's signing secret
/// * `tolerance` - Maximum distance between the signed timestamp and now, usually [`DEFAULT_WEBHOOK_TOLERANCE`]
///
/// # Errors
/// - [`Error::InvalidSignature`] for an empty secret or signature, a malformed
///   token, a delivery timestamp mismatch, or a wrong hash
/// - [`Error::TimestampExpired`] when the signed timestamp is more than
///   `tolerance` in the past or in the future
/// - [`Error::PayloadParse`] when the signature is valid but the body is not a
///   valid event
pub fn verify_webhook(
    signature: &str,
    payload: &[u8],
    delivery_timestamp: Option<i64>,
    signing_secret: &str,
    tolerance: Duration,
) -> Result<WebhookEvent> {
    verify_at(
        signature,
        payload,
        delivery_timestamp,
        signing_secret,
        tolerance,
        unix_now(),
    )
}

/// Verify a webhook from request headers and body.
///
/// A missing signature header is rejected; a missing delivery header only
/// skips the timestamp cross-check. A body read failure is returned as
/// [`Error::Io`], not as a signature error.
///
/// # Example
///
/// ```no_run
/// use lettermint::{verify_webhook_request, DEFAULT_WEBHOOK_TOLERANCE};
/// use reqwest::header::HeaderMap;
///
/// # fn handle(headers: &HeaderMap, body: &[u8]) -> Result<(), lettermint::Error> {
/// let event = verify_webhook_request(headers, body, "whsec_secret", DEFAULT_WEBHOOK_TOLERANCE)?;
/// println!("{}", event.event);
/// # Ok(())
/// # }
/// ```
pub fn verify_webhook_request<R: Read>(
    headers: &HeaderMap,
    mut body: R,
    signing_secret: &str,
    tolerance: Duration,
) -> Result<WebhookEvent> {
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::InvalidSignature(format!("missing {HEADER_SIGNATURE} header"))
        })?;

    let delivery_timestamp = match headers.get(HEADER_DELIVERY).map(|v| v.to_str()) {
        Some(Ok("")) | None => None,
        Some(value) => Some(
            value
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    Error::InvalidSignature(format!("invalid {HEADER_DELIVERY} header value"))
                })?,
        ),
    };

    let mut payload = Vec::new();
    body.read_to_end(&mut payload)?;

    verify_webhook(
        signature,
        &payload,
        delivery_timestamp,
        signing_secret,
        tolerance,
    )
}

/// Build a valid signature token for `payload` at `timestamp`.
///
/// Useful for fixtures and local testing of webhook handlers.
pub fn sign_payload(signing_secret: &str, timestamp: i64, payload: &[u8]) -> SignatureToken {
    SignatureToken {
        timestamp,
        hash: compute_hmac(signing_secret, timestamp, payload),
    }
}

fn verify_at(
    signature: &str,
    payload: &[u8],
    delivery_timestamp: Option<i64>,
    signing_secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<WebhookEvent> {
    if signing_secret.is_empty() {
        return Err(Error::InvalidSignature(
            "signing secret is required".to_string(),
        ));
    }
    if signature.is_empty() {
        return Err(Error::InvalidSignature("signature is required".to_string()));
    }

    let token = SignatureToken::parse(signature)?;

    if let Some(delivery) = delivery_timestamp.filter(|&t| t != 0) {
        if delivery != token.timestamp {
            tracing::debug!("webhook delivery timestamp does not match signature");
            return Err(Error::InvalidSignature(
                "timestamp mismatch between signature and delivery headers".to_string(),
            ));
        }
    }

    let age = now.abs_diff(token.timestamp);
    if age > tolerance.as_secs() {
        tracing::debug!(
            timestamp = token.timestamp,
            age,
            "webhook timestamp outside tolerance"
        );
        return Err(Error::TimestampExpired {
            timestamp: token.timestamp,
            age,
            tolerance,
        });
    }

    let expected = compute_hmac(signing_secret, token.timestamp, payload);
    if !secure_compare(&token.hash, &expected) {
        tracing::debug!("webhook signature verification failed");
        return Err(Error::InvalidSignature(
            "signature verification failed".to_string(),
        ));
    }

    let mut event: WebhookEvent = serde_json::from_slice(payload).map_err(Error::PayloadParse)?;
    event.raw_payload = payload.to_vec();

    Ok(event)
}

/// Lower-case hex HMAC-SHA256 of `"<timestamp>.<payload>"`.
fn compute_hmac(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison.
///
/// Differing lengths return early; equal-length inputs are compared in full.
fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
