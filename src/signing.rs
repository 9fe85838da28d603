//! HMAC-SHA256 webhook signatures.
//!
//! The signable message is `"{timestamp}.{body}"` where `body` is the exact serialized request
//! body. Tokens are rendered as `sha256=<lowercase hex>`. Receivers recompute the token from the
//! `X-Webhook-Timestamp` header and the raw body, and should reject stale timestamps with
//! [`is_fresh`]; the sender does not enforce a replay window.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, identity::SigningSecret};

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by every signature token.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Failures raised while producing or checking a signature.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SigningError {
	/// The HMAC primitive refused the key.
	#[error("signing key was rejected")]
	InvalidKey,
	/// The payload is not valid UTF-8 and cannot form the signable string.
	#[error("payload is not valid UTF-8")]
	NonUtf8Payload,
}

/// Signs `payload` with `secret` at `timestamp` (unix seconds), returning `sha256=<hex>`.
pub fn sign(payload: &[u8], secret: &SigningSecret, timestamp: i64) -> Result<String, SigningError> {
	let mac = keyed_mac(payload, secret, timestamp)?;

	Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

/// Recomputes the signature and compares it against `token` in constant time.
pub fn verify(payload: &[u8], secret: &SigningSecret, timestamp: i64, token: &str) -> bool {
	let Some(expected) = token.strip_prefix(SIGNATURE_PREFIX).and_then(|h| hex::decode(h).ok())
	else {
		return false;
	};

	match keyed_mac(payload, secret, timestamp) {
		Ok(mac) => mac.verify_slice(&expected).is_ok(),
		Err(_) => false,
	}
}

/// Whether `timestamp` lies within `tolerance` of `now` (both unix seconds), in either direction.
pub fn is_fresh(timestamp: i64, now: i64, tolerance: Duration) -> bool {
	let skew = now.saturating_sub(timestamp).saturating_abs();

	skew <= tolerance.whole_seconds()
}

fn keyed_mac(payload: &[u8], secret: &SigningSecret, timestamp: i64) -> Result<HmacSha256, SigningError> {
	let body = std::str::from_utf8(payload).map_err(|_| SigningError::NonUtf8Payload)?;
	let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
		.map_err(|_| SigningError::InvalidKey)?;

	mac.update(timestamp.to_string().as_bytes());
	mac.update(b".");
	mac.update(body.as_bytes());

	Ok(mac)
}
