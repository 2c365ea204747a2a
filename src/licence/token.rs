//! Signed, time-limited licence tokens.
//!
//! A token is the URL-safe base64 encoding of `"{expiry}:{signature}:{payload}"`,
//! where `expiry` is unix seconds as a decimal float and `signature` is the
//! hex HMAC-SHA1 of `"{expiry}:{payload}"` under the shared secret.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

use crate::errors::{KeeperError, KeeperResult};

type HmacSha1 = Hmac<Sha1>;

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenceRejection {
    #[error("token decode failed")]
    Decode,
    #[error("token invalid format")]
    Format,
    #[error("token expired")]
    Expired,
    #[error("token certification failed")]
    Signature,
}

fn unix_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

fn signing_input(expiry: &str, payload: &str) -> String {
    format!("{expiry}:{payload}")
}

fn mac_for(secret: &str, expiry: &str, payload: &str) -> KeeperResult<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| KeeperError::Licence(format!("invalid signing key: {e}")))?;
    mac.update(signing_input(expiry, payload).as_bytes());
    Ok(mac)
}

/// Mints a token valid for `valid_for` starting at `now`.
pub fn issue_token(
    secret: &str,
    valid_for: chrono::Duration,
    payload: &str,
    now: DateTime<Utc>,
) -> KeeperResult<String> {
    if payload.contains(':') {
        return Err(KeeperError::Licence(
            "payload must not contain ':'".to_string(),
        ));
    }
    let expiry = format!("{:.6}", unix_secs(now + valid_for));
    let signature = hex::encode(mac_for(secret, &expiry, payload)?.finalize().into_bytes());
    let token = format!("{expiry}:{signature}:{payload}");
    Ok(base64::engine::general_purpose::URL_SAFE.encode(token.as_bytes()))
}

/// Checks a token and returns its payload.
///
/// Checks run in order: decoding, shape, expiry, then signature.
pub fn verify_token(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<String, LicenceRejection> {
    let raw = base64::engine::general_purpose::URL_SAFE
        .decode(token.trim().as_bytes())
        .map_err(|_| LicenceRejection::Decode)?;
    let text = String::from_utf8(raw).map_err(|_| LicenceRejection::Decode)?;

    let parts: Vec<&str> = text.split(':').collect();
    let [expiry, signature, payload] = parts.as_slice() else {
        return Err(LicenceRejection::Format);
    };
    let expires_at: f64 = expiry.parse().map_err(|_| LicenceRejection::Format)?;

    if expires_at < unix_secs(now) {
        return Err(LicenceRejection::Expired);
    }

    let expected = hex::decode(signature).map_err(|_| LicenceRejection::Signature)?;
    let mac = mac_for(secret, expiry, payload).map_err(|_| LicenceRejection::Signature)?;
    mac.verify_slice(&expected)
        .map_err(|_| LicenceRejection::Signature)?;

    Ok(payload.to_string())
}
