pub mod token;

use chrono::{DateTime, Utc};

use crate::errors::{KeeperError, KeeperResult};

pub use token::{issue_token, verify_token, LicenceRejection};

/// Shared secret that signs every licence token this tool accepts.
/// Tokens minted by the existing `x.py` generator use the same key.
pub const SHARED_SECRET: &str = "M.jiEp[+*Ay0b^p";

/// Environment variable consulted when no licence is passed on the command line.
pub const LICENCE_ENV: &str = "IDLEKEEPER_LICENCE";

/// Startup precondition: the supervision loop may only run with a valid token.
pub fn check_gate(token: Option<&str>, now: DateTime<Utc>) -> KeeperResult<String> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| KeeperError::Licence("no licence token configured".to_string()))?;

    match verify_token(SHARED_SECRET, token, now) {
        Ok(payload) => {
            tracing::debug!(payload = %payload, "licence check success");
            Ok(payload)
        }
        Err(reason) => {
            tracing::error!(reason = %reason, "licence check failed");
            Err(KeeperError::Licence(reason.to_string()))
        }
    }
}
