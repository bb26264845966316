//! Token Revocation for the Authentication Layer
//!
//! [`Revocations`] is the piece the authentication layer owns: it records
//! revoked token ids (the JWT `jti` claim) until each token's own expiry and
//! rejects them during verification. Signing and signature checks live
//! elsewhere; this module only sees ids and expiry timestamps.

use crate::blacklist::{Clock, ExpiringSet, SystemClock};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported while checking a token against the blacklist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token id has been revoked
    #[error("token {0} has been revoked")]
    Revoked(String),
}

/// Revoked-token registry backed by an [`ExpiringSet`].
#[derive(Clone)]
pub struct Revocations {
    set: ExpiringSet<String>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Revocations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revocations").field("set", &self.set).finish()
    }
}

impl Revocations {
    /// Wraps an existing set, using the system clock to judge expiry.
    pub fn new(set: ExpiringSet<String>) -> Self {
        Self::with_clock(set, Arc::new(SystemClock))
    }

    /// Wraps an existing set, judging expiry with `clock`.
    pub fn with_clock(set: ExpiringSet<String>, clock: Arc<dyn Clock>) -> Self {
        Self { set, clock }
    }

    /// Revokes the token `jti` until `expires_at_ms`.
    ///
    /// Returns `false` without recording anything if the token has already
    /// expired, since verification rejects it regardless.
    pub fn revoke(&self, jti: impl Into<String>, expires_at_ms: u64) -> bool {
        let jti = jti.into();

        if expires_at_ms < self.clock.now_ms() {
            debug!(jti = %jti, "Token already expired, not blacklisting");
            return false;
        }

        info!(jti = %jti, expires_at_ms = expires_at_ms, "Token revoked");
        self.set.insert(jti, expires_at_ms, None);
        true
    }

    /// Fails with [`AuthError::Revoked`] if `jti` is blacklisted.
    pub fn check(&self, jti: &str) -> Result<(), AuthError> {
        if self.set.contains(jti) {
            return Err(AuthError::Revoked(jti.to_string()));
        }
        Ok(())
    }

    /// Returns the number of currently revoked tokens.
    pub fn revoked_count(&self) -> usize {
        self.set.len()
    }

    /// Returns the underlying set.
    pub fn set(&self) -> &ExpiringSet<String> {
        &self.set
    }
}
