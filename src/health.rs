// health.rs - per-host liveness record and the probe routine that updates it.
//
// Owns no policy about *which* host to probe or what to do with the
// result — that's failover.rs. This module only knows how to run one
// probe and keep a host's record honest afterwards.

use chrono::{DateTime, Utc};

use crate::error::AuthError;
use crate::protocol::{self, AuthOptions};

/// Liveness record for one pool member.
#[derive(Debug, Clone)]
pub struct HostRecord {
    pub host: String,
    pub last_ok_at: Option<DateTime<Utc>>,
    pub last_tried_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl HostRecord {
    pub fn new(host: String) -> Self {
        Self { host, last_ok_at: None, last_tried_at: None, consecutive_failures: 0 }
    }
}

/// An outcome produced by a RADIUS server counts as "alive" even when it's
/// not an accept: a reject, challenge, or authenticator mismatch still
/// proves a live server answered.
fn outcome_is_alive(ok: bool, error: Option<AuthError>) -> bool {
    if ok {
        return true;
    }
    matches!(error, Some(AuthError::AccessReject) | Some(AuthError::AccessChallenge) | Some(AuthError::AuthenticatorMismatch))
}

/// Runs one health-check transaction against `record.host` and updates the
/// record. Returns `true` if the host should be treated as alive.
///
/// Transport faults (`ClientError`) are caught here and treated as a dead
/// host — this is the one place in the crate where a `ClientError` does
/// not propagate to the caller.
pub async fn probe_host(record: &mut HostRecord, user: &str, password: &str, options: &AuthOptions) -> bool {
    record.last_tried_at = Some(Utc::now());

    let outcome = match protocol::authenticate(&record.host, user, password, options).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::warn!(host = %record.host, %error, "probe transport error, marking host dead");
            record.consecutive_failures += 1;
            return false;
        }
    };

    if outcome_is_alive(outcome.ok, outcome.error) {
        record.last_ok_at = Some(Utc::now());
        record.consecutive_failures = 0;
        tracing::debug!(host = %record.host, "probe succeeded");
        true
    } else {
        record.consecutive_failures += 1;
        tracing::debug!(host = %record.host, error = ?outcome.error, "probe failed");
        false
    }
}
