// client.rs - public façade: construct, authenticate, failover, shutdown.
//
// Thin orchestration layer over failover.rs/protocol.rs. Owns the
// background health-cycle timer task; everything else is delegated.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ClientConfig;
use crate::error::{AuthError, ClientError};
use crate::failover::FailoverController;
use crate::health::HostRecord;
use crate::protocol::{self, AuthOptions, AuthOutcome};

/// Public façade. Cloning is not provided: `shutdown` consumes the client
/// to make the timer-cancellation contract explicit.
pub struct Client {
    failover: Arc<FailoverController>,
    auth_options: AuthOptions,
    health_cycle_handle: JoinHandle<()>,
}

impl Client {
    /// Validates configuration, builds the host pool and health table,
    /// kicks off initial selection in the background, and starts the
    /// background health-cycle timer. Construction does not wait for
    /// initial selection to finish.
    pub async fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let pool = config.host_pool();

        let auth_options = AuthOptions::new(
            config.secret.as_bytes().to_vec(),
            config.port,
            Duration::from_millis(config.timeout_ms),
            config.assignment_attribute_id,
            config.vendor_id,
            config.vendor_type,
            config.value_pattern.as_deref(),
        )?;

        // Health-check probes never need assignment extraction.
        let health_options = AuthOptions::new(
            config.secret.as_bytes().to_vec(),
            config.port,
            Duration::from_millis(config.health_check_timeout_ms),
            config.assignment_attribute_id,
            None,
            None,
            None,
        )?;

        let failover = Arc::new(FailoverController::new(
            pool,
            config.health_check_user.clone(),
            config.health_check_password.clone(),
            health_options,
        ));

        {
            let failover = Arc::clone(&failover);
            tokio::spawn(async move {
                failover.fast_failover_sequence().await;
            });
        }

        let interval_ms = config.effective_health_check_interval_ms();
        let health_cycle_handle = {
            let failover = Arc::clone(&failover);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
                // A tick that overlaps a still-running cycle is dropped,
                // not queued, so cycles never pile up behind a slow probe.
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    failover.run_health_cycle().await;
                }
            })
        };

        Ok(Self { failover, auth_options, health_cycle_handle })
    }

    /// Authenticates against the current active host. On a timeout,
    /// schedules a failover check in the background and returns the
    /// original outcome immediately.
    pub async fn authenticate(&self, user: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        let host = self.failover.get_active_host().await;
        let outcome = protocol::authenticate(&host, user, password, &self.auth_options).await?;

        if outcome.error == Some(AuthError::Timeout) {
            let failover = Arc::clone(&self.failover);
            tokio::spawn(async move {
                failover.on_auth_timeout().await;
            });
        }

        Ok(outcome)
    }

    /// Forces a failover sequence; see `FailoverController::failover`.
    pub async fn failover(&self) -> Option<String> {
        self.failover.failover().await
    }

    /// The pool member currently receiving traffic, or the pool's first
    /// element as a fallback when no host is active (not promoted).
    pub async fn get_active_host(&self) -> String {
        self.failover.get_active_host().await
    }

    /// Per-host health snapshot, for status reporting.
    pub async fn health_snapshot(&self) -> Vec<HostRecord> {
        self.failover.health_snapshot().await
    }

    /// Stops the background health-cycle timer. In-flight authentications
    /// and probes are not cancelled; they complete or time out on their
    /// own.
    pub async fn shutdown(self) {
        self.health_cycle_handle.abort();
    }
}
