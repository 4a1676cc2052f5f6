// failover.rs - active-host selection and probing policy.
//
// Owns the host pool, the active-host slot, the health table, and the
// cooperative `inProgress` guard serializing failover sequences. Doesn't
// know about timers or sockets directly: sequencing is driven by
// client.rs, probing is done through health.rs/protocol.rs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::health::{probe_host, HostRecord};
use crate::protocol::AuthOptions;

/// RAII release for the `inProgress` guard: whichever sequence acquired it
/// releases it on drop, including on an early return.
struct InProgressGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Owns the pool, active host, and health table for one client instance.
pub struct FailoverController {
    pool: Vec<String>,
    active: RwLock<Option<String>>,
    health: RwLock<HashMap<String, HostRecord>>,
    in_progress: AtomicBool,
    health_check_user: String,
    health_check_password: String,
    health_options: AuthOptions,
}

impl FailoverController {
    pub fn new(
        pool: Vec<String>,
        health_check_user: String,
        health_check_password: String,
        health_options: AuthOptions,
    ) -> Self {
        let health = pool.iter().cloned().map(|host| (host.clone(), HostRecord::new(host))).collect();
        Self {
            pool,
            active: RwLock::new(None),
            health: RwLock::new(health),
            in_progress: AtomicBool::new(false),
            health_check_user,
            health_check_password,
            health_options,
        }
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    /// With no active host set, callers fall back to the pool's first
    /// element, without that element being promoted to active.
    pub async fn get_active_host(&self) -> String {
        match &*self.active.read().await {
            Some(host) => host.clone(),
            None => self.pool[0].clone(),
        }
    }

    /// Snapshot of every pool member's health record, for status reporting.
    pub async fn health_snapshot(&self) -> Vec<HostRecord> {
        let health = self.health.read().await;
        self.pool.iter().filter_map(|host| health.get(host).cloned()).collect()
    }

    fn try_acquire(&self) -> Option<InProgressGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InProgressGuard { flag: &self.in_progress })
    }

    async fn probe(&self, host: &str) -> bool {
        let mut health = self.health.write().await;
        let record = health.entry(host.to_string()).or_insert_with(|| HostRecord::new(host.to_string()));
        probe_host(record, &self.health_check_user, &self.health_check_password, &self.health_options).await
    }

    /// Iteration order for `failover()`: the pool rotated to start right
    /// after the current active host, with the active host itself skipped.
    /// With no active host, the whole pool in priority order.
    fn rotated_order(&self, active: Option<&str>) -> Vec<String> {
        match active.and_then(|a| self.pool.iter().position(|h| h == a)) {
            Some(idx) => (1..self.pool.len()).map(|offset| self.pool[(idx + offset) % self.pool.len()].clone()).collect(),
            None => self.pool.clone(),
        }
    }

    /// Runs at construction: probes the pool in priority order and
    /// promotes the first responsive host. A no-op if a sequence is
    /// already running.
    pub async fn fast_failover_sequence(&self) {
        let Some(_guard) = self.try_acquire() else {
            tracing::debug!("fast-failover sequence already in progress, skipping");
            return;
        };

        for host in &self.pool {
            if self.probe(host).await {
                *self.active.write().await = Some(host.clone());
                tracing::info!(host, "active host selected");
                return;
            }
        }
        tracing::warn!("no host responded during fast-failover sequence");
    }

    /// Public failover, used on explicit request or live-traffic timeout.
    /// Returns `None` both when a sequence is already running and when no
    /// host responded — the caller cannot distinguish the two.
    pub async fn failover(&self) -> Option<String> {
        let _guard = self.try_acquire()?;

        let current_active = self.active.read().await.clone();
        let order = self.rotated_order(current_active.as_deref());
        for host in order {
            if self.probe(&host).await {
                *self.active.write().await = Some(host.clone());
                tracing::info!(host, "failover selected new active host");
                return Some(host);
            }
        }

        *self.active.write().await = None;
        tracing::warn!("failover found no responsive host");
        None
    }

    /// Shared path for the background timer and for a live-traffic timeout:
    /// the two react identically. Probes the active host if one exists and
    /// fails over on failure; otherwise runs the same pool scan as initial
    /// selection.
    pub async fn run_health_cycle(&self) {
        let current_active = self.active.read().await.clone();
        match current_active {
            Some(host) => {
                if !self.probe(&host).await {
                    self.failover().await;
                }
            }
            None => self.fast_failover_sequence().await,
        }
    }

    /// Invoked when a live `authenticate` call observes a timeout.
    pub async fn on_auth_timeout(&self) {
        self.run_health_cycle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn controller(pool: Vec<&str>) -> FailoverController {
        let options =
            AuthOptions::new(b"s3cret".to_vec(), 1812, Duration::from_millis(50), 25, None, None, None).unwrap();
        FailoverController::new(
            pool.into_iter().map(str::to_string).collect(),
            "probe".to_string(),
            "probe-pass".to_string(),
            options,
        )
    }

    #[tokio::test]
    async fn active_host_falls_back_to_pool_first_without_promotion() {
        let controller = controller(vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(controller.get_active_host().await, "10.0.0.1");
        assert!(controller.active.read().await.is_none());
    }

    #[test]
    fn rotated_order_skips_and_wraps_around_active() {
        let controller = controller(vec!["a", "b", "c", "d"]);
        assert_eq!(controller.rotated_order(Some("b")), vec!["c", "d", "a"]);
        assert_eq!(controller.rotated_order(Some("d")), vec!["a", "b", "c"]);
    }

    #[test]
    fn rotated_order_with_no_active_is_full_pool() {
        let controller = controller(vec!["a", "b", "c"]);
        assert_eq!(controller.rotated_order(None), vec!["a", "b", "c"]);
    }

    #[test]
    fn in_progress_guard_rejects_concurrent_acquire_and_releases_on_drop() {
        let controller = controller(vec!["a"]);
        let first = controller.try_acquire();
        assert!(first.is_some());
        assert!(controller.try_acquire().is_none());
        drop(first);
        assert!(controller.try_acquire().is_some());
    }
}
