// ABOUTME: Provider health sweep that probes every capability's self-check.
// ABOUTME: Runs on demand or on a background interval and feeds statuses back into the registry.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::error::ProviderError;
use super::provider::CapabilityProvider;
use super::registry::CapabilityRegistry;
use super::types::{HealthReport, OverallHealth, ProviderHealth, ProviderStatus};

/// Healthy only when every provider is active.
pub fn derive_overall(per_provider: &BTreeMap<String, ProviderHealth>) -> OverallHealth {
    if per_provider
        .values()
        .all(|h| h.status == ProviderStatus::Active)
    {
        OverallHealth::Healthy
    } else {
        OverallHealth::Degraded
    }
}

pub struct HealthMonitor {
    registry: Arc<CapabilityRegistry>,
    probe_timeout: Duration,
    last: Mutex<BTreeMap<String, ProviderHealth>>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<CapabilityRegistry>, probe_timeout: Duration) -> Self {
        Self {
            registry,
            probe_timeout,
            last: Mutex::new(BTreeMap::new()),
        }
    }

    /// Probe every provider concurrently and update registry statuses.
    /// A probe that errors, panics or exceeds the timeout marks the provider
    /// unavailable.
    pub async fn sweep(&self) -> HealthReport {
        let probes = self
            .registry
            .providers()
            .into_iter()
            .map(|(id, provider)| async move {
                let health = match probe(provider, self.probe_timeout).await {
                    Ok(status) => ProviderHealth {
                        status,
                        error: None,
                        checked_at: jiff::Timestamp::now(),
                    },
                    Err(err) => {
                        log::warn!("[Health] {} failed its health check: {}", id, err);
                        ProviderHealth {
                            status: ProviderStatus::Unavailable,
                            error: Some(err.to_string()),
                            checked_at: jiff::Timestamp::now(),
                        }
                    }
                };
                (id, health)
            });

        let per_provider: BTreeMap<String, ProviderHealth> =
            join_all(probes).await.into_iter().collect();

        for (id, health) in &per_provider {
            self.registry.set_status(id, health.status);
        }

        let overall = derive_overall(&per_provider);
        log::debug!(
            "[Health] Sweep complete: {:?} across {} providers",
            overall,
            per_provider.len()
        );

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = per_provider.clone();

        HealthReport {
            overall,
            per_provider,
        }
    }

    /// Result of the most recent sweep, if any has run.
    pub fn last_report(&self) -> Option<HealthReport> {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.is_empty() {
            return None;
        }
        Some(HealthReport {
            overall: derive_overall(&last),
            per_provider: last.clone(),
        })
    }

    /// Sweep on a fixed interval, independent of request traffic, until
    /// `cancel` fires. The first sweep runs immediately.
    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("[Health] Periodic sweep every {:?}", interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        log::info!("[Health] Periodic sweep stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                }
            }
        })
    }
}

async fn probe(
    provider: Arc<dyn CapabilityProvider>,
    timeout: Duration,
) -> Result<ProviderStatus, ProviderError> {
    let mut handle = tokio::spawn(async move { provider.health_check().await });
    match tokio::time::timeout(timeout, &mut handle).await {
        Err(_) => {
            handle.abort();
            Err(ProviderError::Timeout(timeout))
        }
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ProviderError::Panicked(join_err.to_string())),
    }
}
