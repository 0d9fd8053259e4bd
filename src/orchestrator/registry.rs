// ABOUTME: Capability registry holding provider implementations, status, and usage statistics.
// ABOUTME: Static descriptors are immutable; status and stats sit behind a lock for concurrent updates.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log;

use super::config::OrchestratorConfig;
use super::error::{OrchestratorError, OrchestratorResult};
use super::provider::CapabilityProvider;
use super::types::{FailureKind, ProviderOutcome, ProviderStatus, ProviderUsage};

/// Static metadata for one capability, fixed at construction.
#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    pub id: String,
    pub tags: Vec<String>,
    pub fallback_chain: Vec<String>,
    pub validation_partner: Option<String>,
}

/// A registry entry as seen by the dispatcher at call time.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub descriptor: CapabilityDescriptor,
    pub status: ProviderStatus,
    pub provider: Arc<dyn CapabilityProvider>,
}

#[derive(Debug, Clone)]
struct ProviderState {
    status: ProviderStatus,
    request_count: u64,
    error_count: u64,
    cache_hits: u64,
    total_latency_ms: u64,
    average_latency_ms: f64,
    last_error_at: Option<jiff::Timestamp>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            status: ProviderStatus::Active,
            request_count: 0,
            error_count: 0,
            cache_hits: 0,
            total_latency_ms: 0,
            average_latency_ms: 0.0,
            last_error_at: None,
        }
    }
}

/// Registry of capability providers. Providers are never removed at runtime;
/// a provider is taken out of rotation by marking it unavailable.
pub struct CapabilityRegistry {
    order: Vec<String>,
    descriptors: HashMap<String, CapabilityDescriptor>,
    providers: HashMap<String, Arc<dyn CapabilityProvider>>,
    state: RwLock<HashMap<String, ProviderState>>,
    smoothing: f64,
}

impl CapabilityRegistry {
    /// Build a registry from configuration and one provider per configured capability.
    pub fn new(
        config: &OrchestratorConfig,
        providers: Vec<Arc<dyn CapabilityProvider>>,
    ) -> OrchestratorResult<Self> {
        let mut by_id: HashMap<String, Arc<dyn CapabilityProvider>> = HashMap::new();
        for provider in providers {
            let id = provider.id().to_string();
            if config.capability(&id).is_none() {
                return Err(OrchestratorError::UnknownCapability(id));
            }
            if by_id.insert(id.clone(), provider).is_some() {
                return Err(OrchestratorError::Config(format!(
                    "provider registered twice for capability {}",
                    id
                )));
            }
        }

        let mut order = Vec::with_capacity(config.capabilities.len());
        let mut descriptors = HashMap::new();
        let mut state = HashMap::new();
        for cap in &config.capabilities {
            if !by_id.contains_key(&cap.id) {
                return Err(OrchestratorError::Config(format!(
                    "capability {} has no provider",
                    cap.id
                )));
            }
            order.push(cap.id.clone());
            descriptors.insert(
                cap.id.clone(),
                CapabilityDescriptor {
                    id: cap.id.clone(),
                    tags: cap.tags.clone(),
                    fallback_chain: cap.fallback.clone(),
                    validation_partner: cap.validation_partner.clone(),
                },
            );
            state.insert(cap.id.clone(), ProviderState::new());
        }

        Ok(Self {
            order,
            descriptors,
            providers: by_id,
            state: RwLock::new(state),
            smoothing: config.latency_smoothing,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProviderState>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProviderState>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Capability ids in declaration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    pub fn descriptor(&self, id: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors.get(id)
    }

    pub fn resolve(&self, id: &str) -> Option<ResolvedProvider> {
        let descriptor = self.descriptors.get(id)?.clone();
        let provider = self.providers.get(id)?.clone();
        let status = self
            .read()
            .get(id)
            .map(|s| s.status)
            .unwrap_or(ProviderStatus::Unavailable);
        Some(ResolvedProvider {
            descriptor,
            status,
            provider,
        })
    }

    pub fn status(&self, id: &str) -> Option<ProviderStatus> {
        self.read().get(id).map(|s| s.status)
    }

    pub fn set_status(&self, id: &str, status: ProviderStatus) {
        if let Some(state) = self.write().get_mut(id) {
            if state.status != status {
                log::info!(
                    "[Registry] {} status {:?} -> {:?}",
                    id,
                    state.status,
                    status
                );
            }
            state.status = status;
        }
    }

    /// Record one provider call. Latency feeds an exponential moving average.
    pub fn mark_outcome(&self, id: &str, outcome: &ProviderOutcome) {
        if outcome.failure == Some(FailureKind::Cancelled) {
            return;
        }
        let mut guard = self.write();
        let Some(state) = guard.get_mut(id) else {
            return;
        };

        let latency = outcome.latency_ms as f64;
        state.average_latency_ms = if state.request_count == 0 {
            latency
        } else {
            self.smoothing * latency + (1.0 - self.smoothing) * state.average_latency_ms
        };
        state.request_count += 1;
        state.total_latency_ms += outcome.latency_ms;
        if !outcome.success {
            state.error_count += 1;
            state.last_error_at = Some(jiff::Timestamp::now());
        }
        log::debug!(
            "[Registry] {} requests={} avg_latency={:.1}ms",
            id,
            state.request_count,
            state.average_latency_ms
        );
    }

    /// Count an answer served from the cache on behalf of a provider.
    pub fn record_cache_hit(&self, id: &str) {
        if let Some(state) = self.write().get_mut(id) {
            state.cache_hits += 1;
        }
    }

    /// Providers in declaration order, for the health sweep.
    pub fn providers(&self) -> Vec<(String, Arc<dyn CapabilityProvider>)> {
        self.order
            .iter()
            .filter_map(|id| self.providers.get(id).map(|p| (id.clone(), p.clone())))
            .collect()
    }

    pub fn usage(&self) -> BTreeMap<String, ProviderUsage> {
        self.read()
            .iter()
            .map(|(id, s)| {
                (
                    id.clone(),
                    ProviderUsage {
                        status: s.status,
                        request_count: s.request_count,
                        error_count: s.error_count,
                        cache_hits: s.cache_hits,
                        total_latency_ms: s.total_latency_ms,
                        average_latency_ms: s.average_latency_ms,
                        last_error_at: s.last_error_at,
                    },
                )
            })
            .collect()
    }
}
