// ABOUTME: Orchestrator service that ties classifier, selector, dispatcher, and cache together.
// ABOUTME: Provides the submit(), health(), and stats() entry points plus request cancellation.

use log;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::cache::{InMemoryResponseCache, ResponseCache, cache_key};
use super::classifier::Classifier;
use super::config::OrchestratorConfig;
use super::consensus::{build_consensus, total_failure};
use super::dispatcher::Dispatcher;
use super::error::{OrchestratorError, OrchestratorResult};
use super::health::HealthMonitor;
use super::metrics::OrchestratorMetrics;
use super::provider::{self, CapabilityProvider};
use super::registry::CapabilityRegistry;
use super::router::StrategySelector;
use super::types::{
    DispatchStrategy, HealthReport, OrchestrationResult, RequestContext, StatsReport,
};
use super::validator::CrossValidator;

// =============================================================================
// Construction
// =============================================================================

/// Builds an [`Orchestrator`]. Providers added with `with_provider` take
/// precedence over provider specs declared in the configuration.
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    providers: Vec<Arc<dyn CapabilityProvider>>,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl OrchestratorBuilder {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            cache: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_providers(
        mut self,
        providers: impl IntoIterator<Item = Arc<dyn CapabilityProvider>>,
    ) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Replace the default in-memory cache.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> OrchestratorResult<Orchestrator> {
        let config = self.config;
        config.validate()?;

        let mut providers = self.providers;
        for cap in &config.capabilities {
            if providers.iter().any(|p| p.id() == cap.id) {
                continue;
            }
            if let Some(spec) = &cap.provider {
                let provider = provider::from_spec(&cap.id, spec).map_err(|e| {
                    OrchestratorError::Config(format!("provider for {}: {}", cap.id, e))
                })?;
                providers.push(provider);
            }
        }

        let registry = Arc::new(CapabilityRegistry::new(&config, providers)?);

        log::info!(
            "[Orchestrator] Ready with {} capabilities",
            registry.ids().len()
        );

        Ok(Orchestrator {
            classifier: Classifier::new(&config)?,
            selector: StrategySelector::new(&config)?,
            dispatcher: Dispatcher::new(registry.clone(), config.call_timeout()),
            validator: CrossValidator::new(config.validation_threshold),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(InMemoryResponseCache::new())),
            health: Arc::new(HealthMonitor::new(registry.clone(), config.health_timeout())),
            metrics: OrchestratorMetrics::new(config.latency_smoothing),
            registry,
            active_sessions: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            cache_ttl: config.cache_ttl(),
            health_interval: config.health_interval(),
        })
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct Orchestrator {
    classifier: Classifier,
    selector: StrategySelector,
    dispatcher: Dispatcher,
    validator: CrossValidator,
    cache: Arc<dyn ResponseCache>,
    registry: Arc<CapabilityRegistry>,
    health: Arc<HealthMonitor>,
    metrics: OrchestratorMetrics,
    /// Map of request_id → cancellation token for in-flight requests.
    active_sessions: Mutex<HashMap<String, CancellationToken>>,
    /// Parent of every request token and of the health sweep.
    shutdown: CancellationToken,
    cache_ttl: Duration,
    health_interval: Duration,
}

impl Orchestrator {
    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Execute the full pipeline for one request. Always returns a result;
    /// failures show up as failed outcomes or an apology answer.
    ///
    /// 1. Classify and select a plan
    /// 2. Serve from cache unless `force_refresh`
    /// 3. Dispatch, then pick a primary answer
    /// 4. Cross-validate when critical or low confidence
    /// 5. Cache successful results and update metrics
    pub async fn submit(&self, request: &str, context: RequestContext) -> OrchestrationResult {
        let started = Instant::now();
        let request_id = context
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let cancel = self.shutdown.child_token();
        {
            let mut sessions = self.active_sessions.lock().await;
            sessions.insert(request_id.clone(), cancel.clone());
        }

        let result = self
            .execute(request_id.clone(), request, &context, &cancel, started)
            .await;

        {
            let mut sessions = self.active_sessions.lock().await;
            sessions.remove(&request_id);
        }

        result
    }

    async fn execute(
        &self,
        request_id: String,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
        started: Instant,
    ) -> OrchestrationResult {
        log::info!("[Orchestrator] Starting request {}", request_id);

        let classification = self.classifier.classify(request);
        log::info!(
            "[Orchestrator] Classification: primary={}, confidence={:.2}, defaulted={}",
            classification.primary_capability,
            classification.confidence,
            classification.defaulted
        );

        let plan = self
            .selector
            .select(&classification, request, context, &self.registry);
        log::info!(
            "[Orchestrator] Plan: {} over {:?} ({})",
            plan.strategy.as_str(),
            plan.targets,
            plan.rationale
        );

        let key = cache_key(request, &plan.targets, plan.strategy);
        if context.force_refresh {
            log::debug!("[Cache] Bypassed for request {}", request_id);
        } else if let Some(hit) = self.cache.get(&key) {
            let mut result = (*hit).clone();
            result.request_id = request_id;
            result.classification = classification;
            result.plan = plan;
            result.cached = true;

            log::debug!(
                "[Cache] Hit for request {}, answered by {}",
                result.request_id,
                result.primary_outcome.provider_id
            );

            // Entries written by a non-critical request carry no validation.
            if context.critical && result.validation.is_none() {
                result.validation = self
                    .validator
                    .cross_validate(
                        &self.dispatcher,
                        &result.primary_outcome,
                        request,
                        context,
                        cancel,
                    )
                    .await;
            }

            result.total_latency_ms = started.elapsed().as_millis() as u64;
            self.registry
                .record_cache_hit(&result.primary_outcome.provider_id);
            self.metrics
                .record(result.success(), result.total_latency_ms, true);
            return result;
        }

        let outcomes = self
            .dispatcher
            .dispatch(&plan, request, context, cancel)
            .await;

        let (primary_outcome, confidence) = match build_consensus(&outcomes) {
            Some(consensus) => (consensus.primary, consensus.confidence),
            None => {
                // Single and reasoning plans have one authoritative call whose
                // failure (e.g. ChainExhausted) stands as the answer.
                let lead = match plan.strategy {
                    DispatchStrategy::Single | DispatchStrategy::Reasoning => {
                        outcomes.first().cloned()
                    }
                    DispatchStrategy::Parallel | DispatchStrategy::Consensus => None,
                };
                let primary = lead.unwrap_or_else(|| {
                    total_failure(&outcomes, started.elapsed().as_millis() as u64)
                });
                (primary, 0.0)
            }
        };

        let validation = if primary_outcome.success
            && self.validator.should_validate(confidence, context)
        {
            self.validator
                .cross_validate(&self.dispatcher, &primary_outcome, request, context, cancel)
                .await
        } else {
            None
        };

        let result = OrchestrationResult {
            request_id,
            classification,
            plan,
            outcomes,
            primary_outcome,
            confidence,
            validation,
            cached: false,
            total_latency_ms: started.elapsed().as_millis() as u64,
        };

        if result.success() {
            self.cache
                .put(key, Arc::new(result.clone()), self.cache_ttl);
        }
        self.metrics
            .record(result.success(), result.total_latency_ms, false);

        log::info!(
            "[Orchestrator] Request {} finished: success={}, primary={}, {}ms",
            result.request_id,
            result.success(),
            result.primary_outcome.provider_id,
            result.total_latency_ms
        );

        result
    }

    /// Probe every provider now and return the aggregate status.
    pub async fn health(&self) -> HealthReport {
        self.health.sweep().await
    }

    /// Report from the most recent sweep, on demand or periodic, without
    /// probing again. None until a sweep has run.
    pub fn last_health(&self) -> Option<HealthReport> {
        self.health.last_report()
    }

    pub fn stats(&self) -> StatsReport {
        self.cache.purge_expired();
        let snapshot = self.metrics.snapshot();
        StatsReport {
            total_requests: snapshot.total_requests,
            cache_hits: snapshot.cache_hits,
            success_rate: snapshot.success_rate,
            average_latency_ms: snapshot.average_latency_ms,
            cache_size: self.cache.len(),
            per_provider_usage: self.registry.usage(),
        }
    }

    /// Cancel an in-flight request. Returns false when no such request is active.
    pub async fn cancel(&self, request_id: &str) -> bool {
        let mut sessions = self.active_sessions.lock().await;
        if let Some(token) = sessions.remove(request_id) {
            token.cancel();
            log::info!("[Orchestrator] Cancelled request {}", request_id);
            true
        } else {
            log::warn!("[Orchestrator] No active request {}", request_id);
            false
        }
    }

    /// Start the periodic health sweep. It stops on `shutdown()`.
    pub fn start_health_sweep(&self) -> JoinHandle<()> {
        self.health
            .clone()
            .spawn(self.health_interval, self.shutdown.child_token())
    }

    /// Cancel every in-flight request and stop background work.
    pub async fn shutdown(&self) {
        let mut sessions = self.active_sessions.lock().await;
        log::info!(
            "[Orchestrator] Shutting down with {} active requests",
            sessions.len()
        );
        sessions.clear();
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::consensus::NO_ANSWER_APOLOGY;
    use crate::orchestrator::dispatcher::CHAIN_EXHAUSTED_APOLOGY;
    use crate::orchestrator::test_support::{Behavior, FakeProvider, providers_with, test_config};
    use crate::orchestrator::types::{FailureKind, OverallHealth, SYSTEM_PROVIDER_ID};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cache that records every lookup and store.
    #[derive(Default)]
    struct RecordingCache {
        inner: InMemoryResponseCache,
        gets: AtomicUsize,
        puts: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingCache {
        fn gets(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        fn puts(&self) -> Vec<String> {
            self.puts.lock().unwrap().clone()
        }
    }

    impl ResponseCache for RecordingCache {
        fn get(&self, key: &str) -> Option<Arc<OrchestrationResult>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn put(&self, key: String, entry: Arc<OrchestrationResult>, ttl: Duration) {
            self.puts.lock().unwrap().push(key.clone());
            self.inner.put(key, entry, ttl);
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn purge_expired(&self) -> usize {
            self.inner.purge_expired()
        }
    }

    fn orchestrator_with_cache(
        overrides: Vec<Arc<FakeProvider>>,
        cache: Arc<RecordingCache>,
    ) -> Orchestrator {
        Orchestrator::builder(test_config())
            .with_providers(providers_with(overrides))
            .with_cache(cache)
            .build()
            .unwrap()
    }

    fn all_failing() -> Vec<Arc<FakeProvider>> {
        test_config()
            .capabilities
            .iter()
            .map(|c| FakeProvider::failing(&c.id))
            .collect()
    }

    fn orchestrator_with(config: OrchestratorConfig, overrides: Vec<Arc<FakeProvider>>) -> Orchestrator {
        Orchestrator::builder(config)
            .with_providers(providers_with(overrides))
            .build()
            .unwrap()
    }

    fn orchestrator(overrides: Vec<Arc<FakeProvider>>) -> Orchestrator {
        orchestrator_with(test_config(), overrides)
    }

    const COURT_QUESTION: &str = "Which court handles family law?";

    #[tokio::test]
    async fn confident_request_goes_to_single_provider() {
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let orch = orchestrator(vec![legal.clone()]);

        let result = orch.submit(COURT_QUESTION, RequestContext::default()).await;

        assert!(result.success());
        assert_eq!(result.plan.strategy, DispatchStrategy::Single);
        assert_eq!(result.primary_outcome.provider_id, "legal");
        assert_eq!(result.confidence, 0.9);
        assert!(result.validation.is_none());
        assert!(!result.cached);
        assert_eq!(legal.calls(), 1);
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let orch = orchestrator(vec![legal.clone()]);

        let first = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        let second = orch.submit("which  court handles FAMILY law?", RequestContext::default()).await;

        assert_eq!(legal.calls(), 1);
        assert!(second.cached);
        assert_eq!(second.primary_outcome, first.primary_outcome);
        assert_eq!(second.outcomes, first.outcomes);
        assert_ne!(second.request_id, first.request_id);

        let stats = orch.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.per_provider_usage["legal"].cache_hits, 1);
        assert_eq!(stats.per_provider_usage["legal"].request_count, 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache() {
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let orch = orchestrator(vec![legal.clone()]);

        orch.submit(COURT_QUESTION, RequestContext::default()).await;
        let refreshed = orch
            .submit(
                COURT_QUESTION,
                RequestContext {
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(!refreshed.cached);
        assert_eq!(legal.calls(), 2);
    }

    #[tokio::test]
    async fn analytical_request_runs_reasoning_plan() {
        let reasoning = FakeProvider::replying("reasoning", "x = 0.5 or x = -3", Some(0.8));
        let orch = orchestrator(vec![reasoning.clone()]);

        let result = orch.submit("2x^2+5x-3=0 çöz", RequestContext::default()).await;

        assert_eq!(result.plan.strategy, DispatchStrategy::Reasoning);
        assert_eq!(
            result.plan.targets,
            vec!["reasoning", "general-knowledge", "guide"]
        );
        assert_eq!(result.outcomes.len(), 3);
        assert!(result.outcomes[1..].iter().all(|o| o.auxiliary));
        assert_eq!(result.primary_outcome.provider_id, "reasoning");
        assert_eq!(reasoning.calls(), 1);
    }

    #[tokio::test]
    async fn total_failure_returns_apology_and_is_not_cached() {
        let failing = all_failing();
        let legal = failing[0].clone();
        let orch = orchestrator(failing);

        let result = orch.submit("zzzz", RequestContext::default()).await;

        assert_eq!(result.plan.strategy, DispatchStrategy::Consensus);
        assert_eq!(result.outcomes.len(), 4);
        assert!(!result.success());
        assert_eq!(result.primary_outcome.provider_id, SYSTEM_PROVIDER_ID);
        assert_eq!(
            result.primary_outcome.failure,
            Some(FailureKind::TotalDispatchFailure)
        );
        assert_eq!(
            result.primary_outcome.answer_text().as_deref(),
            Some(NO_ANSWER_APOLOGY)
        );
        assert!(result.validation.is_none());

        let calls_before = legal.calls();
        let again = orch.submit("zzzz", RequestContext::default()).await;
        assert!(!again.cached);
        assert!(legal.calls() > calls_before);
        assert_eq!(orch.stats().success_rate, 0.0);
    }

    #[tokio::test]
    async fn exhausted_single_plan_keeps_chain_exhausted() {
        let orch = orchestrator(all_failing());

        let result = orch.submit(COURT_QUESTION, RequestContext::default()).await;

        assert_eq!(result.plan.strategy, DispatchStrategy::Single);
        assert!(!result.success());
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.primary_outcome, result.outcomes[0]);
        assert_eq!(result.primary_outcome.provider_id, "legal");
        assert_eq!(
            result.primary_outcome.failure,
            Some(FailureKind::ChainExhausted)
        );
        assert_eq!(
            result.primary_outcome.answer_text().as_deref(),
            Some(CHAIN_EXHAUSTED_APOLOGY)
        );
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn failed_reasoning_lead_stays_primary() {
        let orch = orchestrator(all_failing());

        let result = orch.submit("2x^2+5x-3=0 çöz", RequestContext::default()).await;

        assert_eq!(result.plan.strategy, DispatchStrategy::Reasoning);
        assert!(!result.success());
        assert_eq!(result.primary_outcome.provider_id, "reasoning");
        assert_ne!(
            result.primary_outcome.failure,
            Some(FailureKind::TotalDispatchFailure)
        );
    }

    #[tokio::test]
    async fn critical_request_is_cross_validated() {
        let legal = FakeProvider::replying("legal", "family court", Some(0.95));
        let knowledge = FakeProvider::replying("general-knowledge", "agreed", None);
        let orch = orchestrator(vec![legal, knowledge.clone()]);

        let result = orch
            .submit(
                COURT_QUESTION,
                RequestContext {
                    critical: true,
                    ..Default::default()
                },
            )
            .await;

        let validation = result.validation.expect("critical requests are validated");
        assert!(validation.validated);
        assert_eq!(validation.validator_id, "general-knowledge");
        assert_eq!(result.primary_outcome.provider_id, "legal");
        let (_, ctx) = knowledge.last_request().unwrap();
        assert!(ctx.validation);
    }

    #[tokio::test]
    async fn low_confidence_answer_is_validated_but_kept() {
        let legal = FakeProvider::replying("legal", "maybe", Some(0.3));
        let orch = orchestrator(vec![legal, FakeProvider::failing("general-knowledge")]);

        let result = orch.submit(COURT_QUESTION, RequestContext::default()).await;

        let validation = result.validation.as_ref().unwrap();
        assert!(!validation.validated);
        assert!(result.success());
        assert_eq!(result.primary_outcome.answer_text().as_deref(), Some("maybe"));
    }

    #[tokio::test]
    async fn critical_request_validates_cached_answer() {
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let knowledge = FakeProvider::replying("general-knowledge", "agreed", None);
        let orch = orchestrator(vec![legal.clone(), knowledge.clone()]);

        let plain = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        assert!(plain.validation.is_none());
        assert_eq!(knowledge.calls(), 0);

        let critical = orch
            .submit(
                COURT_QUESTION,
                RequestContext {
                    critical: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(critical.cached);
        assert_eq!(legal.calls(), 1);
        let validation = critical.validation.as_ref().unwrap();
        assert!(validation.validated);
        assert_eq!(validation.validator_id, "general-knowledge");
        assert_eq!(knowledge.calls(), 1);
    }

    #[tokio::test]
    async fn only_successful_results_are_stored() {
        let cache = Arc::new(RecordingCache::default());
        let orch = orchestrator_with_cache(all_failing(), cache.clone());

        let failed = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        assert!(!failed.success());
        assert_eq!(cache.gets(), 1);
        assert!(cache.puts().is_empty());

        let cache = Arc::new(RecordingCache::default());
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let orch = orchestrator_with_cache(vec![legal], cache.clone());

        let first = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        let second = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        assert!(first.success());
        assert!(second.cached);
        assert_eq!(cache.gets(), 2);
        assert_eq!(cache.puts().len(), 1);
        assert_eq!(orch.stats().cache_size, 1);
    }

    #[tokio::test]
    async fn force_refresh_skips_cache_lookup() {
        let cache = Arc::new(RecordingCache::default());
        let legal = FakeProvider::replying("legal", "family court", Some(0.9));
        let orch = orchestrator_with_cache(vec![legal], cache.clone());

        let result = orch
            .submit(
                COURT_QUESTION,
                RequestContext {
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(result.success());
        assert_eq!(cache.gets(), 0);
        assert_eq!(cache.puts().len(), 1);
    }

    #[tokio::test]
    async fn context_reaches_providers() {
        let legal = FakeProvider::replying("legal", "ok", Some(0.9));
        let orch = orchestrator(vec![legal.clone()]);

        orch.submit(
            COURT_QUESTION,
            RequestContext {
                language: Some("tr".to_string()),
                ..Default::default()
            },
        )
        .await;

        let (request, ctx) = legal.last_request().unwrap();
        assert_eq!(request, COURT_QUESTION);
        assert_eq!(ctx.language.as_deref(), Some("tr"));
        assert!(!ctx.fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_in_flight_request() {
        let slow_legal = FakeProvider::new(
            "legal",
            Behavior::Delay(
                Duration::from_secs(30),
                Box::new(Behavior::Reply {
                    text: "late".to_string(),
                    confidence: Some(0.9),
                }),
            ),
        );
        let config = OrchestratorConfig {
            call_timeout_ms: 60_000,
            ..test_config()
        };
        let orch = orchestrator_with(config, vec![slow_legal]);
        let context = RequestContext {
            request_id: Some("req-1".to_string()),
            ..Default::default()
        };

        let (result, cancelled) = tokio::join!(orch.submit(COURT_QUESTION, context), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            orch.cancel("req-1").await
        });

        assert!(cancelled);
        assert_eq!(result.request_id, "req-1");
        assert!(!result.success());
        assert_eq!(result.outcomes[0].failure, Some(FailureKind::Cancelled));
        assert!(!orch.cancel("req-1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_every_request() {
        let slow_legal = FakeProvider::new(
            "legal",
            Behavior::Delay(
                Duration::from_secs(30),
                Box::new(Behavior::Reply {
                    text: "late".to_string(),
                    confidence: Some(0.9),
                }),
            ),
        );
        let config = OrchestratorConfig {
            call_timeout_ms: 60_000,
            ..test_config()
        };
        let orch = orchestrator_with(config, vec![slow_legal]);
        let sweep = orch.start_health_sweep();

        let (result, _) = tokio::join!(orch.submit(COURT_QUESTION, RequestContext::default()), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            orch.shutdown().await
        });

        assert_eq!(result.outcomes[0].failure, Some(FailureKind::Cancelled));
        sweep.await.unwrap();
    }

    #[tokio::test]
    async fn health_reports_each_provider() {
        let orch = orchestrator(vec![]);
        assert!(orch.last_health().is_none());

        let report = orch.health().await;
        assert_eq!(report.overall, OverallHealth::Healthy);
        assert_eq!(report.per_provider.len(), 5);
        assert_eq!(orch.last_health().unwrap().per_provider.len(), 5);
    }

    #[tokio::test]
    async fn builds_providers_from_default_config() {
        let orch = Orchestrator::builder(OrchestratorConfig::default())
            .build()
            .unwrap();

        let result = orch.submit(COURT_QUESTION, RequestContext::default()).await;
        assert_eq!(result.primary_outcome.provider_id, "legal");
        assert_eq!(
            result.primary_outcome.answer_text().as_deref(),
            Some("[legal] received: Which court handles family law?")
        );
    }

    #[test]
    fn build_fails_without_a_provider() {
        let err = Orchestrator::builder(test_config()).build().err().unwrap();
        assert!(err.to_string().contains("has no provider"));
    }
}
