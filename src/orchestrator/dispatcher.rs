// ABOUTME: Dispatcher that executes a plan against the registry with per-call isolation.
// ABOUTME: Handles fan-out with settle-all joins, per-call timeouts, cancellation, and failover chains.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::ProviderError;
use super::provider::CapabilityProvider;
use super::registry::CapabilityRegistry;
use super::types::{
    DispatchPlan, DispatchStrategy, FailureKind, ProviderOutcome, ProviderReply, ProviderStatus,
    RequestContext,
};

/// Confidence assumed when a provider does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Payload of the synthetic outcome returned when a failover chain is exhausted.
pub const CHAIN_EXHAUSTED_APOLOGY: &str =
    "Sorry, this question cannot be answered right now. Please try again later.";

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn failed_outcome(provider_id: &str, error: &ProviderError, latency_ms: u64) -> ProviderOutcome {
    ProviderOutcome {
        provider_id: provider_id.to_string(),
        success: false,
        response: None,
        error: Some(error.to_string()),
        failure: Some(error.kind()),
        latency_ms,
        confidence: 0.0,
        fallback_for: None,
        auxiliary: false,
    }
}

/// Executes dispatch plans. Individual provider failures are always converted
/// into failed outcomes; nothing here returns an error to the caller.
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Execute a plan and return every outcome gathered.
    ///
    /// - Single: one call with failover.
    /// - Parallel / Consensus: all targets concurrently, settle-all.
    /// - Reasoning: the lead target first, then supporters concurrently,
    ///   marked auxiliary.
    pub async fn dispatch(
        &self,
        plan: &DispatchPlan,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Vec<ProviderOutcome> {
        let Some((lead, rest)) = plan.targets.split_first() else {
            log::warn!("[Dispatcher] Plan has no targets: {}", plan.rationale);
            return Vec::new();
        };

        log::info!(
            "[Dispatcher] Executing {} plan over {:?}",
            plan.strategy.as_str(),
            plan.targets
        );

        match plan.strategy {
            DispatchStrategy::Single => {
                vec![self.call_with_failover(lead, request, context, cancel).await]
            }
            DispatchStrategy::Parallel | DispatchStrategy::Consensus => {
                self.fan_out(&plan.targets, request, context, cancel).await
            }
            DispatchStrategy::Reasoning => {
                let mut outcomes = vec![self.call_with_failover(lead, request, context, cancel).await];
                let mut supporting = self.fan_out(rest, request, context, cancel).await;
                for outcome in &mut supporting {
                    outcome.auxiliary = true;
                }
                outcomes.extend(supporting);
                outcomes
            }
        }
    }

    /// Invoke every target concurrently and wait for all of them. One branch
    /// failing or timing out never cancels its siblings.
    async fn fan_out(
        &self,
        targets: &[String],
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Vec<ProviderOutcome> {
        join_all(
            targets
                .iter()
                .map(|target| self.call_with_failover(target, request, context, cancel)),
        )
        .await
    }

    /// Call a provider and walk its fallback chain on hard failure or timeout.
    ///
    /// Low-confidence successes never trigger failover. When every provider
    /// in a non-empty chain fails, a synthetic apology outcome is returned.
    pub async fn call_with_failover(
        &self,
        target: &str,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> ProviderOutcome {
        let started = Instant::now();
        let first = self.attempt(target, request, context, cancel).await;
        if first.success || first.failure == Some(FailureKind::Cancelled) {
            return first;
        }

        let chain = self
            .registry
            .descriptor(target)
            .map(|d| d.fallback_chain.clone())
            .unwrap_or_default();
        if chain.is_empty() {
            return first;
        }

        let fallback_context = RequestContext {
            fallback: true,
            ..context.clone()
        };
        let mut last_error = first.error.unwrap_or_default();

        for fallback in &chain {
            log::warn!(
                "[Dispatcher] {} failed ({}), trying fallback {}",
                target,
                last_error,
                fallback
            );
            let mut outcome = self
                .attempt(fallback, request, &fallback_context, cancel)
                .await;
            if outcome.success {
                outcome.fallback_for = Some(target.to_string());
                return outcome;
            }
            if outcome.failure == Some(FailureKind::Cancelled) {
                return outcome;
            }
            last_error = format!("{}: {}", fallback, outcome.error.unwrap_or_default());
        }

        log::warn!(
            "[Dispatcher] Failover chain exhausted for {} after {} attempts",
            target,
            chain.len() + 1
        );

        ProviderOutcome {
            provider_id: target.to_string(),
            success: false,
            response: Some(serde_json::Value::String(
                CHAIN_EXHAUSTED_APOLOGY.to_string(),
            )),
            error: Some(format!(
                "all {} providers failed, last error: {}",
                chain.len() + 1,
                last_error
            )),
            failure: Some(FailureKind::ChainExhausted),
            latency_ms: elapsed_ms(started),
            confidence: 0.0,
            fallback_for: None,
            auxiliary: false,
        }
    }

    /// One provider call, recorded in the registry statistics. Unavailable
    /// providers are skipped without being called.
    pub async fn attempt(
        &self,
        id: &str,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> ProviderOutcome {
        if cancel.is_cancelled() {
            return failed_outcome(id, &ProviderError::Cancelled, 0);
        }

        let Some(resolved) = self.registry.resolve(id) else {
            return failed_outcome(id, &ProviderError::NotFound(id.to_string()), 0);
        };

        if resolved.status == ProviderStatus::Unavailable {
            log::warn!("[Dispatcher] Skipping unavailable provider {}", id);
            return failed_outcome(id, &ProviderError::Unavailable, 0);
        }

        let started = Instant::now();
        let result = self
            .invoke(resolved.provider, request, context, cancel)
            .await;
        let latency_ms = elapsed_ms(started);

        let outcome = match result {
            Ok(reply) => ProviderOutcome {
                provider_id: id.to_string(),
                success: true,
                response: Some(reply.response),
                error: None,
                failure: None,
                latency_ms,
                confidence: reply.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                fallback_for: None,
                auxiliary: false,
            },
            Err(err) => {
                log::warn!("[Dispatcher] {} failed after {}ms: {}", id, latency_ms, err);
                failed_outcome(id, &err, latency_ms)
            }
        };

        self.registry.mark_outcome(id, &outcome);
        outcome
    }

    /// Run the provider on its own task, bounded by the per-call timeout and
    /// the request's cancellation token. A panicking provider becomes a
    /// failed call.
    async fn invoke(
        &self,
        provider: Arc<dyn CapabilityProvider>,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<ProviderReply, ProviderError> {
        let request = request.to_string();
        let context = context.clone();
        let mut handle = tokio::spawn(async move { provider.process(&request, &context).await });

        tokio::select! {
            _ = cancel.cancelled() => {
                handle.abort();
                Err(ProviderError::Cancelled)
            }
            joined = tokio::time::timeout(self.call_timeout, &mut handle) => match joined {
                Err(_) => {
                    handle.abort();
                    Err(ProviderError::Timeout(self.call_timeout))
                }
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => {
                    log::error!("[Dispatcher] Provider task failed: {}", join_err);
                    Err(ProviderError::Panicked(join_err.to_string()))
                }
            }
        }
    }
}
