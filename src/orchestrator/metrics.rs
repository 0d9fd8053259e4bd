// ABOUTME: Orchestrator-wide request metrics: totals, cache hits, success rate, and latency.
// ABOUTME: Updated once per submitted request, including requests served from the cache.

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    cache_hits: u64,
    successes: u64,
    average_latency_ms: f64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
}

pub struct OrchestratorMetrics {
    state: Mutex<MetricsState>,
    smoothing: f64,
}

impl OrchestratorMetrics {
    pub fn new(smoothing: f64) -> Self {
        Self {
            state: Mutex::new(MetricsState::default()),
            smoothing,
        }
    }

    /// Record one finished request. Latency feeds an exponential moving average.
    pub fn record(&self, success: bool, latency_ms: u64, cached: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let latency = latency_ms as f64;
        state.average_latency_ms = if state.total_requests == 0 {
            latency
        } else {
            self.smoothing * latency + (1.0 - self.smoothing) * state.average_latency_ms
        };
        state.total_requests += 1;
        if success {
            state.successes += 1;
        }
        if cached {
            state.cache_hits += 1;
        }
        log::debug!(
            "[Metrics] requests={} cache_hits={} avg_latency={:.1}ms",
            state.total_requests,
            state.cache_hits,
            state.average_latency_ms
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        MetricsSnapshot {
            total_requests: state.total_requests,
            cache_hits: state.cache_hits,
            success_rate: if state.total_requests == 0 {
                0.0
            } else {
                state.successes as f64 / state.total_requests as f64
            },
            average_latency_ms: state.average_latency_ms,
        }
    }
}
