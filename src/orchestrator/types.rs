// ABOUTME: Core types for the orchestrator: classifications, dispatch plans, and provider outcomes.
// ABOUTME: Defines the data structures that flow between classifier, router, dispatcher, and cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provider id used for synthetic outcomes produced by the orchestrator itself.
pub const SYSTEM_PROVIDER_ID: &str = "system";

/// Live status of a capability provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Active,
    Degraded,
    Unavailable,
}

/// Per-request options supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Language hint forwarded to providers (e.g. "tr", "en").
    #[serde(default)]
    pub language: Option<String>,
    /// High-stakes request: always cross-validate.
    #[serde(default)]
    pub critical: bool,
    /// Bypass the response cache and re-dispatch.
    #[serde(default)]
    pub force_refresh: bool,
    /// Force the reasoning strategy regardless of classification.
    #[serde(default)]
    pub force_reasoning: bool,
    /// Caller-chosen id used for cancellation. Generated when absent.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Set by the dispatcher when a provider is called as a fallback.
    #[serde(default)]
    pub fallback: bool,
    /// Set by the cross-validator when a provider is asked for a second opinion.
    #[serde(default)]
    pub validation: bool,
}

/// Result of scoring a request against every configured capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub primary_capability: String,
    /// Score of the primary capability. Not renormalized; may exceed 1.0.
    pub confidence: f64,
    /// Score per capability, in declaration order.
    pub score_vector: Vec<(String, f64)>,
    /// Capabilities scoring above the recommendation floor, best first.
    pub recommended_set: Vec<String>,
    /// True when nothing matched and the default capability was chosen.
    pub defaulted: bool,
}

impl ClassificationResult {
    pub fn score_of(&self, capability: &str) -> Option<f64> {
        self.score_vector
            .iter()
            .find(|(id, _)| id == capability)
            .map(|(_, score)| *score)
    }
}

/// Invocation mode chosen for one request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    Single,
    Parallel,
    Consensus,
    Reasoning,
}

impl DispatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStrategy::Single => "single",
            DispatchStrategy::Parallel => "parallel",
            DispatchStrategy::Consensus => "consensus",
            DispatchStrategy::Reasoning => "reasoning",
        }
    }
}

/// Chosen strategy and ordered targets for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchPlan {
    pub strategy: DispatchStrategy,
    pub targets: Vec<String>,
    /// Human-readable explanation. Derived, never parsed back.
    pub rationale: String,
}

/// Why a provider outcome (or the whole dispatch) failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ProviderError,
    Unavailable,
    NotFound,
    Cancelled,
    ChainExhausted,
    TotalDispatchFailure,
    ValidationInconclusive,
}

/// Reply returned by a provider that answered successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderReply {
    pub response: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ProviderReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: serde_json::Value::String(response.into()),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Outcome of one provider call, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderOutcome {
    pub provider_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub latency_ms: u64,
    pub confidence: f64,
    /// Set when this outcome came from a fallback for the named provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_for: Option<String>,
    /// Supporting outcome of a reasoning plan: attached, not authoritative.
    #[serde(default)]
    pub auxiliary: bool,
}

impl ProviderOutcome {
    /// Main answer text: a string payload, or the `response`/`answer` field of
    /// a structured one.
    pub fn answer_text(&self) -> Option<String> {
        let response = self.response.as_ref()?;
        match response {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => other
                .get("response")
                .or_else(|| other.get("answer"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .or_else(|| Some(other.to_string())),
        }
    }
}

/// Advisory second opinion on the primary outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationOutcome {
    pub validator_id: String,
    pub validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `ValidationInconclusive` when the partner could not answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub latency_ms: u64,
}

/// Everything `submit` returns. Always produced, even on total failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub request_id: String,
    pub classification: ClassificationResult,
    pub plan: DispatchPlan,
    pub outcomes: Vec<ProviderOutcome>,
    pub primary_outcome: ProviderOutcome,
    /// Confidence of the chosen answer (not averaged across participants).
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
    pub cached: bool,
    pub total_latency_ms: u64,
}

impl OrchestrationResult {
    pub fn success(&self) -> bool {
        self.primary_outcome.success
    }
}

/// Health probe summary across the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub status: ProviderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall: OverallHealth,
    pub per_provider: BTreeMap<String, ProviderHealth>,
}

/// Usage counters for one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderUsage {
    pub status: ProviderStatus,
    pub request_count: u64,
    pub error_count: u64,
    pub cache_hits: u64,
    pub total_latency_ms: u64,
    /// Exponential moving average; recent calls dominate.
    pub average_latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<jiff::Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub cache_size: usize,
    pub per_provider_usage: BTreeMap<String, ProviderUsage>,
}
