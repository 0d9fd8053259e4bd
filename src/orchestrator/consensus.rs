// ABOUTME: Consensus builder that picks one authoritative answer from dispatch outcomes.
// ABOUTME: Highest confidence wins, faster answers break ties; zero successes is a total failure.

use std::cmp::Ordering;

use super::types::{FailureKind, ProviderOutcome, SYSTEM_PROVIDER_ID};

/// Payload of the answer returned when no provider succeeded.
pub const NO_ANSWER_APOLOGY: &str =
    "Sorry, none of the available experts could answer this request. Please try again later.";

/// The chosen primary outcome and the confidence reported for the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    pub primary: ProviderOutcome,
    /// The chosen outcome's own confidence; never averaged.
    pub confidence: f64,
}

/// Pick the primary outcome among successful, authoritative outcomes.
///
/// Returns `None` when nothing succeeded. Auxiliary outcomes from a
/// reasoning plan are never chosen.
pub fn build_consensus(outcomes: &[ProviderOutcome]) -> Option<Consensus> {
    let primary = outcomes
        .iter()
        .filter(|o| o.success && !o.auxiliary)
        .min_by(|a, b| rank(a, b))?
        .clone();

    log::debug!(
        "[Consensus] {} chosen with confidence {:.2} out of {} outcomes",
        primary.provider_id,
        primary.confidence,
        outcomes.len()
    );

    Some(Consensus {
        confidence: primary.confidence,
        primary,
    })
}

// Best first: higher confidence, then lower latency. `min_by` keeps the
// earliest outcome on a full tie.
fn rank(a: &ProviderOutcome, b: &ProviderOutcome) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(a.latency_ms.cmp(&b.latency_ms))
}

/// Synthetic outcome standing in for the answer when every target of a
/// parallel or consensus plan failed.
pub fn total_failure(outcomes: &[ProviderOutcome], latency_ms: u64) -> ProviderOutcome {
    let errors: Vec<String> = outcomes
        .iter()
        .filter_map(|o| {
            o.error
                .as_ref()
                .map(|e| format!("{}: {}", o.provider_id, e))
        })
        .collect();

    log::warn!(
        "[Consensus] No successful outcome among {} attempts",
        outcomes.len()
    );

    ProviderOutcome {
        provider_id: SYSTEM_PROVIDER_ID.to_string(),
        success: false,
        response: Some(serde_json::Value::String(NO_ANSWER_APOLOGY.to_string())),
        error: Some(if errors.is_empty() {
            "no provider produced an answer".to_string()
        } else {
            errors.join("; ")
        }),
        failure: Some(FailureKind::TotalDispatchFailure),
        latency_ms,
        confidence: 0.0,
        fallback_for: None,
        auxiliary: false,
    }
}
