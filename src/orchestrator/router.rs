// ABOUTME: Strategy selector that maps a classification to a dispatch plan.
// ABOUTME: Picks single, parallel, consensus, or reasoning mode and the ordered targets.

use regex::Regex;

use super::classifier::compile_pattern;
use super::config::OrchestratorConfig;
use super::error::OrchestratorResult;
use super::registry::CapabilityRegistry;
use super::types::{ClassificationResult, DispatchPlan, DispatchStrategy, RequestContext};

/// Converts classifications into dispatch plans using configured thresholds.
pub struct StrategySelector {
    intent_pattern: Regex,
    reasoning_capability: Option<String>,
    reasoning_support: Vec<String>,
    max_supporting: usize,
    single_threshold: f64,
    parallel_threshold: f64,
    max_parallel_targets: usize,
    consensus_quorum: Vec<String>,
    default_capability: String,
}

impl StrategySelector {
    pub fn new(config: &OrchestratorConfig) -> OrchestratorResult<Self> {
        Ok(Self {
            intent_pattern: compile_pattern(
                "reasoning_intent_pattern",
                &config.reasoning_intent_pattern,
            )?,
            reasoning_capability: config.reasoning_capability().map(|s| s.to_string()),
            reasoning_support: config.reasoning_support.clone(),
            max_supporting: config.max_supporting,
            single_threshold: config.single_threshold,
            parallel_threshold: config.parallel_threshold,
            max_parallel_targets: config.max_parallel_targets,
            consensus_quorum: config.consensus_quorum.clone(),
            default_capability: config.default_capability.clone(),
        })
    }

    /// Whether the request text asks for analytical work ("solve", "calculate", ...).
    pub fn has_reasoning_intent(&self, request: &str) -> bool {
        self.intent_pattern.is_match(request)
    }

    /// Select a dispatch plan. The first matching rule wins:
    /// 1. Forced reasoning or analytical intent → Reasoning
    /// 2. confidence > single threshold → Single
    /// 3. parallel threshold < confidence ≤ single threshold → Parallel
    /// 4. otherwise → Consensus over the fixed quorum
    ///
    /// Targets unknown to the registry are dropped; an empty list falls back
    /// to the default capability so a plan always has a target.
    pub fn select(
        &self,
        classification: &ClassificationResult,
        request: &str,
        context: &RequestContext,
        registry: &CapabilityRegistry,
    ) -> DispatchPlan {
        let confidence = classification.confidence;

        let (strategy, targets, rationale) = match self.reasoning_plan(classification, request, context)
        {
            Some((targets, why)) => (DispatchStrategy::Reasoning, targets, why),
            None if confidence > self.single_threshold => (
                DispatchStrategy::Single,
                vec![classification.primary_capability.clone()],
                format!(
                    "confidence {:.2} above {:.2}: single provider {}",
                    confidence, self.single_threshold, classification.primary_capability
                ),
            ),
            None if confidence > self.parallel_threshold => (
                DispatchStrategy::Parallel,
                classification
                    .recommended_set
                    .iter()
                    .take(self.max_parallel_targets)
                    .cloned()
                    .collect(),
                format!(
                    "confidence {:.2} in ({:.2}, {:.2}]: parallel over recommended set",
                    confidence, self.parallel_threshold, self.single_threshold
                ),
            ),
            None => (
                DispatchStrategy::Consensus,
                self.consensus_quorum.clone(),
                format!(
                    "confidence {:.2} at or below {:.2}: consensus over fixed quorum",
                    confidence, self.parallel_threshold
                ),
            ),
        };

        let mut targets: Vec<String> = targets
            .into_iter()
            .filter(|t| registry.contains(t))
            .collect();
        if targets.is_empty() {
            targets.push(self.default_capability.clone());
        }

        DispatchPlan {
            strategy,
            targets,
            rationale,
        }
    }

    /// Reasoning capability first, then up to `max_supporting` supporters drawn
    /// from the recommended set and topped up from the configured support list.
    fn reasoning_plan(
        &self,
        classification: &ClassificationResult,
        request: &str,
        context: &RequestContext,
    ) -> Option<(Vec<String>, String)> {
        let reasoning = self.reasoning_capability.as_ref()?;

        let why = if context.force_reasoning {
            "reasoning forced by caller"
        } else if self.has_reasoning_intent(request) {
            "analytical intent detected"
        } else {
            return None;
        };

        let mut targets = vec![reasoning.clone()];
        let candidates = classification
            .recommended_set
            .iter()
            .chain(self.reasoning_support.iter());
        for candidate in candidates {
            if targets.len() > self.max_supporting {
                break;
            }
            if !targets.contains(candidate) {
                targets.push(candidate.clone());
            }
        }

        Some((
            targets,
            format!("{}: {} leads, supporters run in parallel", why, reasoning),
        ))
    }
}
