// ABOUTME: Rule-based request classifier using weighted keyword and pattern matching.
// ABOUTME: Scores a request against every capability and ranks the recommended set.

use regex::{Regex, RegexBuilder};

use super::config::OrchestratorConfig;
use super::error::{OrchestratorError, OrchestratorResult};
use super::types::ClassificationResult;

/// Compiled scoring rules for one capability.
struct CategoryRule {
    id: String,
    keywords: Vec<String>,
    pattern: Option<Regex>,
}

/// Deterministic classifier. Holds no mutable state, so identical input
/// always yields an identical result.
pub struct Classifier {
    rules: Vec<CategoryRule>,
    default_capability: String,
    keyword_weight: f64,
    pattern_weight: f64,
    recommend_floor: f64,
    max_recommended: usize,
}

/// Compile a case-insensitive pattern.
pub(crate) fn compile_pattern(owner: &str, pattern: &str) -> OrchestratorResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| OrchestratorError::Pattern {
            capability: owner.to_string(),
            source,
        })
}

impl Classifier {
    pub fn new(config: &OrchestratorConfig) -> OrchestratorResult<Self> {
        let rules = config
            .capabilities
            .iter()
            .map(|cap| {
                let pattern = cap
                    .pattern
                    .as_deref()
                    .map(|p| compile_pattern(&cap.id, p))
                    .transpose()?;
                Ok(CategoryRule {
                    id: cap.id.clone(),
                    keywords: cap.keywords.iter().map(|k| k.to_lowercase()).collect(),
                    pattern,
                })
            })
            .collect::<OrchestratorResult<Vec<_>>>()?;

        Ok(Self {
            rules,
            default_capability: config.default_capability.clone(),
            keyword_weight: config.keyword_weight,
            pattern_weight: config.pattern_weight,
            recommend_floor: config.recommend_floor,
            max_recommended: config.max_recommended,
        })
    }

    /// Classify a request. Never fails.
    ///
    /// score = keyword_weight × keyword hits + pattern_weight × (pattern matched)
    ///
    /// The highest score wins; ties go to the capability declared first.
    /// Unmatched input resolves to the default capability with confidence 0.
    pub fn classify(&self, request: &str) -> ClassificationResult {
        let request_lower = request.to_lowercase();

        let score_vector: Vec<(String, f64)> = self
            .rules
            .iter()
            .map(|rule| (rule.id.clone(), self.score(rule, request, &request_lower)))
            .collect();

        // Strictly greater keeps the earliest declared capability on ties.
        let mut best: Option<(&str, f64)> = None;
        for (id, score) in &score_vector {
            match best {
                Some((_, best_score)) if *score <= best_score => {}
                _ => best = Some((id.as_str(), *score)),
            }
        }

        let (primary_capability, confidence, defaulted) = match best {
            Some((id, score)) if score > 0.0 => (id.to_string(), score, false),
            _ => (self.default_capability.clone(), 0.0, true),
        };

        ClassificationResult {
            recommended_set: self.recommended(&score_vector),
            primary_capability,
            confidence,
            score_vector,
            defaulted,
        }
    }

    fn score(&self, rule: &CategoryRule, request: &str, request_lower: &str) -> f64 {
        let keyword_hits = rule
            .keywords
            .iter()
            .filter(|kw| request_lower.contains(kw.as_str()))
            .count();
        let pattern_hit = rule
            .pattern
            .as_ref()
            .is_some_and(|re| re.is_match(request));

        self.keyword_weight * keyword_hits as f64
            + self.pattern_weight * if pattern_hit { 1.0 } else { 0.0 }
    }

    /// Capabilities above the floor, best first, capped. The stable sort keeps
    /// declaration order among equal scores.
    fn recommended(&self, score_vector: &[(String, f64)]) -> Vec<String> {
        let mut above: Vec<&(String, f64)> = score_vector
            .iter()
            .filter(|(_, score)| *score > self.recommend_floor)
            .collect();
        above.sort_by(|a, b| b.1.total_cmp(&a.1));
        above
            .into_iter()
            .take(self.max_recommended)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
