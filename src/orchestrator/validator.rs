// ABOUTME: Cross-validator that asks a partner capability for a second opinion.
// ABOUTME: Advisory only: the result annotates the answer and never replaces it.

use tokio_util::sync::CancellationToken;

use super::dispatcher::Dispatcher;
use super::types::{
    FailureKind, ProviderOutcome, RequestContext, SYSTEM_PROVIDER_ID, ValidationOutcome,
};

pub struct CrossValidator {
    threshold: f64,
}

impl CrossValidator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Critical requests are always validated, others only below the threshold.
    pub fn should_validate(&self, confidence: f64, context: &RequestContext) -> bool {
        context.critical || confidence < self.threshold
    }

    /// Build the request sent to the validation partner.
    pub fn validation_request(answer: &str, request: &str) -> String {
        format!(
            "Does this answer look correct: {}\n\nOriginal request: {}",
            answer, request
        )
    }

    /// Ask the answering capability's partner to check the answer.
    ///
    /// Returns `None` when there is nothing to validate or no distinct partner.
    /// A failed partner call yields `validated: false`.
    pub async fn cross_validate(
        &self,
        dispatcher: &Dispatcher,
        primary: &ProviderOutcome,
        request: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Option<ValidationOutcome> {
        if !primary.success || primary.provider_id == SYSTEM_PROVIDER_ID {
            return None;
        }

        let partner = dispatcher
            .registry()
            .descriptor(&primary.provider_id)?
            .validation_partner
            .clone()
            .filter(|p| *p != primary.provider_id)?;

        let answer = primary.answer_text().unwrap_or_default();
        let validation_context = RequestContext {
            validation: true,
            ..context.clone()
        };

        log::info!(
            "[Validator] Asking {} to validate the answer from {}",
            partner,
            primary.provider_id
        );

        let outcome = dispatcher
            .attempt(
                &partner,
                &Self::validation_request(&answer, request),
                &validation_context,
                cancel,
            )
            .await;

        if !outcome.success {
            log::warn!(
                "[Validator] Validation by {} inconclusive: {}",
                partner,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }

        Some(ValidationOutcome {
            validator_id: partner,
            validated: outcome.success,
            response: outcome.response,
            failure: (!outcome.success).then_some(FailureKind::ValidationInconclusive),
            error: outcome.error,
            latency_ms: outcome.latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::orchestrator::test_support::{FakeProvider, registry_with};

    fn answered_by(id: &str) -> ProviderOutcome {
        ProviderOutcome {
            provider_id: id.to_string(),
            success: true,
            response: Some(serde_json::json!({"response": "the statute applies"})),
            error: None,
            failure: None,
            latency_ms: 20,
            confidence: 0.4,
            fallback_for: None,
            auxiliary: false,
        }
    }

    #[test]
    fn threshold_and_critical_gate_validation() {
        let validator = CrossValidator::new(0.6);
        let normal = RequestContext::default();
        let critical = RequestContext {
            critical: true,
            ..Default::default()
        };
        assert!(validator.should_validate(0.59, &normal));
        assert!(!validator.should_validate(0.6, &normal));
        assert!(validator.should_validate(0.95, &critical));
    }

    #[tokio::test]
    async fn partner_receives_framed_request() {
        let partner = FakeProvider::replying("general-knowledge", "looks right", None);
        let dispatcher = Dispatcher::new(registry_with(vec![partner.clone()]), Duration::from_secs(1));

        let outcome = CrossValidator::new(0.6)
            .cross_validate(
                &dispatcher,
                &answered_by("legal"),
                "is this legal?",
                &RequestContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(outcome.validated);
        assert_eq!(outcome.validator_id, "general-knowledge");
        assert!(outcome.failure.is_none());

        let (request, ctx) = partner.last_request().unwrap();
        assert!(request.starts_with("Does this answer look correct: the statute applies"));
        assert!(request.contains("is this legal?"));
        assert!(ctx.validation);
    }

    #[tokio::test]
    async fn failed_partner_is_inconclusive_not_fatal() {
        let dispatcher = Dispatcher::new(
            registry_with(vec![FakeProvider::failing("medical")]),
            Duration::from_secs(1),
        );

        let outcome = CrossValidator::new(0.6)
            .cross_validate(
                &dispatcher,
                &answered_by("guide"),
                "career advice",
                &RequestContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!outcome.validated);
        assert_eq!(outcome.validator_id, "medical");
        assert_eq!(outcome.failure, Some(FailureKind::ValidationInconclusive));
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn nothing_to_validate_for_failed_or_system_outcomes() {
        let dispatcher = Dispatcher::new(registry_with(vec![]), Duration::from_secs(1));
        let validator = CrossValidator::new(0.6);

        let mut failed = answered_by("legal");
        failed.success = false;
        let system = answered_by(SYSTEM_PROVIDER_ID);

        for primary in [failed, system] {
            let result = validator
                .cross_validate(
                    &dispatcher,
                    &primary,
                    "q",
                    &RequestContext::default(),
                    &CancellationToken::new(),
                )
                .await;
            assert!(result.is_none());
        }
    }
}
