// ABOUTME: Static provider adapter that answers every request with a canned reply.
// ABOUTME: Lets a capability be declared purely in configuration.

use async_trait::async_trait;

use super::error::ProviderError;
use super::provider::CapabilityProvider;
use super::types::{ProviderReply, RequestContext};

pub struct StaticProvider {
    id: String,
    template: String,
    confidence: Option<f64>,
}

impl StaticProvider {
    pub fn new(id: &str, template: &str, confidence: Option<f64>) -> Self {
        Self {
            id: id.to_string(),
            template: template.to_string(),
            confidence,
        }
    }
}

#[async_trait]
impl CapabilityProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(
        &self,
        request: &str,
        _context: &RequestContext,
    ) -> Result<ProviderReply, ProviderError> {
        let reply = ProviderReply::text(self.template.replace("{request}", request));
        Ok(match self.confidence {
            Some(confidence) => reply.with_confidence(confidence),
            None => reply,
        })
    }
}
