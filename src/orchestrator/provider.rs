// ABOUTME: CapabilityProvider trait that all provider adapters implement.
// ABOUTME: Providers answer a request in their domain and report their own health.

use std::sync::Arc;

use async_trait::async_trait;

use super::config::ProviderSpec;
use super::error::ProviderError;
use super::http_provider::HttpProvider;
use super::static_provider::StaticProvider;
use super::types::{ProviderReply, ProviderStatus, RequestContext};

/// The CapabilityProvider trait that all provider adapters implement.
/// Adding a provider never touches orchestrator control flow: it is looked up
/// by id in the registry.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Capability identifier (e.g. "legal", "reasoning")
    fn id(&self) -> &str;

    /// Attempt to answer a request.
    ///
    /// A provider that explicitly reports failure returns `ProviderError::Failed`.
    /// Missing confidence in the reply is treated as 0.5 by the dispatcher.
    async fn process(
        &self,
        request: &str,
        context: &RequestContext,
    ) -> Result<ProviderReply, ProviderError>;

    /// Lightweight self-check used by the health sweep.
    async fn health_check(&self) -> Result<ProviderStatus, ProviderError> {
        Ok(ProviderStatus::Active)
    }
}

/// Build a provider from its configuration record.
pub fn from_spec(
    id: &str,
    spec: &ProviderSpec,
) -> Result<Arc<dyn CapabilityProvider>, ProviderError> {
    match spec {
        ProviderSpec::Http { url } => Ok(Arc::new(HttpProvider::new(id, url)?)),
        ProviderSpec::Static {
            response,
            confidence,
        } => Ok(Arc::new(StaticProvider::new(id, response, *confidence))),
    }
}
