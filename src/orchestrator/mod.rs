// ABOUTME: Orchestrator module for routing requests across capability providers.
// ABOUTME: Contains types, provider trait and adapters, classifier, router, dispatcher, and service.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod consensus;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod http_provider;
pub mod metrics;
pub mod provider;
pub mod registry;
pub mod router;
pub mod service;
pub mod static_provider;
pub mod types;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult, ProviderError};
pub use provider::CapabilityProvider;
pub use service::{Orchestrator, OrchestratorBuilder};
pub use types::{OrchestrationResult, RequestContext};
