// ABOUTME: Shared test fixtures: a compact capability config and scripted fake providers.
// ABOUTME: Fakes count calls and can succeed, fail, stall, or panic on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::config::{CapabilityConfig, OrchestratorConfig, REASONING_TAG};
use super::error::ProviderError;
use super::provider::CapabilityProvider;
use super::registry::CapabilityRegistry;
use super::types::{ProviderReply, ProviderStatus, RequestContext};

fn capability(
    id: &str,
    tags: &[&str],
    keywords: &[&str],
    pattern: &str,
    fallback: &[&str],
    validation_partner: &str,
) -> CapabilityConfig {
    CapabilityConfig {
        id: id.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        pattern: Some(pattern.to_string()),
        fallback: fallback.iter().map(|f| f.to_string()).collect(),
        validation_partner: Some(validation_partner.to_string()),
        provider: None,
    }
}

/// Five capabilities with simple English rules.
pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        capabilities: vec![
            capability(
                "legal",
                &["legal"],
                &["law", "court", "attorney"],
                r"(?:law|court|tribunal|legal)",
                &["general-knowledge", "guide"],
                "general-knowledge",
            ),
            capability(
                "medical",
                &["medical"],
                &["doctor", "symptom", "nurse"],
                r"(?:doctor|symptom|disease)",
                &["general-knowledge"],
                "general-knowledge",
            ),
            capability(
                "guide",
                &["guidance"],
                &["advice", "career"],
                r"(?:advice|career|coaching)",
                &["general-knowledge"],
                "medical",
            ),
            capability(
                "general-knowledge",
                &["knowledge"],
                &["research", "learn"],
                r"(?:research|learn|wikipedia)",
                &[],
                "guide",
            ),
            capability(
                "reasoning",
                &[REASONING_TAG],
                &["math", "algorithm"],
                r"(?:math|algorithm|equation)",
                &["general-knowledge"],
                "general-knowledge",
            ),
        ],
        consensus_quorum: vec![
            "legal".to_string(),
            "medical".to_string(),
            "guide".to_string(),
            "general-knowledge".to_string(),
        ],
        reasoning_support: vec!["general-knowledge".to_string(), "guide".to_string()],
        call_timeout_ms: 1_000,
        ..OrchestratorConfig::default()
    }
}

/// What a fake provider does when called.
#[derive(Clone)]
pub enum Behavior {
    Reply { text: String, confidence: Option<f64> },
    Fail(String),
    /// Sleep before replying; used with paused time.
    Delay(Duration, Box<Behavior>),
    Panic,
}

pub struct FakeProvider {
    id: String,
    behavior: Behavior,
    health: ProviderStatus,
    health_delay: Duration,
    calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<(String, RequestContext)>>,
}

impl FakeProvider {
    pub fn new(id: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behavior,
            health: ProviderStatus::Active,
            health_delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    pub fn replying(id: &str, text: &str, confidence: Option<f64>) -> Arc<Self> {
        Self::new(
            id,
            Behavior::Reply {
                text: text.to_string(),
                confidence,
            },
        )
    }

    pub fn failing(id: &str) -> Arc<Self> {
        Self::new(id, Behavior::Fail(format!("{} is down", id)))
    }

    pub fn with_health(id: &str, behavior: Behavior, health: ProviderStatus) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behavior,
            health,
            health_delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    /// Healthy provider whose self-check stalls for `delay`.
    pub fn slow_health(id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behavior: Behavior::Reply {
                text: format!("{} answer", id),
                confidence: None,
            },
            health: ProviderStatus::Active,
            health_delay: delay,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, RequestContext)> {
        self.last_request.lock().unwrap().clone()
    }
}

fn run(behavior: &Behavior) -> futures::future::BoxFuture<'_, Result<ProviderReply, ProviderError>> {
    Box::pin(async move {
        match behavior {
            Behavior::Reply { text, confidence } => {
                let reply = ProviderReply::text(text.as_str());
                Ok(match confidence {
                    Some(confidence) => reply.with_confidence(*confidence),
                    None => reply,
                })
            }
            Behavior::Fail(message) => Err(ProviderError::Failed(message.clone())),
            Behavior::Delay(duration, then) => {
                tokio::time::sleep(*duration).await;
                run(then).await
            }
            Behavior::Panic => panic!("fake provider panicked"),
        }
    })
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(
        &self,
        request: &str,
        context: &RequestContext,
    ) -> Result<ProviderReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((request.to_string(), context.clone()));
        run(&self.behavior).await
    }

    async fn health_check(&self) -> Result<ProviderStatus, ProviderError> {
        if !self.health_delay.is_zero() {
            tokio::time::sleep(self.health_delay).await;
        }
        Ok(self.health)
    }
}

/// One provider per `test_config()` capability, each replying "<id> answer".
/// Entries in `overrides` replace the default fake for that id.
pub fn providers_with(overrides: Vec<Arc<FakeProvider>>) -> Vec<Arc<dyn CapabilityProvider>> {
    test_config()
        .capabilities
        .iter()
        .map(|cap| -> Arc<dyn CapabilityProvider> {
            match overrides.iter().find(|p| p.id() == cap.id) {
                Some(p) => p.clone(),
                None => FakeProvider::replying(&cap.id, &format!("{} answer", cap.id), None),
            }
        })
        .collect()
}

/// Registry over `test_config()` built from `providers_with(overrides)`.
pub fn registry_with(overrides: Vec<Arc<FakeProvider>>) -> Arc<CapabilityRegistry> {
    Arc::new(CapabilityRegistry::new(&test_config(), providers_with(overrides)).unwrap())
}
