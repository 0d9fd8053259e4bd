// ABOUTME: Orchestrator configuration: capability records, thresholds, and timing knobs.
// ABOUTME: Loaded from JSON at construction time; defaults carry the stock expert tables.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{OrchestratorError, OrchestratorResult};

/// Tag that marks the capability used for the reasoning strategy.
pub const REASONING_TAG: &str = "reasoning";

/// How a capability's provider is built when it is declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSpec {
    /// JSON-over-HTTP provider (`POST url`, `GET url/health`).
    Http { url: String },
    /// Canned reply. `{request}` in the response is replaced by the request text.
    Static {
        response: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

/// One capability: classification rules, failover data, and optional provider spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityConfig {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Case-insensitive regex. Absent means the capability has no pattern score.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Ordered backups tried after this capability fails.
    #[serde(default)]
    pub fallback: Vec<String>,
    /// Capability asked for a second opinion on this one's answers.
    #[serde(default)]
    pub validation_partner: Option<String>,
    #[serde(default)]
    pub provider: Option<ProviderSpec>,
}

impl CapabilityConfig {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Declaration order is significant: it breaks classification ties.
    pub capabilities: Vec<CapabilityConfig>,
    pub default_capability: String,
    pub keyword_weight: f64,
    pub pattern_weight: f64,
    pub recommend_floor: f64,
    pub max_recommended: usize,
    pub single_threshold: f64,
    pub parallel_threshold: f64,
    pub max_parallel_targets: usize,
    pub consensus_quorum: Vec<String>,
    pub reasoning_intent_pattern: String,
    /// Top-up list for reasoning support when the recommended set is short.
    pub reasoning_support: Vec<String>,
    pub max_supporting: usize,
    pub validation_threshold: f64,
    pub call_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    /// EMA smoothing factor for latency averages, in (0, 1].
    pub latency_smoothing: f64,
    pub health_interval_secs: u64,
    pub health_timeout_ms: u64,
}

impl OrchestratorConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> OrchestratorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn capability(&self, id: &str) -> Option<&CapabilityConfig> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    /// The first capability tagged `reasoning`, if any.
    pub fn reasoning_capability(&self) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|c| c.has_tag(REASONING_TAG))
            .map(|c| c.id.as_str())
    }

    /// Check that every cross-reference resolves and fallback chains are acyclic.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.capabilities.is_empty() {
            return Err(OrchestratorError::Config(
                "at least one capability is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for cap in &self.capabilities {
            if cap.id.trim().is_empty() {
                return Err(OrchestratorError::Config(
                    "capability id must not be empty".to_string(),
                ));
            }
            if !seen.insert(cap.id.as_str()) {
                return Err(OrchestratorError::Config(format!(
                    "duplicate capability id: {}",
                    cap.id
                )));
            }
        }

        let known = |id: &str| -> OrchestratorResult<()> {
            if seen.contains(id) {
                Ok(())
            } else {
                Err(OrchestratorError::UnknownCapability(id.to_string()))
            }
        };

        known(&self.default_capability)?;
        for id in self.consensus_quorum.iter().chain(&self.reasoning_support) {
            known(id)?;
        }
        if self.consensus_quorum.is_empty() {
            return Err(OrchestratorError::Config(
                "consensus_quorum must not be empty".to_string(),
            ));
        }

        for cap in &self.capabilities {
            for fb in &cap.fallback {
                known(fb)?;
                if *fb == cap.id {
                    return Err(OrchestratorError::InvalidFallback {
                        capability: cap.id.clone(),
                        reason: "chain references itself".to_string(),
                    });
                }
            }
            if let Some(partner) = &cap.validation_partner {
                known(partner)?;
                if *partner == cap.id {
                    return Err(OrchestratorError::Config(format!(
                        "validation partner of {} must be a different capability",
                        cap.id
                    )));
                }
            }
        }

        self.check_fallback_cycles()?;

        if !(self.latency_smoothing > 0.0 && self.latency_smoothing <= 1.0) {
            return Err(OrchestratorError::Config(format!(
                "latency_smoothing must be in (0, 1], got {}",
                self.latency_smoothing
            )));
        }
        if self.parallel_threshold > self.single_threshold {
            return Err(OrchestratorError::Config(
                "parallel_threshold must not exceed single_threshold".to_string(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(OrchestratorError::Config(
                "call_timeout_ms must be positive".to_string(),
            ));
        }
        if self.health_interval_secs == 0 {
            return Err(OrchestratorError::Config(
                "health_interval_secs must be positive".to_string(),
            ));
        }
        if self.health_timeout_ms == 0 {
            return Err(OrchestratorError::Config(
                "health_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Depth-first search over the fallback graph.
    fn check_fallback_cycles(&self) -> OrchestratorResult<()> {
        let edges: HashMap<&str, &[String]> = self
            .capabilities
            .iter()
            .map(|c| (c.id.as_str(), c.fallback.as_slice()))
            .collect();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            node: &'a str,
            edges: &HashMap<&'a str, &'a [String]>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<(), String> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(node.to_string()),
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            if let Some(&next) = edges.get(node) {
                for n in next {
                    visit(n.as_str(), edges, marks)?;
                }
            }
            marks.insert(node, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for cap in &self.capabilities {
            visit(cap.id.as_str(), &edges, &mut marks).map_err(|node| {
                OrchestratorError::InvalidFallback {
                    capability: cap.id.clone(),
                    reason: format!("cycle through {}", node),
                }
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// Defaults
// =============================================================================

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
        provider: Some(ProviderSpec::Static {
            response: format!("[{}] received: {{request}}", id),
            confidence: None,
        }),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let capabilities = vec![
            capability(
                "legal",
                &["legal"],
                &["hukuk", "kanun", "dava", "avukat", "mahkeme", "hak", "law", "legal", "court", "attorney"],
                r"(?:hukuk|kanun|dava|avukat|mahkeme|yasal|legal|law|court)",
                &["general-knowledge", "guide"],
                "general-knowledge",
            ),
            capability(
                "medical",
                &["medical"],
                &["sağlık", "hastalık", "ilaç", "doktor", "tedavi", "semptom", "health", "medical", "disease", "medicine"],
                r"(?:sağlık|hastalık|ilaç|doktor|tedavi|semptom|health|medical|disease)",
                &["general-knowledge", "guide"],
                "general-knowledge",
            ),
            capability(
                "guide",
                &["guidance"],
                &["rehber", "danışman", "karar", "yaşam", "kariyer", "guide", "advice", "coaching", "help"],
                r"(?:rehber|danışman|karar|yaşam|kariyer|nasıl|guide|advice|coaching)",
                &["general-knowledge"],
                "medical",
            ),
            capability(
                "general-knowledge",
                &["knowledge", "general"],
                &["bilgi", "öğren", "araştır", "wikipedia", "tarım", "iklim", "knowledge", "research", "learn"],
                r"(?:bilgi|öğren|araştır|wikipedia|tarım|iklim|knowledge|research|learn)",
                &[],
                "guide",
            ),
            capability(
                "cloud-ai",
                &["cloud"],
                &["azure", "microsoft", "cloud", "api", "sdk", "quantum", "bulut", "teknoloji"],
                r"(?:azure|microsoft|cloud|api|sdk|quantum|bulut)",
                &["general-knowledge"],
                "reasoning",
            ),
            capability(
                "reasoning",
                &[REASONING_TAG, "math"],
                &["matematik", "algoritma", "kod", "bilim", "strateji", "math", "algorithm", "code", "science"],
                r"(?:matematik|algoritma|kod|bilim|strateji|math|algorithm|code|science|solve)",
                &["cloud-ai", "general-knowledge"],
                "cloud-ai",
            ),
            capability(
                "developer",
                &["software"],
                &["geliştirici", "programming", "yazılım", "developer", "kod", "framework", "api", "database", "debug"],
                r"(?:geliştirici|programming|yazılım|developer|kod|framework|api|database|debug|javascript|python|react)",
                &["general-knowledge", "cloud-ai"],
                "cloud-ai",
            ),
            capability(
                "cybersecurity",
                &["security"],
                &["güvenlik", "security", "hack", "siber", "cyber", "firewall", "virus", "malware", "penetration"],
                r"(?:güvenlik|security|hack|siber|cyber|firewall|virus|malware|penetration|vulnerability)",
                &["general-knowledge", "cloud-ai"],
                "cloud-ai",
            ),
            capability(
                "radiology",
                &["medical", "imaging"],
                &["radyoloji", "radiology", "mri", "ct", "xray", "görüntüleme", "imaging", "tomografi"],
                r"(?:radyoloji|radiology|mri|ct|xray|görüntüleme|imaging|tomografi|scan)",
                &["medical", "general-knowledge"],
                "medical",
            ),
            capability(
                "pharmaceutical",
                &["medical", "pharmacy"],
                &["ilaç", "eczane", "pharmacy", "drug", "medicine", "pharmaceutical", "eczacı", "reçete"],
                r"(?:ilaç|eczane|pharmacy|drug|medicine|pharmaceutical|eczacı|reçete|antibiyotik)",
                &["medical", "general-knowledge"],
                "medical",
            ),
            capability(
                "marketing",
                &["marketing"],
                &["pazarlama", "marketing", "reklam", "advertising", "brand", "marka", "campaign", "seo"],
                r"(?:pazarlama|marketing|reklam|advertising|brand|marka|campaign|seo|social|media)",
                &["general-knowledge", "guide"],
                "general-knowledge",
            ),
        ];

        Self {
            capabilities,
            default_capability: "general-knowledge".to_string(),
            keyword_weight: 0.3,
            pattern_weight: 0.7,
            recommend_floor: 0.3,
            max_recommended: 4,
            single_threshold: 0.8,
            parallel_threshold: 0.4,
            max_parallel_targets: 3,
            consensus_quorum: strings(&["legal", "medical", "guide", "general-knowledge"]),
            reasoning_intent_pattern: r"(?:çöz|solve|hesapla|calculate|analiz|analyze)".to_string(),
            reasoning_support: strings(&["cloud-ai", "general-knowledge"]),
            max_supporting: 2,
            validation_threshold: 0.6,
            call_timeout_ms: 30_000,
            cache_ttl_secs: 3_600,
            latency_smoothing: 0.5,
            health_interval_secs: 60,
            health_timeout_ms: 5_000,
        }
    }
}
