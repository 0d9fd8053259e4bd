// ABOUTME: HTTP provider adapter that forwards requests to a remote capability endpoint.
// ABOUTME: Posts the request as JSON and translates the reply into a ProviderReply.

use async_trait::async_trait;
use log;

use super::error::ProviderError;
use super::provider::CapabilityProvider;
use super::types::{ProviderReply, ProviderStatus, RequestContext};

/// Capability provider backed by a JSON-over-HTTP endpoint.
///
/// `POST {url}` with `{"request": .., "context": ..}` and expects
/// `{"success": bool, "response": .., "confidence"?: f64, "error"?: str}`.
/// `GET {url}/health` is expected to return `{"status": "active" | "degraded" | "unavailable"}`.
pub struct HttpProvider {
    id: String,
    url: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(id: &str, url: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            id: id.to_string(),
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.url)
    }

    /// Build the request body for the provider endpoint.
    fn build_request_body(request: &str, context: &RequestContext) -> serde_json::Value {
        serde_json::json!({
            "request": request,
            "context": context,
        })
    }

    /// Translate a provider reply body into a result.
    fn parse_reply(body: &serde_json::Value) -> Result<ProviderReply, ProviderError> {
        let success = body
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !success {
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("provider reported failure without a reason");
            return Err(ProviderError::Failed(message.to_string()));
        }

        let response = body
            .get("response")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let confidence = body.get("confidence").and_then(|v| v.as_f64());

        Ok(ProviderReply {
            response,
            confidence,
        })
    }

    fn parse_status(body: &serde_json::Value) -> ProviderStatus {
        match body.get("status").and_then(|v| v.as_str()) {
            Some("active") | Some("healthy") => ProviderStatus::Active,
            Some("degraded") => ProviderStatus::Degraded,
            _ => ProviderStatus::Unavailable,
        }
    }
}

#[async_trait]
impl CapabilityProvider for HttpProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(
        &self,
        request: &str,
        context: &RequestContext,
    ) -> Result<ProviderReply, ProviderError> {
        log::debug!("[HttpProvider] {} -> POST {}", self.id, self.url);

        let body = Self::build_request_body(request, context);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("Provider request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            log::warn!("[HttpProvider] {} returned HTTP {}", self.id, status);
            return Err(ProviderError::Failed(format!(
                "HTTP {}: {}",
                status,
                body_text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Invalid provider reply: {}", e)))?;

        Self::parse_reply(&parsed)
    }

    async fn health_check(&self) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .client
            .get(self.health_url())
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("Health probe failed: {}", e)))?;

        if !response.status().is_success() {
            return Ok(ProviderStatus::Unavailable);
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Invalid health reply: {}", e)))?;
        Ok(Self::parse_status(&parsed))
    }
}
