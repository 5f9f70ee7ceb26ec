//! Hosted generative-language API backend.
//!
//! One operation: a text prompt in, generated text out. The tutor treats the
//! provider as opaque; everything conversational (history, roles, fallbacks)
//! is assembled by the caller before the prompt reaches this layer.

use crate::config::ModelConfig;
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::info;

/// A hosted text-generation model.
///
/// The controller and dialogue engine are written against this trait so
/// tests can substitute deterministic implementations.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// response body the provider contract does not allow.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// REST client for the `generateContent` endpoint of the hosted
/// generative-language API.
pub struct GenerativeApi {
    config: ModelConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GenerativeApi {
    /// Create a new API client.
    ///
    /// The credential is resolved eagerly so a missing or placeholder key
    /// surfaces as [`TutorError::Credential`] at startup, with guidance,
    /// rather than as a failed request mid-conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable API key is configured or the HTTP
    /// client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_s))
            .build()
            .map_err(|e| TutorError::Model(format!("HTTP client construction failed: {e}")))?;

        info!(
            "model API configured: {} model={}",
            config.api_url, config.api_model
        );

        Ok(Self {
            config: config.clone(),
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        format!("{base}/v1beta/models/{}:generateContent", self.config.api_model)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens,
            },
        })
    }

    /// Pull the generated text out of a `generateContent` response body.
    fn extract_text(body: &serde_json::Value) -> Result<String> {
        let parts = body["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| TutorError::Model("response has no candidate parts".to_owned()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(TutorError::Model("response candidate is empty".to_owned()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GenerativeApi {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| TutorError::Model(format!("API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.trim().chars().take(200).collect();
            return Err(TutorError::Model(format!(
                "API returned {status}{}{detail}",
                if detail.is_empty() { "" } else { ": " },
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TutorError::Model(format!("malformed response: {e}")))?;

        let text = Self::extract_text(&body)?;
        info!(
            "model responded with {} chars in {:.1}s",
            text.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}

/// Stand-in model used when no credential is configured.
///
/// Every request fails with the stored credential guidance, which the
/// dialogue engine absorbs into its apology fallback, so the rest of the
/// app keeps working while chat explains what is missing.
pub struct UnconfiguredModel {
    guidance: String,
}

impl UnconfiguredModel {
    /// Create a stub that fails with `guidance`.
    #[must_use]
    pub fn new(guidance: String) -> Self {
        Self { guidance }
    }
}

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(TutorError::Credential(self.guidance.clone()))
    }
}
