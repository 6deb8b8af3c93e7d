//! OpenAI-compatible chat completion backend (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use profilerag_core::config::GenerationSettings;
use profilerag_core::error::{Error, Result};
use profilerag_core::traits::{GenerationRequest, Generator};

pub struct OpenAiCompatibleGenerator {
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {}", e)))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let name = if base_url.contains("groq") { "groq" } else { "openai-compatible" }.to_string();
        Ok(Self { name, api_key: api_key.into(), base_url, model: model.into(), client })
    }

    /// `None` when generation is disabled or no API key is available.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Option<Self>> {
        if !settings.enabled {
            return Ok(None);
        }
        let Some(key) = settings.resolved_api_key() else {
            tracing::info!("no generation API key configured; answers use extraction only");
            return Ok(None);
        };
        let generator = Self::new(&settings.base_url, key, settings.model.clone(), Duration::from_secs(settings.timeout_secs))?;
        tracing::info!(backend = %generator.name, model = %generator.model, "generation backend configured");
        Ok(Some(generator))
    }
}

pub fn build_body(model: &str, request: &GenerationRequest) -> Value {
    json!({
        "model": model,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.prompt },
        ],
    })
}

/// Text of the first choice; errors when the response carries none.
pub fn parse_completion(json: &Value) -> Result<String> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| Error::Generation("no choices in response".into()))?;
    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Generation("choice has no message content".into()))
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&build_body(&self.model, request))
            .send()
            .await
            .map_err(|e| Error::Generation(format!("{} connection failed ({}): {}", self.name, url, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("{} API error {}: {}", self.name, status, text)));
        }

        let json: Value = resp.json().await.map_err(|e| Error::Generation(e.to_string()))?;
        parse_completion(&json)
    }
}
