//! Interpretation provider clients.
//!
//! All text-generation backends sit behind one uniform call signature;
//! the per-provider differences (endpoint, auth header shape, body shape,
//! where the text lives in the response) are confined to a small adapter
//! match. Soft failures (HTTP errors, unparseable output) come back as
//! errors for the orchestrator to swallow and fall through; they are
//! recoverable, never fatal to the overall request.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tracing::debug;

use crate::config::AppConfig;
use crate::services::json_extract::extract_json_object;

/// Hard per-call timeout, enforced regardless of provider behavior.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Output token budget for interpretation calls.
const MAX_OUTPUT_TOKENS: u32 = 2000;

const GEMINI_MODEL: &str = "gemini-2.0-flash";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// The interchangeable text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Openai,
    Anthropic,
}

struct ProviderCredential {
    kind: ProviderKind,
    api_key: String,
}

/// Uniform client over all credentialed providers.
pub struct ProviderClient {
    http: Client,
    credentials: Vec<ProviderCredential>,
}

impl ProviderClient {
    /// Build a client holding only the providers that have credentials.
    /// Fallback order preference when rotation starts at zero:
    /// Gemini (fast) > OpenAI > Anthropic.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(ProviderError::Http)?;

        let mut credentials = Vec::new();
        let keyed = [
            (ProviderKind::Gemini, &config.gemini_api_key),
            (ProviderKind::Openai, &config.openai_api_key),
            (ProviderKind::Anthropic, &config.anthropic_api_key),
        ];
        for (kind, key) in keyed {
            if let Some(key) = key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                credentials.push(ProviderCredential {
                    kind,
                    api_key: key.to_string(),
                });
            }
        }

        Ok(Self { http, credentials })
    }

    pub fn available(&self) -> Vec<ProviderKind> {
        self.credentials.iter().map(|c| c.kind).collect()
    }

    /// Rotating permutation of the available providers.
    ///
    /// Seeding with the current unix time spreads load: over k consecutive
    /// seeds every provider leads the order exactly once, instead of the
    /// primary being hammered first on every request.
    pub fn provider_order(&self, seed: u64) -> Vec<ProviderKind> {
        let kinds = self.available();
        if kinds.is_empty() {
            return kinds;
        }
        let start = (seed % kinds.len() as u64) as usize;
        let mut order = Vec::with_capacity(kinds.len());
        for i in 0..kinds.len() {
            order.push(kinds[(start + i) % kinds.len()]);
        }
        order
    }

    /// Call one provider with the interpretation prompt and extract the
    /// JSON object from its output.
    pub async fn call(&self, kind: ProviderKind, prompt: &str) -> Result<Value, ProviderError> {
        let credential = self
            .credentials
            .iter()
            .find(|c| c.kind == kind)
            .ok_or(ProviderError::NotConfigured(kind))?;

        let raw_text = match kind {
            ProviderKind::Gemini => self.call_gemini(&credential.api_key, prompt).await?,
            ProviderKind::Openai => self.call_openai(&credential.api_key, prompt).await?,
            ProviderKind::Anthropic => self.call_anthropic(&credential.api_key, prompt).await?,
        };

        debug!(provider = %kind, output_len = raw_text.len(), "provider responded");

        extract_json_object(&raw_text).ok_or(ProviderError::Unparseable(kind))
    }

    async fn call_gemini(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{GEMINI_MODEL}:generateContent"
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0, "maxOutputTokens": MAX_OUTPUT_TOKENS }
        });

        let payload = self
            .post_json(ProviderKind::Gemini, self.http.post(url).header("x-goog-api-key", api_key), &body)
            .await?;

        Ok(payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn call_openai(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": OPENAI_MODEL,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "response_format": { "type": "json_object" }
        });

        let payload = self
            .post_json(
                ProviderKind::Openai,
                self.http
                    .post("https://api.openai.com/v1/chat/completions")
                    .bearer_auth(api_key),
                &body,
            )
            .await?;

        Ok(payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn call_anthropic(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": ANTHROPIC_MODEL,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "temperature": 0,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let payload = self
            .post_json(
                ProviderKind::Anthropic,
                self.http
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", api_key)
                    .header("anthropic-version", "2023-06-01"),
                &body,
            )
            .await?;

        Ok(payload["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn post_json(
        &self,
        kind: ProviderKind,
        request: reqwest::RequestBuilder,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let response = request.json(body).send().await.map_err(ProviderError::Http)?;

        if !response.status().is_success() {
            return Err(ProviderError::Api {
                kind,
                status: response.status().as_u16(),
            });
        }

        response.json().await.map_err(ProviderError::Http)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} returned HTTP {status}")]
    Api { kind: ProviderKind, status: u16 },

    #[error("no JSON object found in {0} output")]
    Unparseable(ProviderKind),

    #[error("{0} has no configured credentials")]
    NotConfigured(ProviderKind),
}
