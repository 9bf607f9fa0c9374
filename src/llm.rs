use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// A language-model backend: prompt text in, completion text out.
/// Both generation calls of a request go through the same implementation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Selector identifier reported back to the caller ("local", "gemini").
    fn id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Ollama instance reachable on the local network.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn id(&self) -> &str {
        "local"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: String,
        }

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status()));
        }

        let generate_response: GenerateResponse = response.json().await?;
        Ok(generate_response.response)
    }
}

/// Google Generative Language API client. Only constructed when an API key
/// is configured; requests for it fall back to the local model otherwise.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ModelError::Status(response.status()));
        }

        let response_json: serde_json::Value = response.json().await?;
        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ModelError::Malformed("no candidate text in Gemini response".to_string())
            })?;
        Ok(text.to_string())
    }
}
