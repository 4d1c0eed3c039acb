use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;

pub trait LlmClient: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completion client. `base_url` covers local
/// gateways that speak the same protocol.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            client: Client::new(),
        }
    }

    /// None when no OPENAI_API_KEY is configured; callers degrade to
    /// context-only answers.
    pub fn from_env(model: String) -> Option<Self> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| Self::new(model, key, std::env::var("OPENAI_BASE_URL").ok()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatRespChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResp {
    choices: Vec<ChatRespChoice>,
}

impl LlmClient for OpenAiClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
        });
        let resp = self.client.post(&url).bearer_auth(&self.api_key).json(&body).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let txt = resp.text().unwrap_or_default();
            return Err(anyhow::anyhow!("LLM error {}: {}", status, txt));
        }
        let parsed: ChatResp = resp.json()?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        Ok(content)
    }
}
