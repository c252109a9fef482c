//! HTTP reasoning engine client.
//!
//! Speaks three wire protocols (Gemini generateContent, OpenAI-compatible
//! chat/completions, Ollama /api/generate) and maps every transport failure
//! onto `EngineError`. The text it returns is untrusted; parsing happens
//! later in `cable_common::parser`.

use super::ReasoningEngine;
use crate::config::{EngineBackend, EngineConfig};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use cable_common::EngineError;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct HttpReasoningEngine {
    http_client: reqwest::Client,
    backend: EngineBackend,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl HttpReasoningEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let needs_key = matches!(config.backend, EngineBackend::Gemini | EngineBackend::Openai);
        if needs_key && config.api_key.as_deref().map_or(true, str::is_empty) {
            bail!(
                "engine.api_key (or GEMINI_API_KEY) is required for the {:?} backend",
                config.backend
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            backend: config.backend,
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
        match self.backend {
            EngineBackend::Gemini => {
                let url = format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.endpoint, self.model
                );
                let body = json!({
                    "contents": [{"role": "user", "parts": [{"text": prompt}]}],
                    "generationConfig": {
                        "temperature": self.temperature,
                        "maxOutputTokens": self.max_output_tokens,
                    },
                });
                let request = self.http_client.post(url).json(&body);
                match &self.api_key {
                    Some(key) => request.header("x-goog-api-key", key),
                    None => request,
                }
            }
            EngineBackend::Openai => {
                let url = format!("{}/v1/chat/completions", self.endpoint);
                let body = json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": self.temperature,
                    "max_tokens": self.max_output_tokens,
                });
                let request = self.http_client.post(url).json(&body);
                match &self.api_key {
                    Some(key) => request.bearer_auth(key),
                    None => request,
                }
            }
            EngineBackend::Ollama => {
                let url = format!("{}/api/generate", self.endpoint);
                let body = json!({
                    "model": self.model,
                    "prompt": prompt,
                    "stream": false,
                    "format": "json",
                    "options": {
                        "temperature": self.temperature,
                        "num_predict": self.max_output_tokens,
                    },
                });
                self.http_client.post(url).json(&body)
            }
        }
    }
}

#[async_trait]
impl ReasoningEngine for HttpReasoningEngine {
    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, EngineError> {
        info!("[>]  Engine call [{}] ({} chars)", self.name(), prompt.len());
        let start = Instant::now();

        let response = self
            .request(prompt)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("[-]  Engine error {}: {}", status, truncate(&body, 500));
            return Err(map_status(status, &body));
        }

        let payload: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }
            } else {
                EngineError::MalformedTransport(format!("response body is not JSON: {}", e))
            }
        })?;
        let text = extract_text(self.backend, &payload)?;

        info!(
            "[<]  Engine replied in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );
        debug!("Engine raw reply: {}", truncate(&text, 1000));
        Ok(text)
    }

    fn name(&self) -> String {
        format!("{:?}/{}", self.backend, self.model).to_lowercase()
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout {
            after_ms: timeout.as_millis() as u64,
        }
    } else {
        EngineError::Unreachable(err.to_string())
    }
}

/// 429 is quota, 5xx and 408 are outages, anything else means we and the
/// engine disagree about the protocol.
pub fn map_status(status: StatusCode, body: &str) -> EngineError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
    if status == StatusCode::TOO_MANY_REQUESTS {
        EngineError::QuotaExceeded(detail)
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        EngineError::Unreachable(detail)
    } else {
        EngineError::MalformedTransport(detail)
    }
}

/// Pull the completion text out of a backend's JSON envelope.
pub fn extract_text(backend: EngineBackend, payload: &Value) -> Result<String, EngineError> {
    let text = match backend {
        EngineBackend::Gemini => payload
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            }),
        EngineBackend::Openai => payload
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        EngineBackend::Ollama => payload
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    };

    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        Some(_) => Err(EngineError::MalformedTransport(
            "engine returned an empty completion".to_string(),
        )),
        None => Err(EngineError::MalformedTransport(format!(
            "no completion text in {:?} envelope",
            backend
        ))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
