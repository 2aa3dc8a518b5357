//! Blocking client for OpenAI-compatible chat-completions endpoints.
//!
//! vLLM, TGI, Ollama and llama.cpp all serve this API, so one client covers
//! every model in a run. Generation is compute-bound and the harness is
//! strictly sequential, so requests are blocking with a generous timeout;
//! transient failures retry with exponential backoff inside the client.

use crate::client::ChatBackend;
use crate::models::{EndpointConfig, GenerationConfig, HanbenchError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat backend over an OpenAI-compatible HTTP endpoint.
pub struct LlmClient {
    /// None after release()
    http: Option<reqwest::blocking::Client>,
    name: String,
    model_id: String,
    api_key: Option<String>,
    base_url: String,
    max_retries: u32,
    generation: GenerationConfig,
}

impl LlmClient {
    /// Create a client for `model_id` served at `endpoint`.
    pub fn new(
        name: impl Into<String>,
        model_id: impl Into<String>,
        api_key: Option<String>,
        endpoint: &EndpointConfig,
        generation: &GenerationConfig,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(HanbenchError::Network)?;

        Ok(Self {
            http: Some(http),
            name: name.into(),
            model_id: model_id.into(),
            api_key,
            base_url: endpoint.base_url.clone(),
            max_retries: endpoint.max_retries,
            generation: generation.clone(),
        })
    }

    fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
        let http = self.http.as_ref().ok_or_else(|| {
            HanbenchError::backend(&self.name, "backend already released")
        })?;

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error: Option<HanbenchError> = None;

        for attempt in 0..self.max_retries {
            let mut builder = http.post(&url).json(request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = match builder.send() {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(HanbenchError::Network(e));
                    if attempt < self.max_retries - 1 {
                        let backoff = Duration::from_secs(2u64.pow(attempt));
                        debug!(
                            model = %self.name,
                            attempt = attempt,
                            backoff_secs = backoff.as_secs(),
                            "Retrying after network error"
                        );
                        std::thread::sleep(backoff);
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(1.0);

                last_error = Some(HanbenchError::backend(&self.name, "rate limited"));

                if attempt < self.max_retries - 1 {
                    debug!(
                        model = %self.name,
                        retry_after_secs = retry_after,
                        "Rate limited, waiting"
                    );
                    std::thread::sleep(Duration::from_secs_f64(retry_after));
                }
                continue;
            }

            if !response.status().is_success() {
                let body = response.text().unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorResponse>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);

                last_error = Some(HanbenchError::backend(
                    &self.name,
                    format!("HTTP {status}: {message}"),
                ));

                // Auth and unknown-model errors won't improve on retry.
                if status == 401 || status == 404 {
                    break;
                }

                if attempt < self.max_retries - 1 {
                    std::thread::sleep(Duration::from_secs(2u64.pow(attempt)));
                }
                continue;
            }

            let body: ChatCompletionResponse = response.json().map_err(|e| {
                HanbenchError::backend(&self.name, format!("invalid response: {e}"))
            })?;

            return body
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| HanbenchError::backend(&self.name, "no choices in response"));
        }

        Err(last_error
            .unwrap_or_else(|| HanbenchError::backend(&self.name, "retries exhausted")))
    }
}

impl ChatBackend for LlmClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_new_tokens: u32,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatCompletionRequest {
            model: self.model_id.clone(),
            messages,
            max_tokens: max_new_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
        };

        self.complete(&request)
    }

    fn release(&mut self) {
        if self.http.take().is_some() {
            debug!(model = %self.name, "Released backend");
        }
    }
}
