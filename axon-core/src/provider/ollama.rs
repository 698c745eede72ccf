//! Ollama provider implementation.
//!
//! This module provides an Ollama HTTP API client that implements the
//! Provider trait: streaming chat over `/api/chat` and batch embeddings over
//! `/api/embed`.

use super::types::*;
use crate::config::LlmConfig;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Ollama HTTP API provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider from the LLM configuration.
    pub fn new(config: &LlmConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            base_url: config.base_url.clone(),
            http_client,
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(&LlmConfig::default())
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, request: ChatRequest, tx: mpsc::Sender<ChatChunk>) -> Result<()> {
        let url = format!("{}/api/chat", self.base_url);

        // Convert to Ollama-specific request format
        let ollama_request = OllamaChatRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                    tool_calls: m.tool_calls.as_ref().map(|tcs| {
                        tcs.iter()
                            .map(|tc| OllamaToolCall {
                                function: OllamaToolCallFunction {
                                    name: tc.function.name.clone(),
                                    arguments: tc.function.arguments.clone(),
                                },
                            })
                            .collect()
                    }),
                })
                .collect(),
            options: {
                let mut opts = HashMap::new();
                opts.insert(
                    "temperature".to_string(),
                    serde_json::json!(request.temperature),
                );
                if let Some(max_tokens) = request.max_tokens {
                    opts.insert("num_predict".to_string(), serde_json::json!(max_tokens));
                }
                Some(opts)
            },
            stream: true,
            tools: request.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| OllamaTool {
                        tool_type: t.tool_type.clone(),
                        function: OllamaToolFunction {
                            name: t.function.name.clone(),
                            description: t.function.description.clone(),
                            parameters: t.function.parameters.clone(),
                        },
                    })
                    .collect()
            }),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line = buffer.drain(..=newline_pos).collect::<Vec<_>>();

                if line.len() <= 1 {
                    continue;
                }

                let line_str = String::from_utf8_lossy(&line[..line.len() - 1]);

                if let Ok(ollama_response) = serde_json::from_str::<OllamaChatResponse>(&line_str) {
                    let chunk = ChatChunk {
                        content: ollama_response.message.content.clone(),
                        done: ollama_response.done,
                        tool_calls: ollama_response.message.tool_calls.as_ref().map(|tcs| {
                            tcs.iter()
                                .map(|tc| ToolCall {
                                    function: ToolCallFunction {
                                        name: tc.function.name.clone(),
                                        arguments: tc.function.arguments.clone(),
                                    },
                                })
                                .collect()
                        }),
                    };

                    // A dropped receiver means the consumer cancelled; stop
                    // producing at this yield point.
                    if tx.send(chunk).await.is_err() {
                        debug!("chat consumer dropped, stopping stream");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);

        let embed_request = EmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&embed_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let embed_response = response.json::<EmbedResponse>().await?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(ProviderError::Api(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embed_response.embeddings.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}

// Ollama-specific request/response types (internal)

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<String, serde_json::Value>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OllamaToolFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCallFunction {
    name: String,
    arguments: serde_json::Value,
}
