//! Chat conversation management with retrieval augmentation and tool calls.
//!
//! The `ChatManager` orchestrates one conversation turn end to end:
//!
//! 1. Queries the retriever (when attached) and, if it has results, wraps the
//!    user message in the augmentation template. The session history records
//!    the original message either way.
//! 2. Streams the LLM response, preserving tool calls that arrive in early
//!    chunks while content is still streaming.
//! 3. Executes requested tools through the plugin registry and feeds the
//!    results back until the model produces a final response.
//! 4. Appends a "Sources" footer when, and only when, retrieval had results.
//!
//! Retrieval failures during a turn are soft: the turn proceeds without
//! context rather than failing the generation request.

use crate::chat::Session;
use crate::config::Config;
use crate::detection::{self, Capabilities};
use crate::provider::{ChatRequest, Message, OllamaProvider, Provider, Tool, ToolCall, ToolFunction};
use crate::rag::{IndexOutcome, QueryResult, Retriever};
use anyhow::{Context, Result};
use axon_plugin::PluginRegistry;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Buffered fragments between the provider producer and the manager.
const STREAM_BUFFER: usize = 32;

/// Orchestrates conversations against the configured LLM backend.
///
/// The manager holds no conversation state itself; callers pass a
/// [`Session`] into each call and may run any number of sessions against one
/// manager.
pub struct ChatManager {
    config: Config,
    provider: Arc<dyn Provider>,
    registry: Arc<PluginRegistry>,
    retriever: Option<Retriever>,
}

impl ChatManager {
    /// Creates a manager with the Ollama provider and the retrieval engine
    /// selected by `config.rag.engine`.
    ///
    /// # Errors
    ///
    /// Fails when the configured retrieval engine cannot be constructed, e.g.
    /// the vector engine without an available embedding backend. Callers can
    /// fall back to the keyword engine in that case.
    pub async fn new(config: Config, registry: PluginRegistry) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(OllamaProvider::new(&config.llm));
        let capabilities = Capabilities::probe();
        let retriever = Retriever::new(&config, Arc::clone(&provider), &capabilities)
            .await
            .context("Failed to construct retrieval engine")?;

        Ok(Self {
            config,
            provider,
            registry: Arc::new(registry),
            retriever: Some(retriever),
        })
    }

    /// Replaces the provider and rebuilds the retriever against it.
    pub async fn with_provider(mut self, provider: Arc<dyn Provider>) -> Result<Self> {
        let capabilities = Capabilities::probe();
        self.retriever = Some(
            Retriever::new(&self.config, Arc::clone(&provider), &capabilities)
                .await
                .context("Failed to construct retrieval engine")?,
        );
        self.provider = provider;
        Ok(self)
    }

    /// Replaces the retriever.
    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Detaches retrieval: messages pass through unaugmented.
    pub fn without_retriever(mut self) -> Self {
        self.retriever = None;
        self
    }

    pub fn retriever(&self) -> Option<&Retriever> {
        self.retriever.as_ref()
    }

    /// Indexes one PDF into the active retrieval engine.
    pub async fn index_document(&self, path: &Path) -> Result<IndexOutcome> {
        let retriever = self
            .retriever
            .as_ref()
            .context("No retrieval engine attached")?;
        let outcome = retriever.index(path).await?;
        Ok(outcome)
    }

    /// Sends a message and returns the complete response.
    pub async fn execute(&self, session: &mut Session, message: &str) -> Result<String> {
        self.run(session, message, None).await
    }

    /// Sends a message, forwarding response fragments over `tx` as they
    /// arrive, and returns the complete response.
    ///
    /// The consumer decides buffering through the channel's capacity;
    /// dropping the receiver cancels generation at the next fragment.
    pub async fn stream(
        &self,
        session: &mut Session,
        message: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<String> {
        self.run(session, message, Some(tx)).await
    }

    /// Backend reachability probe.
    pub fn health_check(&self) -> bool {
        detection::check_ollama_silent().is_ok()
    }

    async fn run(
        &self,
        session: &mut Session,
        user_message: &str,
        forward: Option<mpsc::Sender<String>>,
    ) -> Result<String> {
        let retrieval = self.retrieve_context(user_message).await;
        let outgoing = match &retrieval {
            Some(result) => Retriever::augment(user_message, result),
            None => user_message.to_string(),
        };

        let mut messages = Vec::new();
        let system_prompt = session
            .system_prompt()
            .unwrap_or(&self.config.system_prompt);
        if !system_prompt.is_empty() {
            messages.push(Message::system(system_prompt));
        }
        messages.extend_from_slice(session.history());
        messages.push(Message::user(&outgoing));

        let tools = self.build_tools();
        let mut cancelled = false;

        let content = loop {
            debug!(
                message_count = messages.len(),
                tool_count = tools.len(),
                "Building chat request"
            );
            let mut request = ChatRequest::new(&self.config.llm.model, messages.clone())
                .with_temperature(self.config.llm.temperature)
                .with_max_tokens(self.config.llm.max_tokens);
            if !tools.is_empty() {
                request = request.with_tools(tools.clone());
            }

            // Run the provider as a producer task; fragments flow back over
            // the channel and tool calls are preserved from any chunk.
            let (tx, mut rx) = mpsc::channel(STREAM_BUFFER);
            let provider = Arc::clone(&self.provider);
            let producer = tokio::spawn(async move { provider.chat(request, tx).await });

            let mut accumulated = String::new();
            let mut tool_calls: Option<Vec<ToolCall>> = None;

            while let Some(chunk) = rx.recv().await {
                if !chunk.done && !chunk.content.is_empty() {
                    if let Some(fw) = &forward {
                        if fw.send(chunk.content.clone()).await.is_err() {
                            debug!("Stream consumer dropped, cancelling generation");
                            cancelled = true;
                        }
                    }
                }

                accumulated.push_str(&chunk.content);

                if chunk.tool_calls.is_some() {
                    tool_calls = chunk.tool_calls;
                }

                if cancelled {
                    break;
                }
            }
            // Dropping the receiver stops the producer at its next send.
            drop(rx);
            producer
                .await
                .context("Chat stream task failed")?
                .context("Failed to get LLM response")?;

            if cancelled {
                break accumulated;
            }

            match tool_calls {
                Some(calls) => {
                    info!(tool_call_count = calls.len(), "Processing tool calls from LLM");
                    messages.push(Message {
                        role: "assistant".to_string(),
                        content: accumulated.clone(),
                        tool_calls: Some(calls.clone()),
                    });

                    for call in &calls {
                        let tool_name = &call.function.name;
                        info!(tool_name = %tool_name, "Executing tool");

                        let result = self
                            .registry
                            .execute(tool_name, call.function.arguments.clone())
                            .await
                            .with_context(|| format!("Failed to execute tool: {}", tool_name))?;

                        messages.push(Message::tool(result.content));
                    }
                    // Loop again so the LLM can synthesize from the results.
                }
                None => break accumulated,
            }
        };

        let response = match &retrieval {
            Some(result) if result.has_results => match Retriever::sources_footer(result) {
                Some(footer) => {
                    if !cancelled {
                        if let Some(fw) = &forward {
                            let _ = fw.send(footer.clone()).await;
                        }
                    }
                    format!("{content}{footer}")
                }
                None => content,
            },
            _ => content,
        };

        session.record_exchange(user_message, &response);
        Ok(response)
    }

    /// Queries the retriever for context. Failures are soft: the turn
    /// proceeds unaugmented.
    async fn retrieve_context(&self, question: &str) -> Option<QueryResult> {
        let retriever = self.retriever.as_ref()?;
        match retriever.query(question, self.config.storage.top_k).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Could not retrieve context, continuing without it: {e}");
                None
            }
        }
    }

    /// Converts registered plugins into tool definitions for the LLM.
    fn build_tools(&self) -> Vec<Tool> {
        self.registry
            .all()
            .iter()
            .map(|plugin| Tool {
                tool_type: "function".to_string(),
                function: ToolFunction {
                    name: plugin.name().to_string(),
                    description: plugin.description().to_string(),
                    parameters: plugin.parameter_schema(),
                },
            })
            .collect()
    }
}
