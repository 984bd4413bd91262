//! Agent runtime on top of an OpenAI-compatible chat completion API.
//!
//! Thread history lives in the runtime, keyed by the opaque reference
//! handed out by `new_thread`, so agents created for later turns see the
//! same conversation. With a [`TranscriptStore`] attached, every committed
//! history is also written to disk and reloaded on first use after a
//! restart. Each turn runs a bounded tool loop:
//!
//! ```text
//! user message ─▶ completion ─┬─ text ──────────────▶ done
//!                             └─ tool calls ─▶ execute ─▶ completion ...
//! ```

use super::client::OpenAiClient;
use super::protocol::{ChatMessage, ChatRequest};
use crate::threads::TranscriptStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vaultpilot_application::{AgentError, AgentRuntime, AgentSpec, AgentStream, ChatAgent};
use vaultpilot_domain::{AgentUnit, ThreadHandle};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

type Histories = Arc<Mutex<HashMap<String, Vec<ChatMessage>>>>;

pub struct OpenAiAgentRuntime {
    client: OpenAiClient,
    model: String,
    max_tool_rounds: usize,
    max_tokens: Option<u32>,
    histories: Histories,
    transcripts: Option<Arc<TranscriptStore>>,
}

impl OpenAiAgentRuntime {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_tokens: None,
            histories: Arc::new(Mutex::new(HashMap::new())),
            transcripts: None,
        }
    }

    /// Persist thread histories under `dir`.
    pub fn with_transcripts(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transcripts = Some(Arc::new(TranscriptStore::new(dir)));
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of threads with history in memory.
    pub fn thread_count(&self) -> usize {
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop all histories (shutdown or test reset).
    pub fn clear(&self) {
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl AgentRuntime for OpenAiAgentRuntime {
    async fn create_agent(&self, spec: AgentSpec) -> Result<Box<dyn ChatAgent>, AgentError> {
        if self.model.trim().is_empty() {
            return Err(AgentError::CreationFailed(
                "agent model name is empty".to_string(),
            ));
        }
        Ok(Box::new(OpenAiAgent {
            client: self.client.clone(),
            model: self.model.clone(),
            max_tool_rounds: self.max_tool_rounds,
            max_tokens: self.max_tokens,
            spec: Arc::new(spec),
            histories: self.histories.clone(),
            transcripts: self.transcripts.clone(),
        }))
    }
}

struct OpenAiAgent {
    client: OpenAiClient,
    model: String,
    max_tool_rounds: usize,
    max_tokens: Option<u32>,
    spec: Arc<AgentSpec>,
    histories: Histories,
    transcripts: Option<Arc<TranscriptStore>>,
}

impl OpenAiAgent {
    /// History of a thread: memory first, then the transcript on disk.
    async fn history(&self, runtime_ref: &str) -> Option<Vec<ChatMessage>> {
        let cached = self
            .histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(runtime_ref)
            .cloned();
        if cached.is_some() {
            return cached;
        }

        let transcripts = self.transcripts.as_ref()?;
        match transcripts.load::<Vec<ChatMessage>>(runtime_ref).await {
            Ok(Some(history)) => {
                debug!(thread = %runtime_ref, messages = history.len(), "Restored thread transcript");
                self.histories
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(runtime_ref.to_string(), history.clone());
                Some(history)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(thread = %runtime_ref, error = %e, "Unreadable thread transcript");
                None
            }
        }
    }
}

#[async_trait]
impl ChatAgent for OpenAiAgent {
    async fn new_thread(&self, cancel: &CancellationToken) -> Result<String, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        let runtime_ref = uuid::Uuid::new_v4().to_string();
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(runtime_ref.clone(), Vec::new());
        if let Some(transcripts) = &self.transcripts {
            if let Err(e) = transcripts.save(&runtime_ref, &Vec::<ChatMessage>::new()).await {
                warn!(thread = %runtime_ref, error = %e, "Failed to write thread transcript");
            }
        }
        debug!(thread = %runtime_ref, "Opened runtime thread");
        Ok(runtime_ref)
    }

    async fn stream(
        &self,
        message: &str,
        thread: &ThreadHandle,
        cancel: &CancellationToken,
    ) -> Result<AgentStream, AgentError> {
        let history = self
            .history(&thread.runtime_ref)
            .await
            .ok_or_else(|| AgentError::UnknownThread(thread.runtime_ref.clone()))?;

        let (tx, rx) = mpsc::channel(32);
        let turn = TurnLoop {
            client: self.client.clone(),
            model: self.model.clone(),
            max_tool_rounds: self.max_tool_rounds,
            max_tokens: self.max_tokens,
            spec: self.spec.clone(),
            histories: self.histories.clone(),
            transcripts: self.transcripts.clone(),
            runtime_ref: thread.runtime_ref.clone(),
            history,
        };
        let message = message.to_string();
        let cancel = cancel.clone();
        tokio::spawn(async move { turn.run(message, tx, cancel).await });

        Ok(AgentStream::new(rx))
    }
}

/// One turn's working state; history is written back only when the turn
/// finishes with a final answer.
struct TurnLoop {
    client: OpenAiClient,
    model: String,
    max_tool_rounds: usize,
    max_tokens: Option<u32>,
    spec: Arc<AgentSpec>,
    histories: Histories,
    transcripts: Option<Arc<TranscriptStore>>,
    runtime_ref: String,
    history: Vec<ChatMessage>,
}

impl TurnLoop {
    fn request(&self) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::system(&self.spec.instructions));
        messages.extend(self.history.iter().cloned());
        ChatRequest::new(&self.model, messages)
            .with_tools(&self.spec.tools)
            .with_max_tokens(self.max_tokens)
    }

    async fn run(mut self, message: String, tx: mpsc::Sender<AgentUnit>, cancel: CancellationToken) {
        self.history.push(ChatMessage::user(message));

        for round in 0..self.max_tool_rounds {
            let completion = match self.client.chat(&self.request(), &cancel).await {
                Ok(completion) => completion,
                Err(e) if e.is_cancelled() => return,
                Err(e) => {
                    warn!(model = %self.model, round, error = %e, "Completion failed");
                    let _ = tx.send(AgentUnit::Error(e.to_string())).await;
                    return;
                }
            };

            let reply = completion.message;
            let calls = reply.tool_calls.clone().unwrap_or_default();
            let text = reply.content.clone().filter(|t| !t.is_empty());

            if let Some(text) = &text {
                if tx.send(AgentUnit::Text(text.clone())).await.is_err() {
                    return;
                }
            }

            if calls.is_empty() {
                self.history.push(ChatMessage::assistant(text.unwrap_or_default()));
                self.commit().await;
                return;
            }

            self.history
                .push(ChatMessage::assistant_tool_calls(text, calls.clone()));
            for wire_call in &calls {
                let call = wire_call.to_domain();
                if tx.send(AgentUnit::ToolCallRequested(call.clone())).await.is_err() {
                    return;
                }
                let result = self.spec.executor.execute(&call, &cancel).await;
                if cancel.is_cancelled() {
                    return;
                }
                self.history
                    .push(ChatMessage::tool_result(&wire_call.id, &result.outcome.content));
                if tx.send(AgentUnit::ToolResult(result)).await.is_err() {
                    return;
                }
            }
        }

        info!(rounds = self.max_tool_rounds, "Tool round limit reached");
        let _ = tx
            .send(AgentUnit::Error(format!(
                "Tool round limit ({}) reached without a final answer",
                self.max_tool_rounds
            )))
            .await;
    }

    async fn commit(self) {
        if let Some(transcripts) = &self.transcripts {
            if let Err(e) = transcripts.save(&self.runtime_ref, &self.history).await {
                warn!(thread = %self.runtime_ref, error = %e, "Failed to write thread transcript");
            }
        }
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.runtime_ref, self.history);
    }
}
