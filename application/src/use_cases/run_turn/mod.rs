//! Run Turn use case
//!
//! Drives one conversational turn end-to-end:
//! 1. Serialize on the conversation (one turn per conversation at a time)
//! 2. Fetch the catalog snapshot and select tools for the message
//! 3. Build an agent whose executor is wrapped by the safety gate
//! 4. Resolve or create the conversation thread
//! 5. Stream agent units as [`StreamEvent`]s, in producer order
//! 6. Emit exactly one terminal `Done` or `Error`
//!
//! The turn body runs in its own task. A supervising task awaits it and
//! emits the terminal event, so an error, a cancellation or even a panic
//! in the body still closes the stream properly.

mod types;

pub use types::{RunTurnInput, TurnError, TurnStream};

use crate::config::TurnParams;
use crate::ports::agent_runtime::{AgentError, AgentRuntime, AgentSpec, AgentStream, ChatAgent};
use crate::ports::thread_store::ThreadStore;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::safety_gate::{GateError, GatedExecutor, SafetyGate};
use crate::use_cases::tool_catalog::ToolCatalog;
use crate::use_cases::tool_selection::{AllTools, ToolSelector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vaultpilot_domain::{
    ActionCard, ActionStatus, AgentUnit, ReflectionKey, StreamEvent, ThreadHandle, ThreadId,
    ToolInvocationResult, ToolResultPayload, TurnMetadata, TurnSummary,
};

/// Per-turn controller and the core's public surface:
/// [`run_turn`](Self::run_turn), [`confirm`](Self::confirm) and
/// [`cancel_action`](Self::cancel_action).
pub struct TurnOrchestrator {
    catalog: Arc<ToolCatalog>,
    threads: Arc<dyn ThreadStore>,
    runtime: Arc<dyn AgentRuntime>,
    gate: Arc<SafetyGate>,
    executor: Arc<dyn ToolExecutorPort>,
    selector: Arc<dyn ToolSelector>,
    params: TurnParams,
    conversations: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TurnOrchestrator {
    /// `executor` is the real executor; the orchestrator wraps it with
    /// `gate` for every agent it builds.
    pub fn new(
        catalog: Arc<ToolCatalog>,
        threads: Arc<dyn ThreadStore>,
        runtime: Arc<dyn AgentRuntime>,
        gate: Arc<SafetyGate>,
        executor: Arc<dyn ToolExecutorPort>,
        params: TurnParams,
    ) -> Self {
        Self {
            catalog,
            threads,
            runtime,
            gate,
            executor,
            selector: Arc::new(AllTools),
            params,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn ToolSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn gate(&self) -> &Arc<SafetyGate> {
        &self.gate
    }

    /// Start a turn and return its event stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run_turn(self: &Arc<Self>, input: RunTurnInput, cancel: CancellationToken) -> TurnStream {
        let (tx, rx) = mpsc::channel(self.params.event_buffer.max(1));
        let this = Arc::clone(self);
        let supervisor = Arc::clone(self);

        tokio::spawn(async move {
            let conversation_id = input.conversation_id.clone();
            let body_tx = tx.clone();
            let body = tokio::spawn(async move { this.drive(input, &body_tx, &cancel).await });

            let terminal = match body.await {
                Ok(Ok(summary)) => {
                    info!(
                        conversation = %conversation_id,
                        tool_calls = summary.tool_calls,
                        pending = summary.pending_actions.len(),
                        "Turn finished"
                    );
                    StreamEvent::Done(summary)
                }
                Ok(Err(e)) if e.is_cancelled() => {
                    info!(conversation = %conversation_id, reason = %e, "Turn cancelled");
                    StreamEvent::cancelled(e.to_string())
                }
                Ok(Err(e)) => {
                    warn!(conversation = %conversation_id, error = %e, "Turn failed");
                    StreamEvent::error(e.to_string())
                }
                Err(join_error) => {
                    warn!(conversation = %conversation_id, error = %join_error, "Turn task aborted");
                    StreamEvent::error(format!("Turn aborted: {join_error}"))
                }
            };
            supervisor.release_conversation_lock(&conversation_id);
            // The receiver may already be gone; nothing left to tell it.
            let _ = tx.send(terminal).await;
        });

        TurnStream::new(rx)
    }

    /// Confirm a pending action and execute it.
    pub async fn confirm(
        &self,
        key: &ReflectionKey,
        cancel: &CancellationToken,
    ) -> Result<ToolInvocationResult, GateError> {
        self.gate.confirm(key, cancel).await
    }

    /// Cancel a pending action without executing it.
    pub fn cancel_action(&self, key: &ReflectionKey) -> Result<ActionCard, GateError> {
        self.gate.cancel(key)
    }

    /// Forget a conversation: drop its thread and its turn lock.
    pub async fn end_conversation(&self, conversation_id: &str) -> Result<(), TurnError> {
        self.threads.delete(&ThreadId::new(conversation_id)).await?;
        self.conversations_guard().remove(conversation_id);
        Ok(())
    }

    /// Drop every cache and registry (shutdown or test reset).
    pub async fn reset(&self) -> Result<(), TurnError> {
        self.catalog.invalidate();
        self.gate.clear();
        self.threads.clear().await?;
        self.conversations_guard().clear();
        Ok(())
    }

    async fn drive(
        &self,
        input: RunTurnInput,
        events: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<TurnSummary, TurnError> {
        let lock = self.conversation_lock(&input.conversation_id);
        let _turn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            guard = lock.lock_owned() => guard,
        };
        info!(conversation = %input.conversation_id, "Turn started");

        let snapshot = self.catalog.get_tools(cancel).await?;
        let tools = self.selector.select(&input.message, snapshot.tools());
        debug!(offered = tools.len(), available = snapshot.len(), "Selected tools");

        let spec = AgentSpec {
            instructions: self.params.instructions.clone(),
            tools,
            executor: Arc::new(GatedExecutor::new(self.gate.clone(), self.executor.clone())),
        };
        let tool_count = spec.tools.len();
        let agent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            agent = self.runtime.create_agent(spec) => agent?,
        };

        let thread = self
            .resolve_thread(&input.conversation_id, agent.as_ref(), cancel)
            .await?;

        emit(
            events,
            StreamEvent::Metadata(TurnMetadata {
                conversation_id: input.conversation_id.clone(),
                thread_id: thread.id.to_string(),
                tool_count,
                servers: snapshot.per_server_counts().to_vec(),
            }),
        )
        .await?;

        let deadline = tokio::time::sleep(self.params.completion_timeout);
        tokio::pin!(deadline);

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            _ = &mut deadline => return Err(TurnError::Timeout(self.params.completion_timeout)),
            stream = self.open_stream(&input, agent.as_ref(), thread, cancel) => stream?,
        };

        let mut summary = TurnSummary::default();
        loop {
            let unit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TurnError::Cancelled),
                _ = &mut deadline => return Err(TurnError::Timeout(self.params.completion_timeout)),
                unit = stream.next() => unit,
            };
            let Some(unit) = unit else { break };

            match unit {
                AgentUnit::Text(text) => emit(events, StreamEvent::Text(text)).await?,
                AgentUnit::ToolCallRequested(call) => {
                    summary.tool_calls += 1;
                    emit(events, StreamEvent::ToolCallRequested(call)).await?;
                }
                AgentUnit::ToolResult(result) => {
                    let payload = ToolResultPayload {
                        tool_name: result.tool_name,
                        call_id: result.call_id,
                        outcome: result.outcome,
                    };
                    emit(events, StreamEvent::ToolResult(payload)).await?;
                    if let Some(card) = result.action_card {
                        if card.status == ActionStatus::Pending {
                            summary.pending_actions.push(card.id.to_string());
                        }
                        emit(events, StreamEvent::ActionCard(card)).await?;
                    }
                }
                AgentUnit::Error(message) => {
                    return Err(TurnError::Agent(AgentError::Upstream(message)));
                }
            }
        }

        Ok(summary)
    }

    /// Open the agent stream, recreating the runtime thread once if the
    /// runtime no longer knows the stored reference (e.g. after a restart).
    async fn open_stream(
        &self,
        input: &RunTurnInput,
        agent: &dyn ChatAgent,
        thread: ThreadHandle,
        cancel: &CancellationToken,
    ) -> Result<AgentStream, TurnError> {
        match agent.stream(&input.message, &thread, cancel).await {
            Err(AgentError::UnknownThread(stale)) => {
                warn!(
                    conversation = %input.conversation_id,
                    runtime_ref = %stale,
                    "Runtime lost the thread; starting a fresh one"
                );
                let thread = self.create_thread(&input.conversation_id, agent, cancel).await?;
                Ok(agent.stream(&input.message, &thread, cancel).await?)
            }
            other => Ok(other?),
        }
    }

    async fn resolve_thread(
        &self,
        conversation_id: &str,
        agent: &dyn ChatAgent,
        cancel: &CancellationToken,
    ) -> Result<ThreadHandle, TurnError> {
        if let Some(handle) = self.threads.get(&ThreadId::new(conversation_id)).await? {
            debug!(conversation = %conversation_id, "Resuming thread");
            return Ok(handle);
        }
        self.create_thread(conversation_id, agent, cancel).await
    }

    async fn create_thread(
        &self,
        conversation_id: &str,
        agent: &dyn ChatAgent,
        cancel: &CancellationToken,
    ) -> Result<ThreadHandle, TurnError> {
        let runtime_ref = agent.new_thread(cancel).await?;
        let handle = ThreadHandle::new(conversation_id, runtime_ref);
        self.threads.register(handle.clone()).await?;
        debug!(conversation = %conversation_id, "Created thread");
        Ok(handle)
    }

    fn conversation_lock(&self, conversation_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.conversations_guard()
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }

    /// Forget the turn lock once no turn holds or waits on it.
    fn release_conversation_lock(&self, conversation_id: &str) {
        let mut conversations = self.conversations_guard();
        if conversations
            .get(conversation_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            conversations.remove(conversation_id);
        }
    }

    fn conversations_guard(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn emit(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), TurnError> {
    events.send(event).await.map_err(|_| TurnError::Disconnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogParams;
    use crate::ports::risk_assessor::{AssessmentError, RiskAssessor};
    use crate::ports::tool_provider::{ProviderError, ToolServer};
    use crate::threads::ShardedThreadStore;
    use crate::use_cases::catalog_executor::CatalogExecutor;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use vaultpilot_domain::{
        RiskAssessment, SafetyPolicy, ToolArguments, ToolCall, ToolDescriptor, ToolOutcome,
        Verdict,
    };

    // ==================== Mocks ====================

    struct VaultServer {
        calls: Mutex<Vec<(String, ToolArguments)>>,
    }

    #[async_trait]
    impl ToolServer for VaultServer {
        fn id(&self) -> &str {
            "vault"
        }

        async fn list_tools(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ToolDescriptor>, ProviderError> {
            Ok(vec![
                ToolDescriptor::new("read_note", "vault"),
                ToolDescriptor::new("delete_note", "vault"),
            ])
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: &ToolArguments,
            _cancel: &CancellationToken,
        ) -> Result<ToolOutcome, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            Ok(ToolOutcome::success(format!("{name} ok")))
        }
    }

    struct ApprovingCritic;

    #[async_trait]
    impl RiskAssessor for ApprovingCritic {
        async fn assess(
            &self,
            _operation_description: &str,
            _cancel: &CancellationToken,
        ) -> Result<RiskAssessment, AssessmentError> {
            Ok(RiskAssessment::new(Verdict::Caution, "cannot be undone"))
        }
    }

    /// Never answers, even when the turn is cancelled.
    #[derive(Default)]
    struct HangingCritic {
        started: tokio::sync::Notify,
    }

    #[async_trait]
    impl RiskAssessor for HangingCritic {
        async fn assess(
            &self,
            _operation_description: &str,
            _cancel: &CancellationToken,
        ) -> Result<RiskAssessment, AssessmentError> {
            self.started.notify_one();
            std::future::pending().await
        }
    }

    #[derive(Clone)]
    enum Step {
        Text(&'static str),
        Call(ToolCall),
        Fail(&'static str),
        Sleep(Duration),
        Hang,
    }

    #[derive(Default)]
    struct Counters {
        threads_created: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        known_threads: Mutex<HashSet<String>>,
    }

    struct ScriptedRuntime {
        script: Vec<Step>,
        panic_on_stream: bool,
        counters: Arc<Counters>,
    }

    impl ScriptedRuntime {
        fn new(script: Vec<Step>) -> Self {
            Self {
                script,
                panic_on_stream: false,
                counters: Arc::new(Counters::default()),
            }
        }
    }

    #[async_trait]
    impl AgentRuntime for ScriptedRuntime {
        async fn create_agent(&self, spec: AgentSpec) -> Result<Box<dyn ChatAgent>, AgentError> {
            Ok(Box::new(ScriptedAgent {
                spec,
                script: self.script.clone(),
                panic_on_stream: self.panic_on_stream,
                counters: self.counters.clone(),
            }))
        }
    }

    struct ScriptedAgent {
        spec: AgentSpec,
        script: Vec<Step>,
        panic_on_stream: bool,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl ChatAgent for ScriptedAgent {
        async fn new_thread(&self, _cancel: &CancellationToken) -> Result<String, AgentError> {
            let n = self.counters.threads_created.fetch_add(1, Ordering::SeqCst);
            let runtime_ref = format!("rt-{n}");
            self.counters
                .known_threads
                .lock()
                .unwrap()
                .insert(runtime_ref.clone());
            Ok(runtime_ref)
        }

        async fn stream(
            &self,
            _message: &str,
            thread: &ThreadHandle,
            cancel: &CancellationToken,
        ) -> Result<AgentStream, AgentError> {
            if self.panic_on_stream {
                panic!("runtime exploded");
            }
            if !self
                .counters
                .known_threads
                .lock()
                .unwrap()
                .contains(&thread.runtime_ref)
            {
                return Err(AgentError::UnknownThread(thread.runtime_ref.clone()));
            }

            let (tx, rx) = mpsc::channel(8);
            let script = self.script.clone();
            let executor = self.spec.executor.clone();
            let counters = self.counters.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let now = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
                counters.max_active.fetch_max(now, Ordering::SeqCst);
                for step in script {
                    match step {
                        Step::Text(t) => {
                            let _ = tx.send(AgentUnit::Text(t.to_string())).await;
                        }
                        Step::Call(call) => {
                            let _ = tx.send(AgentUnit::ToolCallRequested(call.clone())).await;
                            let result = executor.execute(&call, &cancel).await;
                            let _ = tx.send(AgentUnit::ToolResult(result)).await;
                        }
                        Step::Fail(message) => {
                            let _ = tx.send(AgentUnit::Error(message.to_string())).await;
                            break;
                        }
                        Step::Sleep(d) => tokio::time::sleep(d).await,
                        Step::Hang => std::future::pending::<()>().await,
                    }
                }
                counters.active.fetch_sub(1, Ordering::SeqCst);
            });
            Ok(AgentStream::new(rx))
        }
    }

    // ==================== Fixture ====================

    struct Fixture {
        orchestrator: Arc<TurnOrchestrator>,
        server: Arc<VaultServer>,
        counters: Arc<Counters>,
        threads: Arc<ShardedThreadStore>,
    }

    fn fixture(runtime: ScriptedRuntime, params: TurnParams) -> Fixture {
        fixture_with_critic(runtime, params, Arc::new(ApprovingCritic))
    }

    fn fixture_with_critic(
        runtime: ScriptedRuntime,
        params: TurnParams,
        critic: Arc<dyn RiskAssessor>,
    ) -> Fixture {
        let server = Arc::new(VaultServer {
            calls: Mutex::new(Vec::new()),
        });
        let catalog = Arc::new(ToolCatalog::new(
            vec![server.clone() as Arc<dyn ToolServer>],
            CatalogParams::default(),
        ));
        let gate = Arc::new(SafetyGate::new(
            SafetyPolicy::new(["delete_note"]),
            critic,
            Duration::from_secs(60),
        ));
        let threads = Arc::new(ShardedThreadStore::new());
        let counters = runtime.counters.clone();
        let orchestrator = Arc::new(TurnOrchestrator::new(
            catalog.clone(),
            threads.clone(),
            Arc::new(runtime),
            gate,
            Arc::new(CatalogExecutor::new(catalog)),
            params,
        ));
        Fixture {
            orchestrator,
            server,
            counters,
            threads,
        }
    }

    fn kinds(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(StreamEvent::kind).collect()
    }

    fn assert_single_terminal(events: &[StreamEvent]) {
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1, "events: {:?}", kinds(events));
        assert!(events.last().unwrap().is_terminal());
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_text_turn_is_ordered_and_done() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("Hello"), Step::Text(", world")]),
            TurnParams::default(),
        );

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(kinds(&events), vec!["metadata", "text", "text", "done"]);
        match &events[0] {
            StreamEvent::Metadata(meta) => {
                assert_eq!(meta.conversation_id, "conv-1");
                assert_eq!(meta.tool_count, 2);
                assert_eq!(meta.servers[0].count, 2);
            }
            other => panic!("expected metadata, got {other:?}"),
        }
        assert_eq!(events[1], StreamEvent::Text("Hello".into()));
    }

    #[tokio::test]
    async fn test_delete_request_yields_pending_card_then_confirm_executes() {
        let delete = ToolCall::new("delete_note")
            .with_id("call_1")
            .with_arg("path", "notes/todo.md");
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Call(delete), Step::Text("Please confirm.")]),
            TurnParams::default(),
        );

        let events = fx
            .orchestrator
            .run_turn(
                RunTurnInput::new("conv-1", "delete notes/todo.md"),
                CancellationToken::new(),
            )
            .collect()
            .await;

        assert_eq!(
            kinds(&events),
            vec![
                "metadata",
                "tool_call_requested",
                "tool_result",
                "action_card",
                "text",
                "done"
            ]
        );
        assert!(fx.server.calls.lock().unwrap().is_empty());

        let card = match &events[3] {
            StreamEvent::ActionCard(card) => card.clone(),
            other => panic!("expected action card, got {other:?}"),
        };
        assert_eq!(card.status, ActionStatus::Pending);
        assert_eq!(card.operations.len(), 1);
        match events.last().unwrap() {
            StreamEvent::Done(summary) => {
                assert_eq!(summary.tool_calls, 1);
                assert_eq!(summary.pending_actions, vec![card.id.to_string()]);
            }
            other => panic!("expected done, got {other:?}"),
        }

        let result = fx
            .orchestrator
            .confirm(&card.id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.action_card.unwrap().status, ActionStatus::Completed);

        let calls = fx.server.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "delete_note");
        assert_eq!(calls[0].1["path"], "notes/todo.md");
    }

    #[tokio::test]
    async fn test_non_destructive_call_runs_immediately() {
        let read = ToolCall::new("read_note").with_arg("path", "a.md");
        let fx = fixture(ScriptedRuntime::new(vec![Step::Call(read)]), TurnParams::default());

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "read a"), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(
            kinds(&events),
            vec!["metadata", "tool_call_requested", "tool_result", "done"]
        );
        assert_eq!(fx.server.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_emits_single_error() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("partial"), Step::Fail("model overloaded")]),
            TurnParams::default(),
        );

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        assert_single_terminal(&events);
        match events.last().unwrap() {
            StreamEvent::Error(failure) => {
                assert!(failure.message.contains("model overloaded"));
                assert!(!failure.cancelled);
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_mid_stream_emits_single_error() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("thinking"), Step::Hang]),
            TurnParams::default(),
        );
        let cancel = CancellationToken::new();
        let mut stream = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), cancel.clone());

        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            if matches!(event, StreamEvent::Text(_)) {
                cancel.cancel();
            }
            events.push(event);
        }

        assert_single_terminal(&events);
        match events.last().unwrap() {
            StreamEvent::Error(failure) => assert!(failure.cancelled),
            other => panic!("expected cancelled error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_while_critic_hangs_leaves_nothing_pending() {
        let critic = Arc::new(HangingCritic::default());
        let delete = ToolCall::new("delete_note").with_arg("path", "notes/todo.md");
        let fx = fixture_with_critic(
            ScriptedRuntime::new(vec![Step::Call(delete)]),
            TurnParams::default(),
            critic.clone(),
        );
        let cancel = CancellationToken::new();
        let mut stream = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "delete todo"), cancel.clone());

        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            if matches!(event, StreamEvent::ToolCallRequested(_)) {
                critic.started.notified().await;
                cancel.cancel();
            }
            events.push(event);
        }

        assert_eq!(
            kinds(&events),
            vec!["metadata", "tool_call_requested", "error"]
        );
        match events.last().unwrap() {
            StreamEvent::Error(failure) => assert!(failure.cancelled),
            other => panic!("expected cancelled error, got {other:?}"),
        }
        assert!(fx.orchestrator.gate().pending_keys().is_empty());
        assert!(fx.server.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_timeout_emits_error() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Hang]),
            TurnParams {
                completion_timeout: Duration::from_millis(50),
                ..TurnParams::default()
            },
        );

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        assert_single_terminal(&events);
        match events.last().unwrap() {
            StreamEvent::Error(failure) => {
                assert!(failure.message.contains("timed out"));
                assert!(!failure.cancelled);
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panicking_runtime_still_terminates_stream() {
        let mut runtime = ScriptedRuntime::new(vec![Step::Text("never")]);
        runtime.panic_on_stream = true;
        let fx = fixture(runtime, TurnParams::default());

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), StreamEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_thread_is_reused_across_turns() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("ok")]),
            TurnParams::default(),
        );

        for _ in 0..3 {
            fx.orchestrator
                .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
                .collect()
                .await;
        }

        assert_eq!(fx.counters.threads_created.load(Ordering::SeqCst), 1);
        assert_eq!(fx.threads.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_runtime_thread_is_recreated() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("ok")]),
            TurnParams::default(),
        );
        fx.threads
            .register(ThreadHandle::new("conv-1", "lost-after-restart"))
            .await
            .unwrap();

        let events = fx
            .orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(kinds(&events), vec!["metadata", "text", "done"]);
        let handle = fx.threads.get(&ThreadId::new("conv-1")).await.unwrap().unwrap();
        assert_eq!(handle.runtime_ref, "rt-0");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_turns_on_one_conversation_are_serialized() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Sleep(Duration::from_millis(20)), Step::Text("ok")]),
            TurnParams::default(),
        );

        let turns: Vec<_> = (0..4)
            .map(|_| {
                fx.orchestrator
                    .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            })
            .collect();
        for turn in turns {
            let events = turn.collect().await;
            assert!(matches!(events.last().unwrap(), StreamEvent::Done(_)));
        }

        assert_eq!(fx.counters.max_active.load(Ordering::SeqCst), 1);
        assert!(fx.orchestrator.conversations_guard().is_empty());
    }

    #[tokio::test]
    async fn test_idle_conversation_locks_are_released() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("ok")]),
            TurnParams::default(),
        );

        for n in 0..50 {
            let events = fx
                .orchestrator
                .run_turn(
                    RunTurnInput::new(format!("conv-{n}"), "hi"),
                    CancellationToken::new(),
                )
                .collect()
                .await;
            assert!(matches!(events.last().unwrap(), StreamEvent::Done(_)));
        }

        assert!(fx.orchestrator.conversations_guard().is_empty());
        assert_eq!(fx.threads.len(), 50);
    }

    #[tokio::test]
    async fn test_reset_clears_registries() {
        let fx = fixture(
            ScriptedRuntime::new(vec![Step::Text("ok")]),
            TurnParams::default(),
        );
        fx.orchestrator
            .run_turn(RunTurnInput::new("conv-1", "hi"), CancellationToken::new())
            .collect()
            .await;

        fx.orchestrator.reset().await.unwrap();

        assert!(fx.threads.is_empty());
        assert!(fx.orchestrator.catalog().last_snapshot().is_none());
    }
}
