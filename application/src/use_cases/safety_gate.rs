//! Safety gate: confirmation workflow for destructive tool calls.
//!
//! ```text
//! intercept ──> destructive? ──no──> next.execute (pass-through)
//!                   │ yes
//!                   ▼
//!      canonicalize path ──> plan operations ──> critic assessment
//!                   │                                 │ failed + fail-closed
//!                   ▼                                 └──> GateError::AssessmentFailed
//!      ActionCard(Pending) + PendingInvocation[key]
//!                   │
//!       ┌───────────┴───────────┐
//!       ▼                       ▼
//!   confirm(key)           cancel(key)
//!   remove + execute       remove, card Cancelled
//!   card Completed|Failed
//! ```
//!
//! A key resolves at most once: confirm and cancel both start with an
//! atomic remove from the pending map, so a racing second caller sees
//! [`GateError::InvocationNotFound`]. Expired invocations are swept lazily
//! whenever the map is touched, and resolved cards are dropped once they
//! are older than the card retention window.
//!
//! Execution after confirm runs on its own task, so a caller that stops
//! waiting never leaves a card stuck in `Confirmed`.

use crate::ports::risk_assessor::{AssessmentError, RiskAssessor};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::path_resolver::PathResolver;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vaultpilot_domain::safety::operation::primary_path_argument;
use vaultpilot_domain::{
    ActionCard, CriticFailureMode, DomainError, PendingInvocation, ReflectionKey, RiskAssessment,
    SafetyPolicy, ToolCall, ToolInvocationResult, ToolOutcome, describe_operations,
    plan_operations,
};

/// Result stored on a card whose invocation expired unconfirmed.
const EXPIRED_RESULT: &str = "Expired before confirmation";

/// Result stored on a card whose execution task died before reporting.
const INTERRUPTED_RESULT: &str = "interrupted";

/// How long resolved cards stay available to [`SafetyGate::card`].
pub const DEFAULT_CARD_RETENTION: Duration = Duration::from_secs(60 * 60);

type CardMap = Mutex<HashMap<ReflectionKey, ActionCard>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The critic could not assess a destructive call and the tool is
    /// configured to fail closed.
    #[error("Safety assessment failed for '{tool}': {source}")]
    AssessmentFailed {
        tool: String,
        #[source]
        source: AssessmentError,
    },

    /// Unknown, already resolved or expired reflection key.
    #[error("No pending action for key {0} (already handled or expired)")]
    InvocationNotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The confirmed execution stopped without producing a result.
    #[error("Execution of {0} was interrupted")]
    ExecutionInterrupted(String),

    #[error("Cancelled")]
    Cancelled,
}

impl GateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GateError::Cancelled)
    }

    /// Whether this is the non-fatal "already handled" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GateError::InvocationNotFound(_))
    }
}

struct PendingEntry {
    invocation: PendingInvocation,
    executor: Arc<dyn ToolExecutorPort>,
}

pub struct SafetyGate {
    policy: SafetyPolicy,
    assessor: Arc<dyn RiskAssessor>,
    resolver: Option<Arc<PathResolver>>,
    pending_ttl: Duration,
    card_retention: Duration,
    pending: Mutex<HashMap<ReflectionKey, PendingEntry>>,
    cards: Arc<CardMap>,
}

impl SafetyGate {
    pub fn new(policy: SafetyPolicy, assessor: Arc<dyn RiskAssessor>, pending_ttl: Duration) -> Self {
        Self {
            policy,
            assessor,
            resolver: None,
            pending_ttl,
            card_retention: DEFAULT_CARD_RETENTION,
            pending: Mutex::new(HashMap::new()),
            cards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Keep resolved cards for `retention` after they reach a final state.
    pub fn with_card_retention(mut self, retention: Duration) -> Self {
        self.card_retention = retention;
        self
    }

    /// Canonicalize path arguments of destructive calls through `resolver`.
    pub fn with_path_resolver(mut self, resolver: Arc<PathResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Gate one tool call.
    ///
    /// Non-destructive calls go straight to `next`. Destructive calls are
    /// deferred: the returned result carries a pending [`ActionCard`] and
    /// `next` is only invoked by a later [`confirm`](Self::confirm).
    pub async fn intercept(
        &self,
        call: &ToolCall,
        next: Arc<dyn ToolExecutorPort>,
        cancel: &CancellationToken,
    ) -> Result<ToolInvocationResult, GateError> {
        if !self.policy.is_destructive(&call.name) {
            debug!(tool = %call.name, "Pass-through tool call");
            return Ok(next.execute(call, cancel).await);
        }

        let call = self.canonicalize(call, cancel).await;
        let operations = plan_operations(&call);
        let description = describe_operations(&operations);
        let assessment = self.assess(&call.name, &description, cancel).await?;

        let key = ReflectionKey::generate();
        let card = ActionCard::pending(key.clone(), call.name.clone(), operations, assessment);

        self.sweep_expired();
        self.cards_guard().insert(key.clone(), card.clone());
        self.pending_guard().insert(
            key.clone(),
            PendingEntry {
                invocation: PendingInvocation::new(key.clone(), &call, self.pending_ttl),
                executor: next,
            },
        );
        info!(tool = %call.name, key = %key, "Destructive call deferred pending confirmation");

        let notice = format!(
            "Confirmation required: {}. Action card {} is pending; the operation has NOT been \
             executed. The user must confirm or cancel it.",
            card.title, key
        );
        Ok(ToolInvocationResult::for_call(&call, ToolOutcome::success(notice)).with_action_card(card))
    }

    /// Execute a pending invocation exactly once.
    ///
    /// Returns the execution result with the final (`Completed` or
    /// `Failed`) card attached.
    pub async fn confirm(
        &self,
        key: &ReflectionKey,
        cancel: &CancellationToken,
    ) -> Result<ToolInvocationResult, GateError> {
        let entry = self.take(key)?;
        let card = self.update_card(key, ActionCard::confirm)?;
        info!(tool = %card.function_name, key = %key, "Action confirmed; executing");

        let execution = tokio::spawn(execute_confirmed(
            entry,
            key.clone(),
            Arc::clone(&self.cards),
            cancel.clone(),
        ));
        match execution.await {
            Ok(result) => result,
            Err(e) => {
                warn!(key = %key, error = %e, "Confirmed action task aborted");
                let _ = transition_card(&self.cards, key, |card| card.fail(INTERRUPTED_RESULT));
                Err(GateError::ExecutionInterrupted(key.to_string()))
            }
        }
    }

    /// Discard a pending invocation without executing it.
    pub fn cancel(&self, key: &ReflectionKey) -> Result<ActionCard, GateError> {
        self.take(key)?;
        let card = self.update_card(key, ActionCard::cancel)?;
        info!(tool = %card.function_name, key = %key, "Action cancelled");
        Ok(card)
    }

    /// Current state of a card, pending or resolved.
    pub fn card(&self, key: &ReflectionKey) -> Option<ActionCard> {
        self.sweep_expired();
        self.cards_guard().get(key).cloned()
    }

    /// Keys of every invocation still awaiting confirm or cancel.
    pub fn pending_keys(&self) -> Vec<ReflectionKey> {
        self.sweep_expired();
        self.pending_guard().keys().cloned().collect()
    }

    /// Number of cards currently held, pending or resolved.
    pub fn card_count(&self) -> usize {
        self.sweep_expired();
        self.cards_guard().len()
    }

    /// Drop all pending invocations and cards (shutdown or test reset).
    pub fn clear(&self) {
        self.pending_guard().clear();
        self.cards_guard().clear();
    }

    async fn canonicalize(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolCall {
        let Some(resolver) = &self.resolver else {
            return call.clone();
        };
        let Some((arg, raw)) = primary_path_argument(call) else {
            return call.clone();
        };

        let resolved = resolver.resolve(raw, cancel).await;
        if resolved != raw {
            debug!(tool = %call.name, from = %raw, to = %resolved, "Canonicalized path argument");
        }
        let mut canonical = call.clone();
        canonical
            .arguments
            .insert(arg.to_string(), Value::String(resolved));
        canonical
    }

    async fn assess(
        &self,
        tool: &str,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<RiskAssessment>, GateError> {
        match self.assessor.assess(description, cancel).await {
            Ok(assessment) => Ok(Some(assessment)),
            Err(AssessmentError::Cancelled) => Err(GateError::Cancelled),
            Err(e) => match self.policy.critic_failure_mode(tool) {
                CriticFailureMode::FailClosed => {
                    warn!(tool, error = %e, "Critic unavailable; blocking destructive call");
                    Err(GateError::AssessmentFailed {
                        tool: tool.to_string(),
                        source: e,
                    })
                }
                CriticFailureMode::ProceedToConfirmation => {
                    warn!(tool, error = %e, "Critic unavailable; proposing unassessed action");
                    Ok(None)
                }
            },
        }
    }

    /// Atomically remove a live pending invocation.
    fn take(&self, key: &ReflectionKey) -> Result<PendingEntry, GateError> {
        self.sweep_expired();
        let entry = self.pending_guard().remove(key);
        match entry {
            Some(entry) if !entry.invocation.is_expired() => Ok(entry),
            Some(_) => {
                self.expire_card(key);
                Err(GateError::InvocationNotFound(key.to_string()))
            }
            None => Err(GateError::InvocationNotFound(key.to_string())),
        }
    }

    fn update_card<F>(&self, key: &ReflectionKey, transition: F) -> Result<ActionCard, GateError>
    where
        F: FnOnce(&mut ActionCard) -> Result<(), DomainError>,
    {
        transition_card(&self.cards, key, transition)
    }

    fn sweep_expired(&self) {
        let now = Instant::now();
        let expired: Vec<ReflectionKey> = {
            let mut pending = self.pending_guard();
            let keys: Vec<ReflectionKey> = pending
                .iter()
                .filter(|(_, entry)| entry.invocation.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                pending.remove(key);
            }
            keys
        };
        for key in &expired {
            debug!(key = %key, "Pending action expired");
            self.expire_card(key);
        }

        let retention = self.card_retention;
        let mut cards = self.cards_guard();
        let before = cards.len();
        cards.retain(|_, card| !card.resolved_for(retention));
        if cards.len() < before {
            debug!(dropped = before - cards.len(), "Dropped resolved cards past retention");
        }
    }

    fn expire_card(&self, key: &ReflectionKey) {
        let mut cards = self.cards_guard();
        if let Some(card) = cards.get_mut(key) {
            if card.cancel().is_ok() {
                card.result = Some(EXPIRED_RESULT.to_string());
            }
        }
    }

    fn pending_guard(&self) -> std::sync::MutexGuard<'_, HashMap<ReflectionKey, PendingEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cards_guard(&self) -> std::sync::MutexGuard<'_, HashMap<ReflectionKey, ActionCard>> {
        lock_cards(&self.cards)
    }
}

/// Run a confirmed invocation and record its outcome on the card.
async fn execute_confirmed(
    entry: PendingEntry,
    key: ReflectionKey,
    cards: Arc<CardMap>,
    cancel: CancellationToken,
) -> Result<ToolInvocationResult, GateError> {
    let call = entry.invocation.to_call();
    let result = entry.executor.execute(&call, &cancel).await;

    let content = result.outcome.content.clone();
    let card = if result.is_success() {
        transition_card(&cards, &key, |card| card.complete(content))?
    } else {
        warn!(tool = %call.name, key = %key, error = %content, "Confirmed action failed");
        transition_card(&cards, &key, |card| card.fail(content))?
    };
    info!(key = %key, status = %card.status, "Action resolved");
    Ok(result.with_action_card(card))
}

fn transition_card<F>(cards: &CardMap, key: &ReflectionKey, transition: F) -> Result<ActionCard, GateError>
where
    F: FnOnce(&mut ActionCard) -> Result<(), DomainError>,
{
    let mut cards = lock_cards(cards);
    let card = cards
        .get_mut(key)
        .ok_or_else(|| GateError::InvocationNotFound(key.to_string()))?;
    transition(card)?;
    Ok(card.clone())
}

fn lock_cards(cards: &CardMap) -> std::sync::MutexGuard<'_, HashMap<ReflectionKey, ActionCard>> {
    cards.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Executor handed to the agent runtime: every call goes through the gate.
pub struct GatedExecutor {
    gate: Arc<SafetyGate>,
    next: Arc<dyn ToolExecutorPort>,
}

impl GatedExecutor {
    pub fn new(gate: Arc<SafetyGate>, next: Arc<dyn ToolExecutorPort>) -> Self {
        Self { gate, next }
    }
}

#[async_trait]
impl ToolExecutorPort for GatedExecutor {
    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolInvocationResult {
        match self.gate.intercept(call, self.next.clone(), cancel).await {
            Ok(result) => result,
            Err(e) => ToolInvocationResult::for_call(
                call,
                ToolOutcome::failure(format!("Blocked: {e}. The operation was not executed.")),
            ),
        }
    }
}
