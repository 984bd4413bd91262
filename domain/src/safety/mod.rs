//! Safety domain module
//!
//! Everything the safety gate needs to reason about a destructive call
//! without doing any I/O:
//!
//! - [`policy::SafetyPolicy`]: which tools are destructive, and how to
//!   behave when the critic is unavailable
//! - [`operation`]: planned operations and their descriptions
//! - [`assessment`]: critic verdicts and response parsing
//! - [`pending::PendingInvocation`] / [`pending::ReflectionKey`]: deferred calls
//! - [`action_card::ActionCard`]: the user-facing confirm/cancel artifact
//!
//! # Flow
//!
//! ```text
//! ToolCall ─▶ SafetyPolicy::is_destructive?
//!               │ no  ─▶ execute
//!               │ yes ─▶ plan_operations ─▶ critic ─▶ ActionCard(Pending)
//!                                                     + PendingInvocation
//! Confirm(key) ─▶ Confirmed ─▶ execute ─▶ Completed | Failed
//! Cancel(key)  ─▶ Cancelled
//! ```

pub mod action_card;
pub mod assessment;
pub mod operation;
pub mod pending;
pub mod policy;

pub use action_card::{ActionCard, ActionStatus};
pub use assessment::{RiskAssessment, Verdict, parse_assessment};
pub use operation::{OperationKind, PlannedOperation, describe_operations, plan_operations};
pub use pending::{PendingInvocation, ReflectionKey};
pub use policy::{CriticFailureMode, SafetyPolicy};
