//! The payment intent state machine.
//!
//! Nothing in here touches storage. Backends call [`decide_transition`] inside their reconcile transaction, after the
//! intent row has been locked, and act on the [`Transition`] it returns.
//!
//! ```text
//!   Pending ── approved ──────────────────────────────────► Completed
//!   Pending ── rejected, cancelled, refunded, charged_back ► Rejected
//!   Pending ── pending, in_process, anything else ────────► Pending
//! ```
//!
//! Completed and Rejected are terminal. Observations made against a terminal intent are recorded for audit and nothing
//! else happens.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::IntentStatus;

//--------------------------------------    ProcessorStatus    ---------------------------------------------------------
/// A payment status as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    /// Anything the processor reports that we do not have a mapping for (`authorized`, `in_mediation`, ...).
    Unrecognised(String),
}

impl ProcessorStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Unrecognised(status.trim().to_string()),
        }
    }

    /// The local status this processor status maps onto, or `None` if it is not recognised.
    pub fn target(&self) -> Option<IntentStatus> {
        match self {
            Self::Approved => Some(IntentStatus::Completed),
            Self::Pending | Self::InProcess => Some(IntentStatus::Pending),
            Self::Rejected | Self::Cancelled | Self::Refunded | Self::ChargedBack => Some(IntentStatus::Rejected),
            Self::Unrecognised(_) => None,
        }
    }
}

impl Display for ProcessorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Pending => write!(f, "pending"),
            Self::InProcess => write!(f, "in_process"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Refunded => write!(f, "refunded"),
            Self::ChargedBack => write!(f, "charged_back"),
            Self::Unrecognised(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------      Transition       ---------------------------------------------------------
/// The outcome of reconciling one processor observation against an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Pending → Completed. The completion side effects were applied.
    Completed,
    /// Pending → Rejected. The rejection side effects were applied.
    Rejected,
    /// The processor still considers the payment in flight.
    StillPending,
    /// The processor status has no local mapping. Only the audit fields were updated.
    Inconclusive,
    /// The intent had already reached the given terminal status. Nothing changed.
    AlreadyTerminal(IntentStatus),
}

impl Transition {
    /// True if this transition moved the intent into a terminal state, i.e. side effects were applied.
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// A short label for the audit trail and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::StillPending => "still_pending",
            Self::Inconclusive => "inconclusive",
            Self::AlreadyTerminal(_) => "already_terminal",
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyTerminal(s) => write!(f, "already_terminal ({s})"),
            t => f.write_str(t.label()),
        }
    }
}

/// Decide what happens to an intent currently in `current` when the processor reports `reported`.
pub fn decide_transition(current: IntentStatus, reported: &ProcessorStatus) -> Transition {
    let Some(target) = reported.target() else {
        return Transition::Inconclusive;
    };
    if current.is_terminal() {
        return Transition::AlreadyTerminal(current);
    }
    match target {
        IntentStatus::Completed => Transition::Completed,
        IntentStatus::Rejected => Transition::Rejected,
        IntentStatus::Pending => Transition::StillPending,
    }
}
