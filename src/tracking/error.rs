//! Failure of a tracking pipeline, tagged with the stage that failed.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::ledger::{IntentError, TransactionId};
use crate::signer::SignerError;
use crate::tracking::events::EventKind;

/// Why a pipeline did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackingError {
    #[error("Failed to prepare intent: {0}")]
    Intent(#[from] IntentError),

    #[error("Failed to build transaction: {0}")]
    Build(GatewayError),

    /// The manual confirmation was dropped without being confirmed.
    #[error("Confirmation was withdrawn")]
    ConfirmationWithdrawn,

    #[error("Failed to sign transaction: {0}")]
    Signing(SignerError),

    #[error("Failed to finalize transaction: {0}")]
    Finalize(GatewayError),

    #[error("Failed to submit transaction: {0}")]
    Submit(GatewayError),

    #[error("Failed to look up transaction status: {0}")]
    StatusLookup(GatewayError),

    #[error("Ledger reported transaction {0} as FAILED")]
    LedgerReportedFailure(TransactionId),

    /// The poll trigger ended before the transaction settled.
    #[error("Polling of transaction {0} stopped before settlement")]
    PollTriggerExhausted(TransactionId),

    /// The pipeline task died without producing an outcome, e.g. a panic in
    /// the gateway or signer.
    #[error("Pipeline aborted during {stage}: {reason}")]
    Aborted { stage: EventKind, reason: String },

    /// Explicit or application-level cancellation.
    #[error("Pipeline cancelled")]
    Cancelled {
        /// Last stage reached before cancellation, if any.
        last: Option<EventKind>,
    },
}

impl TrackingError {
    /// Stage tag carried by the ERROR event.
    pub fn stage(&self) -> EventKind {
        match self {
            TrackingError::Intent(_) => EventKind::Initiated,
            TrackingError::Build(_) => EventKind::BuiltFromIntent,
            TrackingError::ConfirmationWithdrawn => EventKind::Confirmed,
            TrackingError::Signing(_) => EventKind::Signed,
            TrackingError::Finalize(_) => EventKind::Finalized,
            TrackingError::Submit(_) => EventKind::Submitted,
            TrackingError::StatusLookup(_)
            | TrackingError::LedgerReportedFailure(_)
            | TrackingError::PollTriggerExhausted(_) => EventKind::UpdateOfStatusOfPendingTx,
            TrackingError::Aborted { stage, .. } => *stage,
            TrackingError::Cancelled { last } => last.unwrap_or(EventKind::Initiated),
        }
    }

    /// Underlying gateway failure, if the error came from the ledger service.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            TrackingError::Build(e)
            | TrackingError::Finalize(e)
            | TrackingError::Submit(e)
            | TrackingError::StatusLookup(e) => Some(e),
            _ => None,
        }
    }
}
