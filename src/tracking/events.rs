//! Lifecycle events and the per-pipeline channel that carries them.
//!
//! Kinds are totally ordered. Within one pipeline every emitted kind is
//! strictly greater than the previous one, except for repeated
//! `UPDATE_OF_STATUS_OF_PENDING_TX`, and the stream ends with at most one
//! terminal event (`COMPLETED` or `ERROR`).

use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::ledger::TransactionState;
use crate::observability::metrics;
use crate::tracking::error::TrackingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Initiated,
    BuiltFromIntent,
    AskedForConfirmation,
    Confirmed,
    Signed,
    Finalized,
    Submitted,
    UpdateOfStatusOfPendingTx,
    Completed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Initiated => "INITIATED",
            EventKind::BuiltFromIntent => "BUILT_FROM_INTENT",
            EventKind::AskedForConfirmation => "ASKED_FOR_CONFIRMATION",
            EventKind::Confirmed => "CONFIRMED",
            EventKind::Signed => "SIGNED",
            EventKind::Finalized => "FINALIZED",
            EventKind::Submitted => "SUBMITTED",
            EventKind::UpdateOfStatusOfPendingTx => "UPDATE_OF_STATUS_OF_PENDING_TX",
            EventKind::Completed => "COMPLETED",
        }
    }
}

impl EventKind {
    /// Stage in progress once `last` has been emitted.
    pub(crate) fn in_progress_after(last: Option<EventKind>) -> EventKind {
        match last {
            None => EventKind::Initiated,
            Some(EventKind::Initiated) => EventKind::BuiltFromIntent,
            Some(EventKind::BuiltFromIntent) => EventKind::AskedForConfirmation,
            Some(EventKind::AskedForConfirmation) => EventKind::Confirmed,
            Some(EventKind::Confirmed) => EventKind::Signed,
            Some(EventKind::Signed) => EventKind::Finalized,
            Some(EventKind::Finalized) => EventKind::Submitted,
            Some(EventKind::Submitted) | Some(EventKind::UpdateOfStatusOfPendingTx) => {
                EventKind::UpdateOfStatusOfPendingTx
            }
            Some(EventKind::Completed) => EventKind::Completed,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the event trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingEvent {
    /// Stage transition with a snapshot of the transaction.
    Update {
        kind: EventKind,
        state: TransactionState,
    },
    /// Terminal failure of the stage `stage`.
    Error {
        stage: EventKind,
        error: TrackingError,
    },
}

impl TrackingEvent {
    /// `COMPLETED` or `ERROR`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackingEvent::Update {
                kind: EventKind::Completed,
                ..
            } | TrackingEvent::Error { .. }
        )
    }

    /// Kind of an update, or the failing stage of an error.
    pub fn kind(&self) -> EventKind {
        match self {
            TrackingEvent::Update { kind, .. } => *kind,
            TrackingEvent::Error { stage, .. } => *stage,
        }
    }
}

impl fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingEvent::Update {
                kind: EventKind::UpdateOfStatusOfPendingTx,
                state: TransactionState::Status(status),
            } => write!(f, "{}({})", EventKind::UpdateOfStatusOfPendingTx, status.status),
            TrackingEvent::Update { kind, state } => match state.tx_id() {
                Some(tx_id) => write!(f, "{}({})", kind, tx_id),
                None => write!(f, "{}", kind),
            },
            TrackingEvent::Error { stage, error } => write!(f, "ERROR(stage={}): {}", stage, error),
        }
    }
}

/// Receiving side of a pipeline's event trail.
///
/// Yields `None` once the pipeline has finished and every event was read.
#[derive(Debug)]
pub struct TrackingEvents {
    rx: mpsc::UnboundedReceiver<TrackingEvent>,
}

impl TrackingEvents {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<TrackingEvent>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<TrackingEvent> {
        self.rx.recv().await
    }

    /// Drain the trail until the pipeline ends.
    pub async fn collect(mut self) -> Vec<TrackingEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for TrackingEvents {
    type Item = TrackingEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Sending side, owned by the pipeline task.
#[derive(Debug)]
pub(crate) struct EventLog {
    tx: mpsc::UnboundedSender<TrackingEvent>,
    last: Option<EventKind>,
    terminated: bool,
}

impl EventLog {
    pub(crate) fn new(tx: mpsc::UnboundedSender<TrackingEvent>) -> Self {
        Self {
            tx,
            last: None,
            terminated: false,
        }
    }

    /// A second handle on the channel, used to notice the receiver going away.
    pub(crate) fn watcher(&self) -> mpsc::UnboundedSender<TrackingEvent> {
        self.tx.clone()
    }

    /// Last update kind emitted so far.
    pub(crate) fn last(&self) -> Option<EventKind> {
        self.last
    }

    fn accepts(&self, kind: EventKind) -> bool {
        if self.terminated {
            return false;
        }
        match self.last {
            None => true,
            Some(EventKind::UpdateOfStatusOfPendingTx) => kind >= EventKind::UpdateOfStatusOfPendingTx,
            Some(last) => kind > last,
        }
    }

    pub(crate) fn emit(&mut self, kind: EventKind, state: TransactionState) {
        debug_assert!(self.accepts(kind), "{} emitted after {:?}", kind, self.last);

        tracing::debug!(event = %kind, tx_id = ?state.tx_id(), "Tracking event");
        metrics::record_event(kind.as_str());

        self.last = Some(kind);
        self.terminated = kind == EventKind::Completed;
        // A dropped receiver only means nobody is watching the trail.
        let _ = self.tx.send(TrackingEvent::Update { kind, state });
    }

    pub(crate) fn fail(&mut self, error: TrackingError) {
        debug_assert!(!self.terminated, "ERROR emitted after terminal event");

        let stage = error.stage();
        tracing::warn!(stage = %stage, error = %error, "Pipeline failed");
        metrics::record_event("ERROR");

        self.terminated = true;
        let _ = self.tx.send(TrackingEvent::Error { stage, error });
    }
}
