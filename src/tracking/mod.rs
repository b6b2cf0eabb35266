//! Transaction lifecycle tracking.
//!
//! # Data Flow
//! ```text
//! intent producer
//!     → gateway.build            BUILT_FROM_INTENT
//!     → confirmation gate        ASKED_FOR_CONFIRMATION, CONFIRMED
//!     → signer                   SIGNED
//!     → gateway.finalize         FINALIZED (transaction id assigned)
//!     → gateway.submit           SUBMITTED
//!     → status poller            UPDATE_OF_STATUS_OF_PENDING_TX*
//!     → completion               COMPLETED | ERROR
//! ```
//!
//! # Design Decisions
//! - One spawned task and one event channel per pipeline, nothing shared between pipelines
//! - The only suspension points are remote calls and manual confirmation
//! - Only status lookups are retried, and only while the transaction is not yet indexed

pub mod confirmation;
pub mod error;
pub mod events;
pub mod poller;
pub mod tracker;

pub use confirmation::{ManualConfirmation, UserConfirmation};
pub use error::TrackingError;
pub use events::{EventKind, TrackingEvent, TrackingEvents};
pub use poller::PollTrigger;
pub use tracker::{
    Canceller, Completion, MakeTransactionOptions, PipelineId, Tracker, TrackerSettings,
    TransactionTracking,
};
