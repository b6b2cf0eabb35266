//! Transaction lifecycle tracking for a ledger client.
//!
//! Drives one intent through build, confirmation, signing, finalization,
//! submission and status polling, publishing a typed event for every stage
//! and resolving a completion handle exactly once.

pub mod client;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod signer;
pub mod tracking;

pub use client::LedgerClient;
pub use config::schema::TrackerConfig;
pub use lifecycle::Shutdown;
pub use tracking::{MakeTransactionOptions, Tracker, TrackingError, TrackingEvent, TransactionTracking};
