//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Status lookup for a pending transaction:
//!     → retries.rs (retry while the error is "not yet indexed", bounded attempts,
//!       exponential delay with jitter between attempts)
//! ```
//!
//! Build, finalize and submit are never retried; only the status poller uses this module.

pub mod retries;

pub use retries::{retry_bounded, RetryPolicy};
