//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl-C / embedding application
//!     → Shutdown::trigger()
//!     → every pipeline subscribed through MakeTransactionOptions::cancel_on
//!     → completion resolves to TrackingError::Cancelled
//! ```
//!
//! # Design Decisions
//! - Cancellation stops local work only; a submitted transaction stays submitted
//! - One coordinator can cancel any number of pipelines

pub mod shutdown;

pub use shutdown::Shutdown;
