//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Tracker, poller and gateways produce:
//!     → logging.rs (structured log events, one span per pipeline)
//!     → metrics.rs (counters and histograms through the `metrics` facade)
//!
//! Consumers:
//!     → stdout (pretty for terminals, JSON for log shippers)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every pipeline carries its own UUID in a tracing span
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
