//! Ledger service gateway.
//!
//! One method per remote operation, each returning exactly one result or one
//! classified [`GatewayError`]. Implementations never retry; every call is a
//! single independent request, and concurrent callers are not de-duplicated.
//!
//! # Implementations
//! - `http.rs`: JSON over HTTP against a running ledger service
//! - `memory.rs`: deterministic in-process simulation

pub mod error;
pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use std::time::Instant;

use crate::ledger::{
    BuiltTransaction, FinalizedTransaction, PendingTransaction, SignedTransaction,
    StatusOfTransaction, TransactionId, TransactionIntent,
};
use crate::observability::metrics;

pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;
pub use memory::InMemoryLedger;

/// Remote operations consumed by the tracker.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn build(&self, intent: &TransactionIntent) -> GatewayResult<BuiltTransaction>;

    async fn finalize(&self, signed: &SignedTransaction) -> GatewayResult<FinalizedTransaction>;

    async fn submit(&self, finalized: &FinalizedTransaction) -> GatewayResult<PendingTransaction>;

    async fn status(&self, tx_id: TransactionId) -> GatewayResult<StatusOfTransaction>;
}

/// Record latency and outcome of one gateway call.
pub(crate) fn observe<T>(operation: &'static str, started: Instant, result: &GatewayResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_gateway_call(operation, outcome, started);
}
