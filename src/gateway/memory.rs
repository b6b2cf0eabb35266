//! Deterministic in-process ledger service.
//!
//! Used by the CLI's `--simulate` mode and by tests. The status store is owned
//! by each instance; clones share it, separate instances never do.

use alloy::primitives::{keccak256, Bytes, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::{observe, LedgerGateway};
use crate::ledger::{
    Amount, BuiltTransaction, FinalizedTransaction, PendingTransaction, SignedTransaction,
    StatusOfTransaction, TransactionId, TransactionIntent, TransactionStatus,
};

/// Simulated ledger service.
#[derive(Clone)]
pub struct InMemoryLedger {
    fee: Amount,
    /// Number of status lookups answered with `PENDING` before `CONFIRMED`.
    pending_lookups: u32,
    /// Status lookups served so far, per submitted transaction.
    lookups: Arc<DashMap<TransactionId, u32>>,
}

impl InMemoryLedger {
    pub fn new(fee: Amount, pending_lookups: u32) -> Self {
        Self {
            fee,
            pending_lookups,
            lookups: Arc::new(DashMap::new()),
        }
    }

    /// Number of transactions submitted to this instance.
    pub fn submitted_count(&self) -> usize {
        self.lookups.len()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(U256::from(1), 2)
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn build(&self, intent: &TransactionIntent) -> GatewayResult<BuiltTransaction> {
        let started = Instant::now();
        let result = serde_json::to_vec(intent)
            .map_err(|e| GatewayError::Decode(format!("Unencodable intent: {}", e)))
            .map(|encoded| {
                let blob = Bytes::from(encoded);
                BuiltTransaction {
                    payload_to_sign: keccak256(&blob),
                    blob,
                    fee: self.fee,
                }
            });
        observe("build", started, &result);
        result
    }

    async fn finalize(&self, signed: &SignedTransaction) -> GatewayResult<FinalizedTransaction> {
        let started = Instant::now();
        let mut blob = signed.built.blob.to_vec();
        blob.extend_from_slice(&signed.signature.bytes);
        blob.extend_from_slice(&signed.signature.public_key);
        let result = Ok(FinalizedTransaction {
            tx_id: TransactionId(keccak256(&blob)),
            blob: Bytes::from(blob),
        });
        observe("finalize", started, &result);
        result
    }

    async fn submit(&self, finalized: &FinalizedTransaction) -> GatewayResult<PendingTransaction> {
        let started = Instant::now();
        let result = if TransactionId(keccak256(&finalized.blob)) != finalized.tx_id {
            Err(GatewayError::Rejected {
                status: 400,
                message: format!("Blob does not hash to {}", finalized.tx_id),
            })
        } else {
            self.lookups.entry(finalized.tx_id).or_insert(0);
            Ok(PendingTransaction {
                tx_id: finalized.tx_id,
            })
        };
        observe("submit", started, &result);
        result
    }

    async fn status(&self, tx_id: TransactionId) -> GatewayResult<StatusOfTransaction> {
        let started = Instant::now();
        let result = match self.lookups.get_mut(&tx_id) {
            Some(mut served) => {
                *served += 1;
                let status = if *served <= self.pending_lookups {
                    TransactionStatus::Pending
                } else {
                    TransactionStatus::Confirmed
                };
                Ok(StatusOfTransaction { tx_id, status })
            }
            None => Err(GatewayError::NotFound(format!("Transaction {} is unknown", tx_id))),
        };
        observe("status", started, &result);
        result
    }
}
