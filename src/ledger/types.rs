//! Ledger data model shared by the gateway, signer and tracker.

use alloy::primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::intent::TransactionIntent;

/// Token amount in the smallest denomination.
pub type Amount = U256;

/// Transaction identifier, a 32 byte hash assigned at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub B256);

impl From<B256> for TransactionId {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

impl From<TransactionId> for B256 {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account address, kept in its textual encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAddress(pub String);

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Validator address, kept in its textual encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorAddress(pub String);

impl fmt::Display for ValidatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Resource (token) identifier such as `xrd_rr1qy5wfsfh`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Short name of the resource: everything before the first `_`.
    pub fn name(&self) -> &str {
        self.0.split('_').next().unwrap_or_default()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transaction built by the ledger service from an intent, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    /// Opaque unsigned transaction blob.
    pub blob: Bytes,
    /// Digest the signer must sign.
    pub payload_to_sign: B256,
    /// Fee estimate charged by the network.
    pub fee: Amount,
}

/// Signature produced by a [`Signer`](crate::signer::Signer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub bytes: Bytes,
    /// Public key of the signer, compressed SEC1 encoding.
    pub public_key: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub built: BuiltTransaction,
    pub signature: TransactionSignature,
}

/// Transaction with its permanent identifier, ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    pub tx_id: TransactionId,
    pub blob: Bytes,
}

/// Transaction accepted by the network but not yet settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_id: TransactionId,
}

/// Lifecycle status reported by the ledger service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    /// Settlement reached: no further status changes are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Confirmed | TransactionStatus::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Confirmed => write!(f, "CONFIRMED"),
            TransactionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOfTransaction {
    pub tx_id: TransactionId,
    pub status: TransactionStatus,
}

/// Snapshot of the transaction carried by a tracking event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    Intent(TransactionIntent),
    Built(BuiltTransaction),
    Signed(SignedTransaction),
    Finalized(FinalizedTransaction),
    Pending(PendingTransaction),
    Status(StatusOfTransaction),
}

impl TransactionState {
    /// Identifier of the transaction, once one has been assigned.
    pub fn tx_id(&self) -> Option<TransactionId> {
        match self {
            TransactionState::Finalized(f) => Some(f.tx_id),
            TransactionState::Pending(p) => Some(p.tx_id),
            TransactionState::Status(s) => Some(s.tx_id),
            _ => None,
        }
    }
}
