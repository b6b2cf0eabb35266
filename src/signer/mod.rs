//! Signer adapter.
//!
//! Signing keys live outside the tracker. The tracker only sequences the
//! call: it hands over the built transaction plus an optional hint with the name
//! of the single non-native resource the transaction moves, and receives a signature.

pub mod local;

use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::{BuiltTransaction, TransactionSignature};

pub use local::LocalKeySigner;

/// Errors raised while obtaining a signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// Invalid private key format or key loading failure.
    #[error("Key error: {0}")]
    Key(String),

    /// The signing backend refused or failed.
    #[error("Signing failed: {0}")]
    Failed(String),

    /// A transaction may reference at most one non-native resource.
    #[error("Cannot sign a transaction moving multiple non-native resources: {}", .0.join(", "))]
    MultipleNonNativeResources(Vec<String>),
}

/// External signing capability.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        built: &BuiltTransaction,
        resource_hint: Option<&str>,
    ) -> Result<TransactionSignature, SignerError>;
}
