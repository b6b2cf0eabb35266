//! Ledger domain model.
//!
//! # Data Flow
//! ```text
//! IntentBuilder (transfer / stake / unstake inputs)
//!     → TransactionIntent
//!     → BuiltTransaction      (ledger service)
//!     → SignedTransaction     (signer)
//!     → FinalizedTransaction  (ledger service assigns TransactionId)
//!     → PendingTransaction    (ledger service accepted submission)
//!     → StatusOfTransaction   (polled until CONFIRMED or FAILED)
//! ```

pub mod intent;
pub mod types;

pub use intent::{
    IntendedAction, IntentBuilder, IntentError, StakeTokensInput, TransactionIntent,
    TransferTokensInput, UnstakeTokensInput,
};
pub use types::{
    AccountAddress, Amount, BuiltTransaction, FinalizedTransaction, PendingTransaction,
    ResourceId, SignedTransaction, StatusOfTransaction, TransactionId, TransactionSignature,
    TransactionState, TransactionStatus, ValidatorAddress,
};
