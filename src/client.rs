//! High-level entry points: one call, one tracked transaction.

use std::future::Future;

use crate::ledger::{
    AccountAddress, IntentBuilder, IntentError, ResourceId, StakeTokensInput, TransactionIntent,
    TransferTokensInput, UnstakeTokensInput,
};
use crate::tracking::{MakeTransactionOptions, Tracker, TransactionTracking};

/// Sends transactions on behalf of one account.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    tracker: Tracker,
    sender: AccountAddress,
}

impl LedgerClient {
    pub fn new(tracker: Tracker, sender: AccountAddress) -> Self {
        Self { tracker, sender }
    }

    pub fn sender(&self) -> &AccountAddress {
        &self.sender
    }

    pub fn native_token(&self) -> &ResourceId {
        &self.tracker.settings().native_token
    }

    /// Empty builder for the configured native token.
    pub fn intent(&self) -> IntentBuilder {
        IntentBuilder::new(self.native_token().clone())
    }

    pub fn transfer_tokens(
        &self,
        input: TransferTokensInput,
        message: Option<String>,
        options: MakeTransactionOptions,
    ) -> TransactionTracking {
        let mut builder = self.intent().transfer_tokens(input);
        if let Some(message) = message {
            builder = builder.message(message);
        }
        self.make_transaction(builder, options)
    }

    pub fn stake_tokens(&self, input: StakeTokensInput, options: MakeTransactionOptions) -> TransactionTracking {
        self.make_transaction(self.intent().stake_tokens(input), options)
    }

    pub fn unstake_tokens(&self, input: UnstakeTokensInput, options: MakeTransactionOptions) -> TransactionTracking {
        self.make_transaction(self.intent().unstake_tokens(input), options)
    }

    /// Track an intent assembled from `builder` for this client's account.
    pub fn make_transaction(&self, builder: IntentBuilder, options: MakeTransactionOptions) -> TransactionTracking {
        let sender = self.sender.clone();
        self.tracker.track(async move { builder.build(&sender) }, options)
    }

    /// Track an intent produced asynchronously, e.g. after encrypting its message.
    pub fn make_transaction_from<F>(&self, intent: F, options: MakeTransactionOptions) -> TransactionTracking
    where
        F: Future<Output = Result<TransactionIntent, IntentError>> + Send + 'static,
    {
        self.tracker.track(intent, options)
    }
}
