//! Transaction intents and the builder that assembles them.
//!
//! An intent is the user-level description of a ledger operation before the
//! ledger service has validated it. Actions are accumulated on an
//! [`IntentBuilder`] and the sender is filled in when the intent is built.

use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::types::{AccountAddress, Amount, ResourceId, ValidatorAddress};

/// Upper bound on an attached message, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTokensInput {
    pub to: AccountAddress,
    pub amount: Amount,
    pub resource: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeTokensInput {
    pub validator: ValidatorAddress,
    pub amount: Amount,
}

/// Unstake either a fixed amount or a percentage of the stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakeTokensInput {
    pub validator: ValidatorAddress,
    pub amount: Option<Amount>,
    pub percentage: Option<u8>,
}

/// Single action inside an intent, with every party resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntendedAction {
    Transfer {
        from: AccountAddress,
        to: AccountAddress,
        amount: Amount,
        resource: ResourceId,
    },
    Stake {
        from: AccountAddress,
        validator: ValidatorAddress,
        amount: Amount,
        resource: ResourceId,
    },
    Unstake {
        from: AccountAddress,
        validator: ValidatorAddress,
        amount: Option<Amount>,
        percentage: Option<u8>,
        resource: ResourceId,
    },
}

impl IntendedAction {
    pub fn resource(&self) -> &ResourceId {
        match self {
            IntendedAction::Transfer { resource, .. }
            | IntendedAction::Stake { resource, .. }
            | IntendedAction::Unstake { resource, .. } => resource,
        }
    }
}

/// Immutable request handed to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub actions: Vec<IntendedAction>,
    pub message: Option<Bytes>,
}

impl TransactionIntent {
    /// Distinct names of the resources moved by transfer actions, excluding `native`.
    ///
    /// Resources are told apart by [`ResourceId::name`] only.
    pub fn non_native_transfer_resources(&self, native: &ResourceId) -> Vec<String> {
        let mut names: Vec<String> = self
            .actions
            .iter()
            .filter_map(|action| match action {
                IntendedAction::Transfer { resource, .. } if resource.name() != native.name() => {
                    Some(resource.name().to_string())
                }
                _ => None,
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Errors raised while assembling an intent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("Intent contains no actions")]
    Empty,

    #[error("Action {index} has a zero amount")]
    ZeroAmount { index: usize },

    #[error("Unstake action {index} must specify exactly one of amount or percentage")]
    AmbiguousUnstake { index: usize },

    #[error("Unstake percentage {0} is outside 1..=100")]
    InvalidPercentage(u8),

    #[error("Message is {len} bytes, maximum is {max}")]
    MessageTooLong { len: usize, max: usize },

    /// Asynchronous preparation of the intent failed (e.g. message encryption).
    #[error("Intent preparation failed: {0}")]
    Preparation(String),
}

#[derive(Debug, Clone)]
enum ActionInput {
    Transfer(TransferTokensInput),
    Stake(StakeTokensInput),
    Unstake(UnstakeTokensInput),
}

/// Accumulates actions and an optional plaintext message.
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    native_token: ResourceId,
    inputs: Vec<ActionInput>,
    message: Option<String>,
}

impl IntentBuilder {
    /// Stake and unstake actions always move `native_token`.
    pub fn new(native_token: ResourceId) -> Self {
        Self {
            native_token,
            inputs: Vec::new(),
            message: None,
        }
    }

    pub fn transfer_tokens(mut self, input: TransferTokensInput) -> Self {
        self.inputs.push(ActionInput::Transfer(input));
        self
    }

    pub fn stake_tokens(mut self, input: StakeTokensInput) -> Self {
        self.inputs.push(ActionInput::Stake(input));
        self
    }

    pub fn unstake_tokens(mut self, input: UnstakeTokensInput) -> Self {
        self.inputs.push(ActionInput::Unstake(input));
        self
    }

    pub fn message(mut self, plaintext: impl Into<String>) -> Self {
        self.message = Some(plaintext.into());
        self
    }

    /// Validate the accumulated inputs and resolve them against `sender`.
    pub fn build(self, sender: &AccountAddress) -> Result<TransactionIntent, IntentError> {
        if self.inputs.is_empty() {
            return Err(IntentError::Empty);
        }

        let mut actions = Vec::with_capacity(self.inputs.len());
        for (index, input) in self.inputs.into_iter().enumerate() {
            let action = match input {
                ActionInput::Transfer(t) => {
                    ensure_positive(t.amount, index)?;
                    IntendedAction::Transfer {
                        from: sender.clone(),
                        to: t.to,
                        amount: t.amount,
                        resource: t.resource,
                    }
                }
                ActionInput::Stake(s) => {
                    ensure_positive(s.amount, index)?;
                    IntendedAction::Stake {
                        from: sender.clone(),
                        validator: s.validator,
                        amount: s.amount,
                        resource: self.native_token.clone(),
                    }
                }
                ActionInput::Unstake(u) => {
                    match (u.amount, u.percentage) {
                        (Some(amount), None) => ensure_positive(amount, index)?,
                        (None, Some(pct)) if (1..=100).contains(&pct) => {}
                        (None, Some(pct)) => return Err(IntentError::InvalidPercentage(pct)),
                        _ => return Err(IntentError::AmbiguousUnstake { index }),
                    }
                    IntendedAction::Unstake {
                        from: sender.clone(),
                        validator: u.validator,
                        amount: u.amount,
                        percentage: u.percentage,
                        resource: self.native_token.clone(),
                    }
                }
            };
            actions.push(action);
        }

        let message = match self.message {
            Some(text) if text.len() > MAX_MESSAGE_BYTES => {
                return Err(IntentError::MessageTooLong {
                    len: text.len(),
                    max: MAX_MESSAGE_BYTES,
                })
            }
            Some(text) => Some(Bytes::from(text.into_bytes())),
            None => None,
        };

        Ok(TransactionIntent { actions, message })
    }
}

fn ensure_positive(amount: Amount, index: usize) -> Result<(), IntentError> {
    if amount == U256::ZERO {
        return Err(IntentError::ZeroAmount { index });
    }
    Ok(())
}
