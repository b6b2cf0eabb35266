//! JSON request and response bodies of the ledger service API.

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::gateway::error::GatewayError;
use crate::ledger::{
    Amount, IntendedAction, TransactionId, TransactionIntent, TransactionStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkIdentifier {
    pub network: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIdentifier {
    pub rri: String,
}

/// Amounts travel as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAmount {
    pub value: String,
    pub token_identifier: TokenIdentifier,
}

impl TokenAmount {
    fn new(value: Amount, rri: &str) -> Self {
        Self {
            value: value.to_string(),
            token_identifier: TokenIdentifier {
                rri: rri.to_string(),
            },
        }
    }

    pub fn parse_value(&self) -> Result<Amount, GatewayError> {
        self.value
            .parse::<Amount>()
            .map_err(|e| GatewayError::Decode(format!("Invalid amount '{}': {}", self.value, e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    TransferTokens {
        from_account: AccountIdentifier,
        to_account: AccountIdentifier,
        amount: TokenAmount,
    },
    StakeTokens {
        from_account: AccountIdentifier,
        validator: AccountIdentifier,
        amount: TokenAmount,
    },
    UnstakeTokens {
        from_account: AccountIdentifier,
        validator: AccountIdentifier,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<TokenAmount>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unstake_percentage: Option<u8>,
    },
}

impl From<&IntendedAction> for Action {
    fn from(action: &IntendedAction) -> Self {
        match action {
            IntendedAction::Transfer {
                from,
                to,
                amount,
                resource,
            } => Action::TransferTokens {
                from_account: AccountIdentifier {
                    address: from.0.clone(),
                },
                to_account: AccountIdentifier {
                    address: to.0.clone(),
                },
                amount: TokenAmount::new(*amount, &resource.0),
            },
            IntendedAction::Stake {
                from,
                validator,
                amount,
                resource,
            } => Action::StakeTokens {
                from_account: AccountIdentifier {
                    address: from.0.clone(),
                },
                validator: AccountIdentifier {
                    address: validator.0.clone(),
                },
                amount: TokenAmount::new(*amount, &resource.0),
            },
            IntendedAction::Unstake {
                from,
                validator,
                amount,
                percentage,
                resource,
            } => Action::UnstakeTokens {
                from_account: AccountIdentifier {
                    address: from.0.clone(),
                },
                validator: AccountIdentifier {
                    address: validator.0.clone(),
                },
                amount: amount.map(|a| TokenAmount::new(a, &resource.0)),
                unstake_percentage: *percentage,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    pub network_identifier: NetworkIdentifier,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Bytes>,
}

impl BuildRequest {
    pub fn new(network: &str, intent: &TransactionIntent) -> Self {
        Self {
            network_identifier: NetworkIdentifier {
                network: network.to_string(),
            },
            actions: intent.actions.iter().map(Action::from).collect(),
            message: intent.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionBuild {
    pub fee: TokenAmount,
    pub unsigned_transaction: Bytes,
    pub payload_to_sign: B256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResponse {
    pub transaction_build: TransactionBuild,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    pub hex: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub bytes: Bytes,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub network_identifier: NetworkIdentifier,
    pub unsigned_transaction: Bytes,
    pub signature: Signature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: B256,
}

impl From<TransactionId> for TransactionIdentifier {
    fn from(id: TransactionId) -> Self {
        Self { hash: id.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub signed_transaction: Bytes,
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub network_identifier: NetworkIdentifier,
    pub signed_transaction: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub network_identifier: NetworkIdentifier,
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusBody {
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub transaction_identifier: TransactionIdentifier,
    pub transaction_status: TransactionStatusBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub transaction: TransactionInfo,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}
