//! In-process secp256k1 signer.
//!
//! # Security
//! - Private keys are loaded ONLY from a hex string or an environment variable
//! - Keys are never logged or serialized

use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as _;
use async_trait::async_trait;

use crate::ledger::{BuiltTransaction, TransactionSignature};
use crate::signer::{Signer, SignerError};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_TRACKER_PRIVATE_KEY";

/// Signs the payload digest of built transactions with a local key.
#[derive(Debug, Clone)]
pub struct LocalKeySigner {
    signer: PrivateKeySigner,
    public_key: Bytes,
}

impl LocalKeySigner {
    /// Create a signer from a hex-encoded private key (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, SignerError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SignerError::Key(format!("Invalid private key format: {}", e)))?;

        Ok(Self::with_signer(signer))
    }

    /// Fresh random key, for simulation.
    pub fn random() -> Self {
        Self::with_signer(PrivateKeySigner::random())
    }

    fn with_signer(signer: PrivateKeySigner) -> Self {
        let public_key = Bytes::from(
            signer
                .credential()
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        );

        tracing::info!(address = %signer.address(), "Signer initialized");

        Self { signer, public_key }
    }

    /// Load the key from `LEDGER_TRACKER_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self, SignerError> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            SignerError::Key(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }
}

#[async_trait]
impl Signer for LocalKeySigner {
    async fn sign(
        &self,
        built: &BuiltTransaction,
        resource_hint: Option<&str>,
    ) -> Result<TransactionSignature, SignerError> {
        // A software key signs any resource; the hint only matters to hardware signers.
        if let Some(resource) = resource_hint {
            tracing::debug!(resource, "Signing transaction moving non-native resource");
        }

        let signature = self
            .signer
            .sign_hash(&built.payload_to_sign)
            .await
            .map_err(|e| SignerError::Failed(e.to_string()))?;

        Ok(TransactionSignature {
            bytes: Bytes::from(signature.as_bytes().to_vec()),
            public_key: self.public_key.clone(),
        })
    }
}
