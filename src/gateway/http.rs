//! Ledger service client over JSON/HTTP.
//!
//! # Responsibilities
//! - Serialize each operation into its endpoint's request body
//! - Translate transport failures and non-2xx responses into [`GatewayError`]
//! - Verify that submission echoes the finalized transaction identifier

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::GatewayConfig;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::wire;
use crate::gateway::{observe, LedgerGateway};
use crate::ledger::{
    BuiltTransaction, FinalizedTransaction, PendingTransaction, SignedTransaction,
    StatusOfTransaction, TransactionId, TransactionIntent,
};

/// HTTP implementation of [`LedgerGateway`].
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: url::Url,
    network: String,
    timeout_secs: u64,
}

impl HttpGateway {
    /// Create a new gateway client.
    ///
    /// Fails if the configured URL does not parse or the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let base_url: url::Url = config.url.parse().map_err(|e| {
            GatewayError::Transport(format!("Invalid gateway URL '{}': {}", config.url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            url = %base_url,
            network = %config.network,
            timeout_secs = config.request_timeout_secs,
            "Ledger gateway initialized"
        );

        Ok(Self {
            client,
            base_url,
            network: config.network.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn network_identifier(&self) -> wire::NetworkIdentifier {
        wire::NetworkIdentifier {
            network: self.network.clone(),
        }
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> GatewayResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::Transport(format!("Invalid endpoint '{}': {}", path, e)))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(e))?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| GatewayError::Decode(format!("{} response: {}", path, e)))
    }

    fn classify_transport(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout_secs)
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

/// Map a non-2xx response onto the error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<wire::ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::NOT_FOUND {
        GatewayError::NotFound(message)
    } else {
        GatewayError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl LedgerGateway for HttpGateway {
    async fn build(&self, intent: &TransactionIntent) -> GatewayResult<BuiltTransaction> {
        let started = Instant::now();
        let request = wire::BuildRequest::new(&self.network, intent);
        let result = async {
            let response: wire::BuildResponse = self.post("transaction/build", &request).await?;
            let build = response.transaction_build;
            Ok::<_, GatewayError>(BuiltTransaction {
                fee: build.fee.parse_value()?,
                blob: build.unsigned_transaction,
                payload_to_sign: build.payload_to_sign,
            })
        }
        .await;
        observe("build", started, &result);
        result
    }

    async fn finalize(&self, signed: &SignedTransaction) -> GatewayResult<FinalizedTransaction> {
        let started = Instant::now();
        let request = wire::FinalizeRequest {
            network_identifier: self.network_identifier(),
            unsigned_transaction: signed.built.blob.clone(),
            signature: wire::Signature {
                bytes: signed.signature.bytes.clone(),
                public_key: wire::PublicKey {
                    hex: signed.signature.public_key.clone(),
                },
            },
        };
        let result = self
            .post::<_, wire::FinalizeResponse>("transaction/finalize", &request)
            .await
            .map(|response| FinalizedTransaction {
                tx_id: TransactionId(response.transaction_identifier.hash),
                blob: response.signed_transaction,
            });
        observe("finalize", started, &result);
        result
    }

    async fn submit(&self, finalized: &FinalizedTransaction) -> GatewayResult<PendingTransaction> {
        let started = Instant::now();
        let request = wire::SubmitRequest {
            network_identifier: self.network_identifier(),
            signed_transaction: finalized.blob.clone(),
        };
        let result = async {
            let response: wire::SubmitResponse = self.post("transaction/submit", &request).await?;
            let tx_id = TransactionId(response.transaction_identifier.hash);
            if tx_id != finalized.tx_id {
                return Err(GatewayError::UnexpectedResponse(format!(
                    "submitted {} but service acknowledged {}",
                    finalized.tx_id, tx_id
                )));
            }
            Ok::<_, GatewayError>(PendingTransaction { tx_id })
        }
        .await;
        observe("submit", started, &result);
        result
    }

    async fn status(&self, tx_id: TransactionId) -> GatewayResult<StatusOfTransaction> {
        let started = Instant::now();
        let request = wire::StatusRequest {
            network_identifier: self.network_identifier(),
            transaction_identifier: tx_id.into(),
        };
        let result = self
            .post::<_, wire::StatusResponse>("transaction/status", &request)
            .await
            .map(|response| StatusOfTransaction {
                tx_id: TransactionId(response.transaction.transaction_identifier.hash),
                status: response.transaction.transaction_status.status,
            });
        observe("status", started, &result);
        result
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url.as_str())
            .field("network", &self.network)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
