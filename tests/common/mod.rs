//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ledger_tracker::gateway::{GatewayError, GatewayResult, LedgerGateway};
use ledger_tracker::ledger::{
    AccountAddress, BuiltTransaction, FinalizedTransaction, IntentBuilder, PendingTransaction,
    ResourceId, SignedTransaction, StatusOfTransaction, TransactionId, TransactionIntent,
    TransactionSignature, TransactionStatus, TransferTokensInput,
};
use ledger_tracker::resilience::RetryPolicy;
use ledger_tracker::signer::{Signer, SignerError};
use ledger_tracker::tracking::{EventKind, Tracker, TrackerSettings, TrackingEvent};
use ledger_tracker::ledger::TransactionState;

pub const NATIVE: &str = "xrd_rr1qy5wfsfh";

/// `0xabc`, left padded to 32 bytes.
pub fn tx_abc() -> TransactionId {
    TransactionId(B256::left_padding_from(&[0x0a, 0xbc]))
}

pub fn sender() -> AccountAddress {
    AccountAddress::from("rdx1sender")
}

/// Intent transferring 10 units of each resource to account A.
pub fn transfer_intent(resources: &[&str]) -> TransactionIntent {
    resources
        .iter()
        .fold(IntentBuilder::new(ResourceId::from(NATIVE)), |builder, resource| {
            builder.transfer_tokens(TransferTokensInput {
                to: AccountAddress::from("rdx1a"),
                amount: U256::from(10),
                resource: ResourceId::from(*resource),
            })
        })
        .build(&sender())
        .unwrap()
}

pub fn settings(poll_interval: Duration) -> TrackerSettings {
    TrackerSettings {
        native_token: ResourceId::from(NATIVE),
        poll_interval,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
        },
    }
}

pub fn tracker(gateway: Arc<dyn LedgerGateway>, signer: Arc<dyn Signer>) -> Tracker {
    Tracker::new(gateway, signer, settings(Duration::from_millis(1000)))
}

/// Compact label of an event: the kind, the status of status updates, the
/// transaction id of `COMPLETED` and the stage of errors.
pub fn label(event: &TrackingEvent) -> String {
    match event {
        TrackingEvent::Update {
            kind: EventKind::UpdateOfStatusOfPendingTx,
            state: TransactionState::Status(status),
        } => format!("UPDATE_OF_STATUS_OF_PENDING_TX({})", status.status),
        TrackingEvent::Update {
            kind: EventKind::Completed,
            state,
        } => format!("COMPLETED({})", state.tx_id().map(|id| id.to_string()).unwrap_or_default()),
        TrackingEvent::Update { kind, .. } => kind.to_string(),
        TrackingEvent::Error { stage, .. } => format!("ERROR({})", stage),
    }
}

pub fn labels(events: &[TrackingEvent]) -> Vec<String> {
    events.iter().map(label).collect()
}

/// Calls made against a [`ScriptedGateway`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub build: u32,
    pub finalize: u32,
    pub submit: u32,
    pub status: u32,
}

/// Gateway answering from a fixed script.
///
/// Status replies are served in order; the last one repeats. An empty
/// script answers every lookup with `NotFound`.
pub struct ScriptedGateway {
    tx_id: TransactionId,
    build_error: Option<GatewayError>,
    finalize_error: Option<GatewayError>,
    submit_error: Option<GatewayError>,
    submitted_id: Option<TransactionId>,
    statuses: Mutex<VecDeque<GatewayResult<TransactionStatus>>>,
    build_calls: AtomicU32,
    finalize_calls: AtomicU32,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl ScriptedGateway {
    pub fn new(tx_id: TransactionId, statuses: Vec<GatewayResult<TransactionStatus>>) -> Self {
        Self {
            tx_id,
            build_error: None,
            finalize_error: None,
            submit_error: None,
            submitted_id: None,
            statuses: Mutex::new(statuses.into()),
            build_calls: AtomicU32::new(0),
            finalize_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn with_build_error(mut self, error: GatewayError) -> Self {
        self.build_error = Some(error);
        self
    }

    pub fn with_finalize_error(mut self, error: GatewayError) -> Self {
        self.finalize_error = Some(error);
        self
    }

    pub fn with_submit_error(mut self, error: GatewayError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Acknowledge submissions with `tx_id` instead of the finalized id.
    pub fn with_submitted_id(mut self, tx_id: TransactionId) -> Self {
        self.submitted_id = Some(tx_id);
        self
    }

    pub fn calls(&self) -> Calls {
        Calls {
            build: self.build_calls.load(Ordering::SeqCst),
            finalize: self.finalize_calls.load(Ordering::SeqCst),
            submit: self.submit_calls.load(Ordering::SeqCst),
            status: self.status_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl LedgerGateway for ScriptedGateway {
    async fn build(&self, intent: &TransactionIntent) -> GatewayResult<BuiltTransaction> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.build_error {
            return Err(e.clone());
        }
        let blob = Bytes::from(serde_json::to_vec(intent).unwrap());
        Ok(BuiltTransaction {
            payload_to_sign: keccak256(&blob),
            blob,
            fee: U256::from(1),
        })
    }

    async fn finalize(&self, signed: &SignedTransaction) -> GatewayResult<FinalizedTransaction> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.finalize_error {
            return Err(e.clone());
        }
        Ok(FinalizedTransaction {
            tx_id: self.tx_id,
            blob: signed.built.blob.clone(),
        })
    }

    async fn submit(&self, finalized: &FinalizedTransaction) -> GatewayResult<PendingTransaction> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.submit_error {
            return Err(e.clone());
        }
        Ok(PendingTransaction {
            tx_id: self.submitted_id.unwrap_or(finalized.tx_id),
        })
    }

    async fn status(&self, tx_id: TransactionId) -> GatewayResult<StatusOfTransaction> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let reply = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(GatewayError::NotFound("transaction not indexed".into())))
        };
        reply.map(|status| StatusOfTransaction { tx_id, status })
    }
}

/// Signer returning a fixed signature and recording the hints it was given.
#[derive(Default)]
pub struct StaticSigner {
    hints: Mutex<Vec<Option<String>>>,
}

impl StaticSigner {
    pub fn calls(&self) -> usize {
        self.hints.lock().unwrap().len()
    }

    pub fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl Signer for StaticSigner {
    async fn sign(
        &self,
        _built: &BuiltTransaction,
        resource_hint: Option<&str>,
    ) -> Result<TransactionSignature, SignerError> {
        self.hints.lock().unwrap().push(resource_hint.map(str::to_string));
        Ok(TransactionSignature {
            bytes: Bytes::from_static(&[0x5a; 65]),
            public_key: Bytes::from_static(&[0x02; 33]),
        })
    }
}

/// Start a programmable mock ledger service on an ephemeral port.
///
/// `f` receives the request path and body and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some((path, body)) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(path, body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP/1.1 request, returning its path and body.
async fn read_request(socket: &mut TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head.lines().next()?.split_whitespace().nth(1)?.to_string();
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();
    Some((path, body))
}
