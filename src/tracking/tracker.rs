//! Pipeline orchestration: one intent in, one tracked outcome out.

use futures_util::FutureExt;
use std::any::Any;
use std::future::{self, Future};
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::gateway::{GatewayError, LedgerGateway};
use crate::ledger::{
    IntentError, ResourceId, SignedTransaction, TransactionId, TransactionIntent,
    TransactionState,
};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::signer::{Signer, SignerError};
use crate::tracking::confirmation::UserConfirmation;
use crate::tracking::error::TrackingError;
use crate::tracking::events::{EventKind, EventLog, TrackingEvents};
use crate::tracking::poller::{PollTrigger, StatusPoller};

/// Unique identifier of one pipeline, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(Uuid);

impl PipelineId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings shared by every pipeline a [`Tracker`] starts.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub native_token: ResourceId,
    /// Period of the default poll trigger.
    pub poll_interval: Duration,
    /// Retry policy for status lookups.
    pub retry: RetryPolicy,
}

impl TrackerSettings {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            native_token: ResourceId(config.account.native_token.clone()),
            poll_interval: config.polling.interval(),
            retry: config.polling.retry_policy(),
        }
    }
}

/// Per-call options.
#[derive(Debug, Default)]
pub struct MakeTransactionOptions {
    pub user_confirmation: UserConfirmation,
    /// Replaces the fixed-interval trigger.
    pub poll_trigger: Option<PollTrigger>,
    /// Application-level cancellation, usually from [`Shutdown`](crate::lifecycle::Shutdown).
    pub cancel_on: Option<broadcast::Receiver<()>>,
}

/// Resolves exactly once, to the settled transaction id or the failure.
///
/// If the runtime drops the pipeline task before it reports, the outcome is
/// [`TrackingError::Aborted`].
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<Result<TransactionId, TrackingError>>,
}

impl Future for Completion {
    type Output = Result<TransactionId, TrackingError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(TrackingError::Aborted {
                        stage: EventKind::Initiated,
                        reason: "pipeline task ended without reporting".into(),
                    })
                })
            })
    }
}

/// Cancels one pipeline.
#[derive(Debug)]
pub struct Canceller {
    tx: Option<oneshot::Sender<()>>,
}

impl Canceller {
    /// Stop the pipeline. Remote effects already sent are not undone.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Handles returned for one tracked transaction.
///
/// Dropping both `events` and `completion` abandons the pipeline.
#[derive(Debug)]
pub struct TransactionTracking {
    pub id: PipelineId,
    pub events: TrackingEvents,
    pub completion: Completion,
    pub canceller: Canceller,
}

impl TransactionTracking {
    pub fn cancel(&mut self) {
        self.canceller.cancel();
    }
}

/// Starts transaction pipelines against one gateway and signer.
#[derive(Clone)]
pub struct Tracker {
    gateway: Arc<dyn LedgerGateway>,
    signer: Arc<dyn Signer>,
    settings: TrackerSettings,
}

impl Tracker {
    pub fn new(gateway: Arc<dyn LedgerGateway>, signer: Arc<dyn Signer>, settings: TrackerSettings) -> Self {
        Self {
            gateway,
            signer,
            settings,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Start a pipeline for the intent `intent` eventually produces.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn track<F>(&self, intent: F, options: MakeTransactionOptions) -> TransactionTracking
    where
        F: Future<Output = Result<TransactionIntent, IntentError>> + Send + 'static,
    {
        let id = PipelineId::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let pipeline = Pipeline {
            gateway: self.gateway.clone(),
            signer: self.signer.clone(),
            settings: self.settings.clone(),
            confirmation: options.user_confirmation,
            poll_trigger: options.poll_trigger,
        };
        let exits = Exits {
            completion: completion_tx,
            cancel: cancel_rx,
            cancel_on: options.cancel_on,
        };

        let span = tracing::info_span!("pipeline", id = %id);
        tokio::spawn(drive(pipeline, intent, EventLog::new(events_tx), exits).instrument(span));

        TransactionTracking {
            id,
            events: TrackingEvents::new(events_rx),
            completion: Completion { rx: completion_rx },
            canceller: Canceller { tx: Some(cancel_tx) },
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker").field("settings", &self.settings).finish()
    }
}

/// Everything that can end a pipeline besides its own outcome.
struct Exits {
    completion: oneshot::Sender<Result<TransactionId, TrackingError>>,
    cancel: oneshot::Receiver<()>,
    cancel_on: Option<broadcast::Receiver<()>>,
}

enum Exit {
    Finished(Result<TransactionId, TrackingError>),
    Panicked(String),
    Cancelled,
    Abandoned,
}

async fn drive<F>(pipeline: Pipeline, intent: F, mut log: EventLog, exits: Exits)
where
    F: Future<Output = Result<TransactionIntent, IntentError>> + Send,
{
    let Exits {
        mut completion,
        cancel,
        cancel_on,
    } = exits;
    let watcher = log.watcher();

    let exit = {
        let run = AssertUnwindSafe(pipeline.run(intent, &mut log)).catch_unwind();
        tokio::pin!(run);
        let abandoned = async {
            tokio::join!(watcher.closed(), completion.closed());
        };
        tokio::select! {
            outcome = &mut run => match outcome {
                Ok(outcome) => Exit::Finished(outcome),
                Err(panic) => Exit::Panicked(panic_message(panic)),
            },
            _ = cancelled(cancel, cancel_on) => Exit::Cancelled,
            _ = abandoned => Exit::Abandoned,
        }
    };
    drop(watcher);

    match exit {
        Exit::Finished(outcome) => {
            match &outcome {
                Ok(tx_id) => {
                    tracing::info!(tx_id = %tx_id, "Transaction completed");
                    metrics::record_pipeline_outcome("completed");
                }
                Err(_) => metrics::record_pipeline_outcome("failed"),
            }
            let _ = completion.send(outcome);
        }
        Exit::Panicked(reason) => {
            let error = TrackingError::Aborted {
                stage: EventKind::in_progress_after(log.last()),
                reason,
            };
            tracing::error!(error = %error, "Pipeline panicked");
            metrics::record_pipeline_outcome("aborted");
            log.fail(error.clone());
            let _ = completion.send(Err(error));
        }
        Exit::Cancelled => {
            let last = log.last();
            tracing::info!(last_stage = ?last, "Pipeline cancelled");
            metrics::record_pipeline_outcome("cancelled");
            let _ = completion.send(Err(TrackingError::Cancelled { last }));
        }
        Exit::Abandoned => {
            tracing::debug!(last_stage = ?log.last(), "Pipeline abandoned by caller");
            metrics::record_pipeline_outcome("abandoned");
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "panic with non-string payload".to_string(),
        },
    }
}

/// Resolves on explicit or application cancellation.
///
/// A dropped canceller or a closed shutdown channel never cancels.
async fn cancelled(explicit: oneshot::Receiver<()>, application: Option<broadcast::Receiver<()>>) {
    let explicit = async move {
        if explicit.await.is_err() {
            future::pending::<()>().await;
        }
    };
    let application = async move {
        match application {
            Some(mut rx) => {
                if let Err(broadcast::error::RecvError::Closed) = rx.recv().await {
                    future::pending::<()>().await;
                }
            }
            None => future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = explicit => {}
        _ = application => {}
    }
}

/// State owned by one pipeline task.
struct Pipeline {
    gateway: Arc<dyn LedgerGateway>,
    signer: Arc<dyn Signer>,
    settings: TrackerSettings,
    confirmation: UserConfirmation,
    poll_trigger: Option<PollTrigger>,
}

impl Pipeline {
    async fn run<F>(self, intent: F, log: &mut EventLog) -> Result<TransactionId, TrackingError>
    where
        F: Future<Output = Result<TransactionIntent, IntentError>>,
    {
        let outcome = self.stages(intent, log).await;
        if let Err(error) = &outcome {
            log.fail(error.clone());
        }
        outcome
    }

    async fn stages<F>(mut self, intent: F, log: &mut EventLog) -> Result<TransactionId, TrackingError>
    where
        F: Future<Output = Result<TransactionIntent, IntentError>>,
    {
        let intent = intent.await?;
        log.emit(EventKind::Initiated, TransactionState::Intent(intent.clone()));

        let built = self.gateway.build(&intent).await.map_err(TrackingError::Build)?;
        tracing::info!(fee = %built.fee, "Transaction built");
        log.emit(EventKind::BuiltFromIntent, TransactionState::Built(built.clone()));

        log.emit(EventKind::AskedForConfirmation, TransactionState::Built(built.clone()));
        self.confirmation.request(&built).await?;
        log.emit(EventKind::Confirmed, TransactionState::Built(built.clone()));

        let resource_hint = self.resource_hint(&intent)?;
        let signature = self
            .signer
            .sign(&built, resource_hint.as_deref())
            .await
            .map_err(TrackingError::Signing)?;
        let signed = SignedTransaction { built, signature };
        log.emit(EventKind::Signed, TransactionState::Signed(signed.clone()));

        let finalized = self
            .gateway
            .finalize(&signed)
            .await
            .map_err(TrackingError::Finalize)?;
        let tx_id = finalized.tx_id;
        tracing::info!(tx_id = %tx_id, "Transaction finalized");
        log.emit(EventKind::Finalized, TransactionState::Finalized(finalized.clone()));

        let pending = self
            .gateway
            .submit(&finalized)
            .await
            .map_err(TrackingError::Submit)?;
        if pending.tx_id != tx_id {
            return Err(TrackingError::Submit(GatewayError::UnexpectedResponse(format!(
                "submitted {} but service acknowledged {}",
                tx_id, pending.tx_id
            ))));
        }
        log.emit(EventKind::Submitted, TransactionState::Pending(pending));

        // The default timer starts only once there is something to poll.
        let trigger = self
            .poll_trigger
            .take()
            .unwrap_or_else(|| PollTrigger::interval(self.settings.poll_interval));
        let settled = StatusPoller::new(self.gateway.as_ref(), self.settings.retry)
            .poll(tx_id, trigger, log)
            .await?;

        log.emit(EventKind::Completed, TransactionState::Status(settled));
        Ok(tx_id)
    }

    /// Name of the single non-native resource moved by transfers, if any.
    fn resource_hint(&self, intent: &TransactionIntent) -> Result<Option<String>, TrackingError> {
        let mut names = intent.non_native_transfer_resources(&self.settings.native_token);
        if names.len() > 1 {
            return Err(TrackingError::Signing(SignerError::MultipleNonNativeResources(names)));
        }
        Ok(names.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryLedger;
    use crate::ledger::{AccountAddress, IntentBuilder, TransferTokensInput};
    use crate::signer::LocalKeySigner;
    use alloy::primitives::U256;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn tracker(ledger: InMemoryLedger) -> Tracker {
        Tracker::new(
            Arc::new(ledger),
            Arc::new(LocalKeySigner::from_private_key(TEST_PRIVATE_KEY).unwrap()),
            TrackerSettings {
                native_token: ResourceId::from("xrd_rr1"),
                poll_interval: Duration::from_millis(10),
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay_ms: 0,
                    max_delay_ms: 0,
                },
            },
        )
    }

    fn transfer(resources: &[&str]) -> IntentBuilder {
        resources.iter().fold(IntentBuilder::new(ResourceId::from("xrd_rr1")), |builder, resource| {
            builder.transfer_tokens(TransferTokensInput {
                to: AccountAddress::from("rdx1alice"),
                amount: U256::from(10),
                resource: ResourceId::from(*resource),
            })
        })
    }

    fn sender() -> AccountAddress {
        AccountAddress::from("rdx1bob")
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_pipeline_completes() {
        let ledger = InMemoryLedger::new(U256::from(1), 1);
        let tracker = tracker(ledger.clone());
        let builder = transfer(&["xrd_rr1"]);

        let tracking = tracker.track(async move { builder.build(&sender()) }, MakeTransactionOptions::default());
        let tx_id = tracking.completion.await.unwrap();
        let events = tracking.events.collect().await;

        assert_eq!(ledger.submitted_count(), 1);
        assert_eq!(events.last().unwrap().kind(), EventKind::Completed);
        assert_eq!(events.last().unwrap().to_string(), format!("COMPLETED({})", tx_id));
    }

    #[test]
    fn test_resource_hint() {
        let pipeline = Pipeline {
            gateway: Arc::new(InMemoryLedger::default()),
            signer: Arc::new(LocalKeySigner::from_private_key(TEST_PRIVATE_KEY).unwrap()),
            settings: tracker(InMemoryLedger::default()).settings.clone(),
            confirmation: UserConfirmation::Skip,
            poll_trigger: None,
        };

        let native_only = transfer(&["xrd_rr1", "xrd_rr1"]).build(&sender()).unwrap();
        assert_eq!(pipeline.resource_hint(&native_only).unwrap(), None);

        let one = transfer(&["xrd_rr1", "gum_rb1"]).build(&sender()).unwrap();
        assert_eq!(pipeline.resource_hint(&one).unwrap(), Some("gum".to_string()));

        let same_name = transfer(&["gum_rb1aaa", "gum_rb1bbb"]).build(&sender()).unwrap();
        assert_eq!(pipeline.resource_hint(&same_name).unwrap(), Some("gum".to_string()));

        let two = transfer(&["gum_rb1", "zoo_rb1"]).build(&sender()).unwrap();
        assert!(matches!(
            pipeline.resource_hint(&two),
            Err(TrackingError::Signing(SignerError::MultipleNonNativeResources(_)))
        ));
    }

    #[tokio::test]
    async fn test_intent_failure_has_no_initiated_event() {
        let tracker = tracker(InMemoryLedger::default());
        let builder = IntentBuilder::new(ResourceId::from("xrd_rr1"));

        let tracking = tracker.track(async move { builder.build(&sender()) }, MakeTransactionOptions::default());

        assert_eq!(
            tracking.completion.await,
            Err(TrackingError::Intent(IntentError::Empty))
        );
        let events = tracking.events.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::Initiated);
        assert!(events[0].is_terminal());
    }
}
