//! Status polling of a submitted transaction.
//!
//! On every trigger tick the poller asks the ledger service for the status,
//! retrying a bounded number of times while the transaction is not yet
//! indexed. Only a change of status is reported. Polling stops at the first
//! `CONFIRMED` or `FAILED`.

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::gateway::{GatewayError, LedgerGateway};
use crate::ledger::{StatusOfTransaction, TransactionId, TransactionState, TransactionStatus};
use crate::observability::metrics;
use crate::resilience::{retry_bounded, RetryPolicy};
use crate::tracking::error::TrackingError;
use crate::tracking::events::{EventKind, EventLog};

/// Shortest period accepted by [`PollTrigger::interval`].
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Source of discrete "poll now" ticks.
pub struct PollTrigger {
    ticks: BoxStream<'static, ()>,
}

impl PollTrigger {
    /// Tick every `period`, first tick one period from now.
    ///
    /// Periods below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn interval(period: Duration) -> Self {
        let period = period.max(MIN_POLL_INTERVAL);
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ticks = stream::unfold(interval, |mut interval| async move {
            interval.tick().await;
            Some(((), interval))
        });
        Self {
            ticks: ticks.boxed(),
        }
    }

    /// Tick once per item of `source`. Polling ends when `source` ends.
    pub fn from_stream<S>(source: S) -> Self
    where
        S: Stream + Send + 'static,
    {
        Self {
            ticks: source.map(|_| ()).boxed(),
        }
    }

    /// Tick on every broadcast message, so one timer can drive many pipelines.
    ///
    /// Missed messages collapse into a single tick.
    pub fn from_broadcast<T>(rx: broadcast::Receiver<T>) -> Self
    where
        T: Clone + Send + 'static,
    {
        let ticks = stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => Some(((), rx)),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        });
        Self {
            ticks: ticks.boxed(),
        }
    }

    async fn tick(&mut self) -> Option<()> {
        self.ticks.next().await
    }
}

impl std::fmt::Debug for PollTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollTrigger").finish_non_exhaustive()
    }
}

/// Polls one transaction until it settles.
pub(crate) struct StatusPoller<'a> {
    gateway: &'a dyn LedgerGateway,
    retry: RetryPolicy,
}

impl<'a> StatusPoller<'a> {
    pub(crate) fn new(gateway: &'a dyn LedgerGateway, retry: RetryPolicy) -> Self {
        Self { gateway, retry }
    }

    /// Returns the confirmed status, or the error that ended polling.
    ///
    /// Emits one `UPDATE_OF_STATUS_OF_PENDING_TX` per status change.
    pub(crate) async fn poll(
        &self,
        tx_id: TransactionId,
        mut trigger: PollTrigger,
        log: &mut EventLog,
    ) -> Result<StatusOfTransaction, TrackingError> {
        let mut last_status: Option<TransactionStatus> = None;

        while trigger.tick().await.is_some() {
            let current = self.lookup(tx_id).await?;
            if last_status == Some(current.status) {
                continue;
            }
            last_status = Some(current.status);

            tracing::info!(tx_id = %tx_id, status = %current.status, "Transaction status changed");
            log.emit(EventKind::UpdateOfStatusOfPendingTx, TransactionState::Status(current));

            if current.status.is_terminal() {
                return match current.status {
                    TransactionStatus::Failed => Err(TrackingError::LedgerReportedFailure(tx_id)),
                    _ => Ok(current),
                };
            }
        }

        Err(TrackingError::PollTriggerExhausted(tx_id))
    }

    async fn lookup(&self, tx_id: TransactionId) -> Result<StatusOfTransaction, TrackingError> {
        let status = retry_bounded(self.retry, GatewayError::is_not_yet_indexed, |attempt| async move {
            let result = self.gateway.status(tx_id).await;
            match &result {
                Ok(_) => metrics::record_status_lookup("ok"),
                Err(e) => {
                    tracing::debug!(tx_id = %tx_id, attempt, error = %e, "Status lookup failed");
                    metrics::record_status_lookup(e.kind());
                }
            }
            result
        })
        .await
        .map_err(TrackingError::StatusLookup)?;

        if status.tx_id != tx_id {
            return Err(TrackingError::StatusLookup(GatewayError::UnexpectedResponse(format!(
                "asked for {} but service reported {}",
                tx_id, status.tx_id
            ))));
        }
        Ok(status)
    }
}
