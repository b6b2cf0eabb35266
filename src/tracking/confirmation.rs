//! User approval between build and sign.
//!
//! # Modes
//! - `Skip`: approval is granted the moment it is requested
//! - `Manual`: the built transaction is handed to an external party and the
//!   pipeline waits, without timeout, until [`ManualConfirmation::confirm`]
//!   is called. Dropping the request unconfirmed withdraws the transaction.

use tokio::sync::{mpsc, oneshot};

use crate::ledger::BuiltTransaction;
use crate::tracking::error::TrackingError;

/// How a pipeline obtains approval to sign.
#[derive(Debug, Clone, Default)]
pub enum UserConfirmation {
    #[default]
    Skip,
    /// Requests are delivered on this channel.
    Manual(mpsc::UnboundedSender<ManualConfirmation>),
}

impl UserConfirmation {
    /// Manual mode plus the receiver on which requests arrive.
    pub fn manual() -> (Self, mpsc::UnboundedReceiver<ManualConfirmation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UserConfirmation::Manual(tx), rx)
    }

    /// Grant or await approval for `built`.
    pub(crate) async fn request(&self, built: &BuiltTransaction) -> Result<(), TrackingError> {
        let requests = match self {
            UserConfirmation::Skip => return Ok(()),
            UserConfirmation::Manual(requests) => requests,
        };

        let (responder, response) = oneshot::channel();
        let request = ManualConfirmation {
            tx_to_confirm: built.clone(),
            responder,
        };
        if requests.send(request).is_err() {
            tracing::warn!("Confirmation channel closed before the request was delivered");
            return Err(TrackingError::ConfirmationWithdrawn);
        }

        tracing::info!(fee = %built.fee, "Awaiting user confirmation");
        response
            .await
            .map_err(|_| TrackingError::ConfirmationWithdrawn)
    }
}

/// A built transaction waiting for the user's approval.
#[derive(Debug)]
pub struct ManualConfirmation {
    tx_to_confirm: BuiltTransaction,
    responder: oneshot::Sender<()>,
}

impl ManualConfirmation {
    pub fn tx_to_confirm(&self) -> &BuiltTransaction {
        &self.tx_to_confirm
    }

    /// Approve signing. Has no effect if the pipeline is already gone.
    pub fn confirm(self) {
        let _ = self.responder.send(());
    }
}
