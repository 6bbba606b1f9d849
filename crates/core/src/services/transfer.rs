//! Transaction lifecycle orchestration.
//!
//! Submits a transfer and follows its status stream until one terminal
//! outcome is produced. Inclusion in a best block is not enough: only a
//! finalized block counts, since a best block can still be reorganised away.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{DomainError, TransferError, TransferResult, TransportFailure};
use crate::metrics::{
    FinalizationTimer, record_fee_estimate, record_status_update, record_transfer_outcome,
    record_transfer_submitted,
};
use crate::models::{TransferOutcome, TransferReceipt, TransferRequest};
use crate::ports::{ChainEvent, FinalizedTx, SigningIdentity, TransferGateway, TxStatus, TxStatusStream};

// =============================================================================
// Configuration
// =============================================================================

/// How to read a finalized block that carries neither a failure nor a
/// success event for the extrinsic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalityPolicy {
    /// No `System.ExtrinsicFailed` means success.
    #[default]
    AbsenceOfFailure,
    /// Require `System.ExtrinsicSuccess` or `Balances.Transfer`.
    RequireSuccessEvent,
}

/// Configuration for the transfer service.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Upper bound on the wait for a terminal status.
    pub finalization_timeout: Duration,
    pub finality_policy: FinalityPolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            finalization_timeout: Duration::from_secs(300),
            finality_policy: FinalityPolicy::default(),
        }
    }
}

// =============================================================================
// TransferService
// =============================================================================

/// Drives a submitted transfer to a terminal outcome.
///
/// # Flow
///
/// 1. Check the signer is the sender
/// 2. Build, sign and submit through the gateway
/// 3. Consume status notifications until `Finalized` or `Error`
/// 4. Classify the finalized events into success or failure
/// 5. Drop the status stream (unsubscribe)
///
/// Submissions are never retried here. A caller that wants to retry after a
/// transport error must build a new [`TransferRequest`] so a new nonce is
/// signed.
pub struct TransferService<G: TransferGateway> {
    config: TransferConfig,
    gateway: Arc<G>,
}

impl<G: TransferGateway> TransferService<G> {
    pub fn new(config: TransferConfig, gateway: Arc<G>) -> Self {
        Self { config, gateway }
    }

    /// Estimate the fee of `request` without submitting it.
    #[instrument(skip_all, fields(amount = request.amount))]
    pub async fn estimate_fee(
        &self,
        request: &TransferRequest,
        signer: &G::Signer,
    ) -> TransferResult<u128> {
        ensure_signer(request, signer)?;

        let fee = self
            .gateway
            .estimate_fee(request, signer)
            .await
            .map_err(TransferError::FeeEstimationFailed)?;

        record_fee_estimate(fee);
        debug!(fee, "Fee estimated");
        Ok(fee)
    }

    /// Submit `request` and wait for exactly one terminal outcome.
    ///
    /// Returns `Err` only when the transfer could not be handed to the node.
    /// Once submitted, every result (including transport failures) is a
    /// [`TransferOutcome`].
    #[instrument(skip_all, fields(amount = request.amount, recipient = %request.recipient))]
    pub async fn submit_and_track(
        &self,
        request: &TransferRequest,
        signer: &G::Signer,
    ) -> TransferResult<TransferOutcome> {
        ensure_signer(request, signer)?;

        let stream = self
            .gateway
            .submit(request, signer)
            .await
            .map_err(TransferError::SubmissionError)?;

        record_transfer_submitted();
        info!("🚀 Transfer submitted");

        let _timer = FinalizationTimer::new();
        let timeout = self.config.finalization_timeout;

        // The stream is owned by `track`; it is dropped, and the node
        // subscription closed, as soon as the future completes or times out.
        let outcome = match tokio::time::timeout(timeout, self.track(stream)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "⚠️  No terminal status in time");
                TransferOutcome::TransportError(TransportFailure::Timeout(timeout))
            }
        };

        record_transfer_outcome(outcome.label());
        Ok(outcome)
    }

    /// Consume status notifications until the first terminal one.
    async fn track(&self, mut stream: TxStatusStream) -> TransferOutcome {
        while let Some(item) = stream.next().await {
            let status = match item {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "⚠️  Status subscription failed");
                    return TransferOutcome::TransportError(TransportFailure::Connection(
                        e.to_string(),
                    ));
                }
            };

            record_status_update(status.label());

            match status {
                TxStatus::Ready => info!("📥 Transaction ready"),
                TxStatus::Broadcast => info!("📡 Transaction broadcast"),
                TxStatus::InBlock { block_hash } => {
                    info!(block = %block_hash, "📦 Included in block, waiting for finalization");
                }
                TxStatus::Retracted { block_hash } => {
                    warn!(block = ?block_hash.map(|h| h.to_hex()), "🔄 Block retracted, still waiting");
                }
                TxStatus::Finalized(tx) => {
                    info!(block = %tx.block_hash, "✅ Finalized");
                    return classify_finalized(tx, self.config.finality_policy);
                }
                TxStatus::Error { message } => {
                    warn!(message = %message, "❌ Node reported transaction error");
                    return TransferOutcome::TransportError(TransportFailure::Status(message));
                }
            }
        }

        warn!("⚠️  Status stream closed before finalization");
        TransferOutcome::TransportError(TransportFailure::StreamClosed)
    }
}

fn ensure_signer<S: SigningIdentity>(request: &TransferRequest, signer: &S) -> TransferResult<()> {
    if signer.account_id() != request.sender {
        return Err(DomainError::SignerMismatch {
            signer: signer.account_id().to_hex(),
            sender: request.sender.to_hex(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Finalized event classification
// =============================================================================

/// Turn the events of a finalized extrinsic into an outcome.
///
/// `System.ExtrinsicFailed` always wins. Otherwise `System.ExtrinsicSuccess`
/// or `Balances.Transfer` means success, and a block with neither is decided
/// by `policy`.
pub fn classify_finalized(tx: FinalizedTx, policy: FinalityPolicy) -> TransferOutcome {
    let receipt = TransferReceipt {
        block_hash: tx.block_hash,
        extrinsic_hash: tx.extrinsic_hash,
        events: tx.events,
    };

    if let Some(failed) = receipt
        .events
        .iter()
        .find(|ev| ev.is("System", "ExtrinsicFailed"))
    {
        let reason = failure_reason(failed);
        return TransferOutcome::Failed { receipt, reason };
    }

    let succeeded = receipt
        .events
        .iter()
        .any(|ev| ev.is("System", "ExtrinsicSuccess") || ev.is("Balances", "Transfer"));
    if succeeded {
        return TransferOutcome::Success(receipt);
    }

    match policy {
        FinalityPolicy::AbsenceOfFailure => {
            warn!(
                block = %receipt.block_hash,
                "⚠️  No dispatch result event found, treating as success"
            );
            TransferOutcome::Success(receipt)
        }
        FinalityPolicy::RequireSuccessEvent => TransferOutcome::Failed {
            receipt,
            reason: "no dispatch result event observed".to_string(),
        },
    }
}

/// Human readable reason from an `ExtrinsicFailed` event.
///
/// Prefers a decoded `reason` added by the adapter, then the raw
/// `dispatch_error` value.
fn failure_reason(event: &ChainEvent) -> String {
    if let Some(reason) = event.data.get("reason").and_then(|v| v.as_str()) {
        return reason.to_string();
    }
    event
        .data
        .get("dispatch_error")
        .unwrap_or(&event.data)
        .to_string()
}
