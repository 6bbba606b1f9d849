//! Terminal results of a submitted transfer.

use serde::Serialize;

use crate::error::TransportFailure;
use crate::models::{BlockHash, ExtrinsicHash};
use crate::ports::ChainEvent;

/// Where a finalized transfer landed and what it emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReceipt {
    pub block_hash: BlockHash,
    pub extrinsic_hash: ExtrinsicHash,
    /// Events emitted by the extrinsic, in block order.
    pub events: Vec<ChainEvent>,
}

/// Exactly one of these is produced per submission.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Finalized and not reported as failed.
    Success(TransferReceipt),
    /// Finalized, but the network reported the extrinsic as failed.
    Failed {
        receipt: TransferReceipt,
        reason: String,
    },
    /// The result is unknown.
    TransportError(TransportFailure),
}

impl TransferOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failed { .. } => "failed",
            Self::TransportError(_) => "transport_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn receipt(&self) -> Option<&TransferReceipt> {
        match self {
            Self::Success(receipt) | Self::Failed { receipt, .. } => Some(receipt),
            Self::TransportError(_) => None,
        }
    }
}
