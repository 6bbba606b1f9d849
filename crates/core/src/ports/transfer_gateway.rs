//! Port trait for submitting transfers and watching their progress.
//!
//! The gateway hands back status notifications as a stream rather than a
//! callback. Dropping the stream unsubscribes from the node.

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

use crate::error::ChainResult;
use crate::models::{BlockHash, ExtrinsicHash, TransferRequest};
use crate::ports::SigningIdentity;

/// Event emitted by a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEvent {
    /// Index in block.
    pub index: u32,
    /// Pallet name.
    pub pallet: String,
    /// Event variant name.
    pub name: String,
    /// Event data as JSON.
    pub data: serde_json::Value,
}

impl ChainEvent {
    /// Whether this is `pallet.name`.
    pub fn is(&self, pallet: &str, name: &str) -> bool {
        self.pallet == pallet && self.name == name
    }
}

/// A transaction that reached a finalized block.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedTx {
    pub block_hash: BlockHash,
    pub extrinsic_hash: ExtrinsicHash,
    /// Events emitted by this extrinsic only.
    pub events: Vec<ChainEvent>,
}

/// One status notification for a submitted transaction.
///
/// For a single transaction notifications arrive in lifecycle order:
/// `Ready`, `Broadcast`, `InBlock`, `Finalized`. `Error` may arrive at
/// any point and is terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum TxStatus {
    /// Validated and in the pool.
    Ready,
    /// Gossiped to peers.
    Broadcast,
    /// Included in a best block. Not final.
    InBlock { block_hash: BlockHash },
    /// The including block is no longer the best block.
    Retracted { block_hash: Option<BlockHash> },
    /// Included in a finalized block.
    Finalized(FinalizedTx),
    /// Error, invalid or dropped.
    Error { message: String },
}

impl TxStatus {
    /// Short name for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Broadcast => "broadcast",
            Self::InBlock { .. } => "in_block",
            Self::Retracted { .. } => "retracted",
            Self::Finalized(_) => "finalized",
            Self::Error { .. } => "error",
        }
    }
}

/// Stream of status notifications for one submission.
pub type TxStatusStream = Pin<Box<dyn Stream<Item = ChainResult<TxStatus>> + Send>>;

/// Port trait for transfer construction and submission.
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Key pair type this gateway signs with.
    type Signer: SigningIdentity;

    /// Estimate the partial fee of `request` against current chain state.
    ///
    /// Read-only: nothing is submitted.
    async fn estimate_fee(&self, request: &TransferRequest, signer: &Self::Signer)
    -> ChainResult<u128>;

    /// Build, sign and submit `request`, returning its status stream.
    ///
    /// Each call fetches a fresh nonce.
    async fn submit(
        &self,
        request: &TransferRequest,
        signer: &Self::Signer,
    ) -> ChainResult<TxStatusStream>;
}
