//! Port trait for read-only chain state.
//!
//! This trait defines the interface for querying chain identity and account
//! state from a Substrate node. Implementations live in the infrastructure
//! layer (e.g., `courier-substrate`).

use async_trait::async_trait;

use crate::error::ChainResult;
use crate::models::{AccountBalance, AccountId, BlockHash};

/// Identity of the connected chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub genesis_hash: BlockHash,
    /// Runtime `spec_version`.
    pub spec_version: u32,
    /// Runtime `transaction_version`.
    pub transaction_version: u32,
}

/// Port trait for account and chain queries.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Get the genesis hash and runtime version of the connected chain.
    async fn chain_info(&self) -> ChainResult<ChainInfo>;

    /// Get the balance of an account at the latest block.
    ///
    /// Accounts that do not exist on chain have a zero balance.
    async fn account_balance(&self, account: &AccountId) -> ChainResult<AccountBalance>;
}
