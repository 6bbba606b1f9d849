//! Substrate RPC client: account queries, fee estimation and submission.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use subxt::backend::chain_head::{ChainHeadBackend, ChainHeadBackendBuilder};
use subxt::backend::rpc::RpcClient;
use subxt::config::polkadot::PolkadotExtrinsicParamsBuilder;
use subxt::error::DispatchError;
use subxt::ext::scale_value::Value;
use subxt::tx::{DynamicPayload, TxInBlock, TxStatus as SubxtTxStatus};
use subxt::{Metadata, OnlineClient, PolkadotConfig};
use tracing::{debug, info, instrument, trace};

use courier_core::error::{ChainError, ChainResult};
use courier_core::models::{AccountBalance, AccountId, BlockHash, ExtrinsicHash, TransferRequest};
use courier_core::ports::{
    ChainEvent, ChainInfo, ChainSource, FinalizedTx, TransferGateway, TxStatus, TxStatusStream,
};

use crate::identity::SubstrateIdentity;
use crate::value::{balance_from_account_info, composite_to_json, value_to_json};

/// Configuration for the Substrate client.
#[derive(Debug, Clone)]
pub struct SubstrateClientConfig {
    /// WebSocket URL (e.g., "ws://localhost:9944").
    pub ws_url: String,
}

impl Default for SubstrateClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:9944".to_string(),
        }
    }
}

type SubstrateTxInBlock = TxInBlock<PolkadotConfig, OnlineClient<PolkadotConfig>>;

/// Substrate client adapter implementing the [`ChainSource`] and
/// [`TransferGateway`] ports.
///
/// One connection per session. Pass it around behind an `Arc` and call
/// [`SubstrateClient::close`] once the session is over.
pub struct SubstrateClient {
    client: OnlineClient<PolkadotConfig>,
}

impl SubstrateClient {
    /// Connect to a Substrate node.
    #[instrument(skip_all, fields(url = %config.ws_url))]
    pub async fn connect(config: SubstrateClientConfig) -> ChainResult<Self> {
        debug!("Connecting to node");

        let rpc_client = RpcClient::from_url(&config.ws_url)
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;
        let backend: ChainHeadBackend<PolkadotConfig> =
            ChainHeadBackendBuilder::default().build_with_background_driver(rpc_client.clone());
        let client = OnlineClient::<PolkadotConfig>::from_backend(Arc::new(backend))
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;

        debug!("Connected successfully");

        Ok(Self { client })
    }

    /// Close the connection.
    ///
    /// The background driver stops once the last handle is dropped.
    pub fn close(self) {
        drop(self.client);
        info!("🔌 Disconnected from node");
    }
}

#[async_trait]
impl ChainSource for SubstrateClient {
    async fn chain_info(&self) -> ChainResult<ChainInfo> {
        let version = self.client.runtime_version();
        Ok(ChainInfo {
            genesis_hash: BlockHash(self.client.genesis_hash().0),
            spec_version: version.spec_version,
            transaction_version: version.transaction_version,
        })
    }

    #[instrument(skip_all, fields(account = %account))]
    async fn account_balance(&self, account: &AccountId) -> ChainResult<AccountBalance> {
        let query = subxt::dynamic::storage("System", "Account", vec![Value::from_bytes(account.0)]);

        let storage = self
            .client
            .storage()
            .at_latest()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;
        let Some(thunk) = storage
            .fetch(&query)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?
        else {
            trace!("Account not found, zero balance");
            return Ok(AccountBalance::default());
        };

        let info = thunk
            .to_value()
            .map_err(|e| ChainError::DecodingError(e.to_string()))?;
        balance_from_account_info(&value_to_json(&info))
    }
}

#[async_trait]
impl TransferGateway for SubstrateClient {
    type Signer = SubstrateIdentity;

    #[instrument(skip_all, fields(amount = request.amount))]
    async fn estimate_fee(
        &self,
        request: &TransferRequest,
        signer: &SubstrateIdentity,
    ) -> ChainResult<u128> {
        let call = transfer_call(request);
        let params = PolkadotExtrinsicParamsBuilder::<PolkadotConfig>::new().build();

        let tx = self
            .client
            .tx()
            .create_signed(&call, signer.keypair(), params)
            .await
            .map_err(|e| ChainError::SigningError(e.to_string()))?;

        tx.partial_fee_estimate()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    #[instrument(skip_all, fields(amount = request.amount))]
    async fn submit(
        &self,
        request: &TransferRequest,
        signer: &SubstrateIdentity,
    ) -> ChainResult<TxStatusStream> {
        let call = transfer_call(request);
        let params = PolkadotExtrinsicParamsBuilder::<PolkadotConfig>::new().build();

        let progress = self
            .client
            .tx()
            .sign_and_submit_then_watch(&call, signer.keypair(), params)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        debug!(
            extrinsic = %hex::encode(progress.extrinsic_hash().0),
            "Watching transaction"
        );

        let metadata = self.client.metadata();
        let stream = progress.then(move |result| {
            let metadata = metadata.clone();
            async move {
                match result {
                    Ok(status) => map_status(status, &metadata).await,
                    Err(e) => Err(ChainError::SubscriptionError(e.to_string())),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

// =============================================================================
// Call construction
// =============================================================================

/// `Utility.batch_all([Balances.transfer_keep_alive, System.remark_with_event])`.
///
/// Batching records the memo on chain in the same extrinsic as the transfer:
/// either both apply or neither does.
fn transfer_call(request: &TransferRequest) -> DynamicPayload {
    let transfer = Value::unnamed_variant(
        "Balances",
        [Value::named_variant(
            "transfer_keep_alive",
            [
                (
                    "dest",
                    Value::unnamed_variant("Id", [Value::from_bytes(request.recipient.0)]),
                ),
                ("value", Value::u128(request.amount)),
            ],
        )],
    );
    let remark = Value::unnamed_variant(
        "System",
        [Value::named_variant(
            "remark_with_event",
            [("remark", Value::from_bytes(request.memo.as_bytes()))],
        )],
    );

    subxt::dynamic::tx(
        "Utility",
        "batch_all",
        vec![Value::unnamed_composite([transfer, remark])],
    )
}

// =============================================================================
// Status mapping
// =============================================================================

/// Map a subxt status onto the domain status.
async fn map_status(
    status: SubxtTxStatus<PolkadotConfig, OnlineClient<PolkadotConfig>>,
    metadata: &Metadata,
) -> ChainResult<TxStatus> {
    let status = match status {
        SubxtTxStatus::Validated => TxStatus::Ready,
        SubxtTxStatus::Broadcasted { .. } => TxStatus::Broadcast,
        SubxtTxStatus::NoLongerInBestBlock => TxStatus::Retracted { block_hash: None },
        SubxtTxStatus::InBestBlock(tx) => TxStatus::InBlock {
            block_hash: BlockHash(tx.block_hash().0),
        },
        SubxtTxStatus::InFinalizedBlock(tx) => TxStatus::Finalized(FinalizedTx {
            block_hash: BlockHash(tx.block_hash().0),
            extrinsic_hash: ExtrinsicHash(tx.extrinsic_hash().0),
            events: decode_tx_events(&tx, metadata).await?,
        }),
        SubxtTxStatus::Error { message } => TxStatus::Error { message },
        SubxtTxStatus::Invalid { message } => TxStatus::Error {
            message: format!("Invalid: {}", message),
        },
        SubxtTxStatus::Dropped { message } => TxStatus::Error {
            message: format!("Dropped: {}", message),
        },
    };
    Ok(status)
}

/// Decode the events emitted by one extrinsic.
///
/// `System.ExtrinsicFailed` events get an extra `reason` field with the
/// dispatch error resolved against the runtime metadata.
async fn decode_tx_events(
    tx: &SubstrateTxInBlock,
    metadata: &Metadata,
) -> ChainResult<Vec<ChainEvent>> {
    let events = tx
        .fetch_events()
        .await
        .map_err(|e| ChainError::RpcError(e.to_string()))?;

    let mut decoded = Vec::new();
    for event in events.iter() {
        let ev = match event {
            Ok(ev) => ev,
            Err(e) => {
                trace!(error = ?e, "Failed to decode event");
                continue;
            }
        };

        let pallet = ev.pallet_name().to_string();
        let name = ev.variant_name().to_string();
        let mut data = ev
            .field_values()
            .map(|composite| composite_to_json(&composite))
            .unwrap_or(serde_json::Value::Null);

        if pallet == "System" && name == "ExtrinsicFailed" {
            let reason = DispatchError::decode_from(ev.field_bytes(), metadata.clone())
                .map(|err| err.to_string());
            match (reason, &mut data) {
                (Ok(reason), serde_json::Value::Object(fields)) => {
                    fields.insert("reason".to_string(), serde_json::Value::String(reason));
                }
                (Err(e), _) => trace!(error = ?e, "Could not decode dispatch error"),
                _ => {}
            }
        }

        decoded.push(ChainEvent {
            index: ev.index(),
            pallet,
            name,
            data,
        });
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::models::Memo;

    #[test]
    fn test_transfer_call_targets_batch_all() {
        let request = TransferRequest {
            sender: AccountId([1; 32]),
            recipient: AccountId([2; 32]),
            amount: 100_000,
            memo: Memo::new("Example transfer with memo").unwrap(),
        };

        let call = transfer_call(&request);
        assert_eq!(call.pallet_name(), "Utility");
        assert_eq!(call.call_name(), "batch_all");

        let args = serde_json::Value::Array(
            call.call_data()
                .values()
                .map(value_to_json)
                .collect(),
        );
        let text = args.to_string();
        assert!(text.contains("transfer_keep_alive"));
        assert!(text.contains("remark_with_event"));
        assert!(text.contains(&"02".repeat(32)));
        assert!(text.contains("\"100000\""));
        assert!(text.contains(&hex::encode(request.memo.as_bytes())));
    }

    #[test]
    fn test_default_config_points_at_local_node() {
        assert_eq!(SubstrateClientConfig::default().ws_url, "ws://127.0.0.1:9944");
    }
}
