//! One complete transfer session.
//!
//! Check balances, encode the memo, estimate the fee, submit, follow the
//! transfer to finality and report. The connection itself is owned by the
//! caller and passed in as the port implementations.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{DomainError, TransferError, TransferResult};
use crate::models::{AccountBalance, Memo, Party, TransferOutcome, TransferReceipt, TransferRequest};
use crate::ports::{ChainInfo, ChainSource, SigningIdentity, TransferGateway};
use crate::services::balances::{BalanceReporter, TokenFormat, format_balance, has_sufficient_balance};
use crate::services::transfer::{TransferConfig, TransferService};

// =============================================================================
// Configuration
// =============================================================================

/// What to transfer and how to report it.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Amount in planck.
    pub amount: u128,
    /// Memo text (at most 32 UTF-8 bytes).
    pub memo: String,
    pub token: TokenFormat,
    /// Fail before submitting when the sender cannot cover the amount.
    pub abort_on_insufficient: bool,
    /// Report both balances again after a successful transfer.
    pub report_final_balances: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            amount: 100_000,
            memo: "Example transfer with memo".to_string(),
            token: TokenFormat::default(),
            abort_on_insufficient: false,
            report_final_balances: true,
        }
    }
}

/// Everything observed during a successful session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub chain: ChainInfo,
    pub memo: Memo,
    pub fee: u128,
    /// Sender and recipient balances before the transfer.
    pub balances_before: [AccountBalance; 2],
    /// Sender and recipient balances after finalization, if requested.
    pub balances_after: Option<[AccountBalance; 2]>,
    pub receipt: TransferReceipt,
}

// =============================================================================
// TransferSession
// =============================================================================

/// Runs the transfer pipeline against a connected chain.
pub struct TransferSession<C: ChainSource, G: TransferGateway> {
    config: SessionConfig,
    chain: Arc<C>,
    balances: BalanceReporter<C>,
    transfers: TransferService<G>,
}

impl<C: ChainSource, G: TransferGateway> TransferSession<C, G> {
    pub fn new(
        config: SessionConfig,
        transfer_config: TransferConfig,
        chain: Arc<C>,
        gateway: Arc<G>,
    ) -> Self {
        let balances = BalanceReporter::new(chain.clone(), config.token.clone());
        let transfers = TransferService::new(transfer_config, gateway);
        Self {
            config,
            chain,
            balances,
            transfers,
        }
    }

    /// Transfer `config.amount` from `sender` to `recipient`.
    ///
    /// A finalized failure becomes [`TransferError::TransactionFailed`], an
    /// unknown result becomes [`TransferError::TransportError`].
    pub async fn run(
        &self,
        sender: &G::Signer,
        sender_label: &str,
        recipient: &Party,
    ) -> TransferResult<SessionReport> {
        let token = &self.config.token;

        let chain = self
            .chain
            .chain_info()
            .await
            .map_err(TransferError::ConnectionError)?;
        info!(
            genesis = %hex::encode(&chain.genesis_hash.0[..8]),
            runtime = chain.spec_version,
            tx_version = chain.transaction_version,
            "🔗 Chain connected"
        );

        // ─────────────────────────────────────────────────────────────────────
        // 💰 BALANCES
        // ─────────────────────────────────────────────────────────────────────
        let sender_party = sender.party(sender_label);
        let balances_before = self
            .balances
            .fetch_balances([&sender_party, recipient])
            .await?;

        let available = balances_before[0].free;
        if !has_sufficient_balance(available, self.config.amount) {
            warn!(
                available = %format_balance(available, token),
                required = %format_balance(self.config.amount, token),
                "⚠️  Sender balance does not cover the transfer"
            );
            if self.config.abort_on_insufficient {
                return Err(DomainError::InsufficientBalance {
                    available,
                    required: self.config.amount,
                }
                .into());
            }
        }

        // ─────────────────────────────────────────────────────────────────────
        // 📝 REQUEST
        // ─────────────────────────────────────────────────────────────────────
        let memo = Memo::new(&self.config.memo)?;
        info!(hex = %memo.to_hex(), "📝 Memo: \"{}\"", memo);

        let request = TransferRequest {
            sender: sender_party.account,
            recipient: recipient.account,
            amount: self.config.amount,
            memo,
        };

        let fee = self.transfers.estimate_fee(&request, sender).await?;
        info!(fee, "💸 Estimated fee: {}", format_balance(fee, token));

        // ─────────────────────────────────────────────────────────────────────
        // 🚀 SUBMIT & TRACK
        // ─────────────────────────────────────────────────────────────────────
        info!(
            from = %sender_party.address,
            to = %recipient.address,
            "🚀 Sending {}",
            format_balance(request.amount, token)
        );
        let outcome = self.transfers.submit_and_track(&request, sender).await?;

        if let Some(receipt) = outcome.receipt() {
            log_events(receipt);
        }

        let receipt = match outcome {
            TransferOutcome::Success(receipt) => {
                info!(
                    block = %receipt.block_hash,
                    extrinsic = %receipt.extrinsic_hash,
                    "✅ Transfer finalized"
                );
                receipt
            }
            TransferOutcome::Failed { receipt, reason } => {
                return Err(TransferError::TransactionFailed {
                    block_hash: receipt.block_hash.to_hex(),
                    reason,
                });
            }
            TransferOutcome::TransportError(failure) => return Err(failure.into()),
        };

        let balances_after = if self.config.report_final_balances {
            info!("💰 Balances after transfer");
            Some(
                self.balances
                    .fetch_balances([&sender_party, recipient])
                    .await?,
            )
        } else {
            None
        };

        Ok(SessionReport {
            chain,
            memo,
            fee,
            balances_before,
            balances_after,
            receipt,
        })
    }
}

fn log_events(receipt: &TransferReceipt) {
    for ev in &receipt.events {
        info!(index = ev.index, data = %ev.data, "   📣 {}.{}", ev.pallet, ev.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChainError, ChainResult, TransportFailure};
    use crate::models::{AccountId, BlockHash, ExtrinsicHash};
    use crate::ports::{ChainEvent, FinalizedTx, TxStatus, TxStatusStream};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ALICE: AccountId = AccountId([1; 32]);
    const BOB: AccountId = AccountId([2; 32]);

    struct DevSigner(AccountId, &'static str);

    impl SigningIdentity for DevSigner {
        fn account_id(&self) -> AccountId {
            self.0
        }

        fn address(&self) -> String {
            self.1.to_string()
        }
    }

    /// In-memory chain: serves balances and applies a transfer on finalization.
    struct MockChain {
        balances: Mutex<HashMap<AccountId, u128>>,
        final_events: Vec<ChainEvent>,
        statuses_before_final: Vec<TxStatus>,
        submissions: AtomicUsize,
        fee_estimates: AtomicUsize,
    }

    impl MockChain {
        fn new(final_events: Vec<ChainEvent>) -> Self {
            Self {
                balances: Mutex::new(HashMap::from([
                    (ALICE, 216_720_200_000_000),
                    (BOB, 100_000_000_000_000),
                ])),
                final_events,
                statuses_before_final: vec![
                    TxStatus::Ready,
                    TxStatus::Broadcast,
                    TxStatus::InBlock {
                        block_hash: BlockHash([0xaa; 32]),
                    },
                ],
                submissions: AtomicUsize::new(0),
                fee_estimates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainSource for MockChain {
        async fn chain_info(&self) -> ChainResult<ChainInfo> {
            Ok(ChainInfo {
                genesis_hash: BlockHash([0x91; 32]),
                spec_version: 1_002_000,
                transaction_version: 26,
            })
        }

        async fn account_balance(&self, account: &AccountId) -> ChainResult<AccountBalance> {
            let balances = self.balances.lock().unwrap();
            Ok(AccountBalance {
                free: balances.get(account).copied().unwrap_or_default(),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl TransferGateway for MockChain {
        type Signer = DevSigner;

        async fn estimate_fee(&self, _: &TransferRequest, _: &DevSigner) -> ChainResult<u128> {
            self.fee_estimates.fetch_add(1, Ordering::SeqCst);
            Ok(15_729_000_117)
        }

        async fn submit(&self, request: &TransferRequest, _: &DevSigner) -> ChainResult<TxStatusStream> {
            self.submissions.fetch_add(1, Ordering::SeqCst);

            let failed = self.final_events.iter().any(|e| e.is("System", "ExtrinsicFailed"));
            if !failed {
                let mut balances = self.balances.lock().unwrap();
                let from = balances.entry(request.sender).or_default();
                *from = from.saturating_sub(request.amount);
                *balances.entry(request.recipient).or_default() += request.amount;
            }

            let mut statuses: Vec<ChainResult<TxStatus>> =
                self.statuses_before_final.iter().cloned().map(Ok).collect();
            statuses.push(Ok(TxStatus::Finalized(FinalizedTx {
                block_hash: BlockHash([0xbb; 32]),
                extrinsic_hash: ExtrinsicHash([0xee; 32]),
                events: self.final_events.clone(),
            })));
            Ok(Box::pin(futures::stream::iter(statuses)))
        }
    }

    fn transfer_event() -> ChainEvent {
        ChainEvent {
            index: 3,
            pallet: "Balances".into(),
            name: "Transfer".into(),
            data: json!({"from": ALICE.to_hex(), "to": BOB.to_hex(), "amount": "100000"}),
        }
    }

    fn bob() -> Party {
        Party {
            label: "Bob".into(),
            account: BOB,
            address: "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty".into(),
        }
    }

    fn alice() -> DevSigner {
        DevSigner(ALICE, "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY")
    }

    fn session(chain: Arc<MockChain>, config: SessionConfig) -> TransferSession<MockChain, MockChain> {
        TransferSession::new(config, TransferConfig::default(), chain.clone(), chain)
    }

    #[tokio::test]
    async fn test_end_to_end_transfer_with_memo() {
        let chain = Arc::new(MockChain::new(vec![transfer_event()]));
        let session = session(chain.clone(), SessionConfig::default());

        let report = session.run(&alice(), "Alice", &bob()).await.unwrap();

        let token = TokenFormat::default();
        assert_eq!(format_balance(report.balances_before[0].free, &token), "216.7202 UNIT");
        assert_eq!(format_balance(report.balances_before[1].free, &token), "100.0000 UNIT");
        assert_eq!(report.memo.as_bytes().len(), 32);
        assert_eq!(report.memo.as_text(), "Example transfer with memo");
        assert!(report.fee > 0);
        assert_eq!(report.receipt.block_hash, BlockHash([0xbb; 32]));

        let after = report.balances_after.unwrap();
        assert_eq!(after[0].free, 216_720_200_000_000 - 100_000);
        assert_eq!(after[1].free, 100_000_000_100_000);
        assert_eq!(chain.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_transfer_maps_to_transaction_failed() {
        let failed = ChainEvent {
            index: 2,
            pallet: "System".into(),
            name: "ExtrinsicFailed".into(),
            data: json!({"reason": "Balances.InsufficientBalance"}),
        };
        let chain = Arc::new(MockChain::new(vec![failed]));

        let err = session(chain, SessionConfig::default())
            .run(&alice(), "Alice", &bob())
            .await
            .unwrap_err();

        match err {
            TransferError::TransactionFailed { reason, block_hash } => {
                assert_eq!(reason, "Balances.InsufficientBalance");
                assert_eq!(block_hash, BlockHash([0xbb; 32]).to_hex());
            }
            other => panic!("expected TransactionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_warns_by_default() {
        let chain = Arc::new(MockChain::new(vec![transfer_event()]));
        chain.balances.lock().unwrap().insert(ALICE, 10);
        let config = SessionConfig {
            amount: 100,
            report_final_balances: false,
            ..Default::default()
        };

        // Insufficient is only a warning: the transfer is still submitted
        let chain_for_run = chain.clone();
        let result = session(chain_for_run, config).run(&alice(), "Alice", &bob()).await;
        assert!(result.is_ok());
        assert_eq!(chain.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_aborts_when_hardened() {
        let chain = Arc::new(MockChain::new(vec![transfer_event()]));
        chain.balances.lock().unwrap().insert(ALICE, 10);
        let config = SessionConfig {
            amount: 100,
            abort_on_insufficient: true,
            ..Default::default()
        };

        let err = session(chain.clone(), config)
            .run(&alice(), "Alice", &bob())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::Domain(DomainError::InsufficientBalance {
                available: 10,
                required: 100
            })
        ));
        assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_long_memo_fails_before_fee_estimation() {
        let chain = Arc::new(MockChain::new(vec![transfer_event()]));
        let config = SessionConfig {
            memo: "x".repeat(40),
            ..Default::default()
        };

        let err = session(chain.clone(), config)
            .run(&alice(), "Alice", &bob())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::Domain(DomainError::MemoTooLong { max: 32, actual: 40 })
        ));
        assert_eq!(chain.fee_estimates.load(Ordering::SeqCst), 0);
        assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_as_error() {
        let mut mock = MockChain::new(vec![transfer_event()]);
        mock.statuses_before_final = vec![
            TxStatus::Ready,
            TxStatus::Error {
                message: "Dropped: pool full".into(),
            },
        ];
        let chain = Arc::new(mock);

        let err = session(chain, SessionConfig::default())
            .run(&alice(), "Alice", &bob())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::TransportError(TransportFailure::Status(_))
        ));
    }

    #[test]
    fn test_chain_error_is_not_domain_error() {
        let err = TransferError::ConnectionError(ChainError::ConnectionFailed("refused".into()));
        assert!(err.to_string().contains("refused"));
    }
}
