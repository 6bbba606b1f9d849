//! Balance lookups and display formatting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TransferError, TransferResult};
use crate::models::{AccountBalance, Party};
use crate::ports::ChainSource;

/// Fractional digits shown by [`format_balance`].
pub const DISPLAY_DECIMALS: u32 = 4;

/// Native token display parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFormat {
    /// Number of decimals between planck and one unit.
    pub decimals: u8,
    /// Ticker symbol.
    pub symbol: String,
}

impl Default for TokenFormat {
    fn default() -> Self {
        Self {
            decimals: 12,
            symbol: "UNIT".to_string(),
        }
    }
}

/// Render a planck amount as `whole.frac SYMBOL` with [`DISPLAY_DECIMALS`]
/// fractional digits, truncating.
///
/// Display only. Never parse the result back into an amount.
pub fn format_balance(raw: u128, token: &TokenFormat) -> String {
    let decimals = u32::from(token.decimals);
    let Some(base) = 10u128.checked_pow(decimals) else {
        return format!("{} planck", raw);
    };

    let whole = raw / base;
    let frac = raw % base;
    let shown = if decimals >= DISPLAY_DECIMALS {
        frac / 10u128.pow(decimals - DISPLAY_DECIMALS)
    } else {
        frac * 10u128.pow(DISPLAY_DECIMALS - decimals)
    };

    format!(
        "{}.{:0width$} {}",
        whole,
        shown,
        token.symbol,
        width = DISPLAY_DECIMALS as usize
    )
}

/// Whether `balance` covers `amount`. Both in planck.
pub fn has_sufficient_balance(balance: u128, amount: u128) -> bool {
    balance >= amount
}

/// Fetches and reports balances for two parties.
pub struct BalanceReporter<C: ChainSource> {
    source: Arc<C>,
    token: TokenFormat,
}

impl<C: ChainSource> BalanceReporter<C> {
    pub fn new(source: Arc<C>, token: TokenFormat) -> Self {
        Self { source, token }
    }

    /// Look up both balances concurrently and log them.
    ///
    /// Any lookup failure fails the whole call; there is no retry.
    pub async fn fetch_balances(&self, parties: [&Party; 2]) -> TransferResult<[AccountBalance; 2]> {
        let [a, b] = parties;
        debug!(a = %a.address, b = %b.address, "Fetching balances");

        let (balance_a, balance_b) = futures::try_join!(
            self.source.account_balance(&a.account),
            self.source.account_balance(&b.account),
        )
        .map_err(TransferError::BalanceQueryFailed)?;

        for (party, balance) in [(a, &balance_a), (b, &balance_b)] {
            info!(
                address = %party.address,
                free = balance.free,
                "   💰 {}: {}",
                party.label,
                format_balance(balance.free, &self.token)
            );
        }

        Ok([balance_a, balance_b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChainError, ChainResult};
    use crate::models::AccountId;
    use crate::ports::ChainInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MockSource {
        balances: HashMap<AccountId, u128>,
        fail_for: Option<AccountId>,
    }

    #[async_trait]
    impl ChainSource for MockSource {
        async fn chain_info(&self) -> ChainResult<ChainInfo> {
            Ok(ChainInfo {
                genesis_hash: [0; 32].into(),
                spec_version: 1,
                transaction_version: 1,
            })
        }

        async fn account_balance(&self, account: &AccountId) -> ChainResult<AccountBalance> {
            if self.fail_for.as_ref() == Some(account) {
                return Err(ChainError::RpcError("state unavailable".into()));
            }
            Ok(AccountBalance {
                free: self.balances.get(account).copied().unwrap_or_default(),
                ..Default::default()
            })
        }
    }

    fn party(label: &str, byte: u8) -> Party {
        Party {
            label: label.to_string(),
            account: AccountId([byte; 32]),
            address: format!("addr-{}", byte),
        }
    }

    #[test]
    fn test_format_balance_truncates_to_four_digits() {
        let token = TokenFormat::default();
        assert_eq!(format_balance(216_720_200_000_000, &token), "216.7202 UNIT");
        assert_eq!(format_balance(216_720_299_999_999, &token), "216.7202 UNIT");
        assert_eq!(format_balance(100_000_000_000_000, &token), "100.0000 UNIT");
        assert_eq!(format_balance(100_000, &token), "0.0000 UNIT");
        assert_eq!(format_balance(0, &token), "0.0000 UNIT");
    }

    #[test]
    fn test_format_balance_few_decimals() {
        let token = TokenFormat {
            decimals: 2,
            symbol: "DOT".into(),
        };
        assert_eq!(format_balance(12_345, &token), "123.4500 DOT");

        let token = TokenFormat {
            decimals: 0,
            symbol: "X".into(),
        };
        assert_eq!(format_balance(7, &token), "7.0000 X");
    }

    #[test]
    fn test_format_balance_large_values() {
        let token = TokenFormat {
            decimals: 18,
            symbol: "ETH".into(),
        };
        let formatted = format_balance(u128::MAX, &token);
        assert!(formatted.starts_with("340282366920938463463.3746"));
    }

    #[test]
    fn test_has_sufficient_balance_boundaries() {
        assert!(has_sufficient_balance(100, 100));
        assert!(has_sufficient_balance(101, 100));
        assert!(!has_sufficient_balance(99, 100));
        assert!(has_sufficient_balance(0, 0));
        assert!(!has_sufficient_balance(0, 1));
        assert!(has_sufficient_balance(u128::MAX, u128::MAX));
    }

    #[tokio::test]
    async fn test_fetch_balances_returns_in_party_order() {
        let alice = party("Alice", 1);
        let bob = party("Bob", 2);
        let source = MockSource {
            balances: HashMap::from([(alice.account, 216_720_200_000_000), (bob.account, 100)]),
            fail_for: None,
        };
        let reporter = BalanceReporter::new(Arc::new(source), TokenFormat::default());

        let [a, b] = reporter.fetch_balances([&alice, &bob]).await.unwrap();
        assert_eq!(a.free, 216_720_200_000_000);
        assert_eq!(b.free, 100);

        let [b, a] = reporter.fetch_balances([&bob, &alice]).await.unwrap();
        assert_eq!(b.free, 100);
        assert_eq!(a.free, 216_720_200_000_000);
    }

    #[tokio::test]
    async fn test_fetch_balances_propagates_lookup_failure() {
        let alice = party("Alice", 1);
        let bob = party("Bob", 2);
        let source = MockSource {
            balances: HashMap::new(),
            fail_for: Some(bob.account),
        };
        let reporter = BalanceReporter::new(Arc::new(source), TokenFormat::default());

        let err = reporter.fetch_balances([&alice, &bob]).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::BalanceQueryFailed(ChainError::RpcError(_))
        ));
    }
}
