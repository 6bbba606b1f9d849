//! Domain models for a memo-tagged transfer.
//!
//! These models are chain-library agnostic and represent the canonical
//! form of transfer data within the domain layer.

mod memo;
mod outcome;

pub use memo::{MEMO_LENGTH, Memo, encode_memo};
pub use outcome::{TransferOutcome, TransferReceipt};

use serde::{Deserialize, Serialize};

// =============================================================================
// 32-byte Hash Types
// =============================================================================

/// Macro to generate 32-byte hash newtypes with common functionality.
///
/// Generates:
/// - `from_hex()` - Parse from hex string (with or without 0x prefix)
/// - `to_hex()` - Convert to 0x-prefixed hex string
/// - `Display` trait implementation
/// - `From<[u8; 32]>` implementation
/// - `Serialize` / `Deserialize` as the 0x-prefixed hex string
macro_rules! hash32_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Parse from hex string (with or without 0x prefix).
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            /// Convert to 0x-prefixed hex string.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Get the inner bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hash32_newtype!(
    /// 32-byte block hash (Blake2-256).
    BlockHash
);

hash32_newtype!(
    /// 32-byte extrinsic hash (Blake2-256 of the encoded extrinsic).
    ExtrinsicHash
);

hash32_newtype!(
    /// 32-byte account identifier (SS58 decoded public key).
    AccountId
);

// =============================================================================
// Accounts & Balances
// =============================================================================

/// A balance lookup target with its display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    /// Human label (e.g., "Alice").
    pub label: String,
    /// Raw account identifier.
    pub account: AccountId,
    /// SS58 address for display.
    pub address: String,
}

/// Account balance as stored in `System.Account`.
///
/// All amounts are in planck. Formatting for display never feeds back into
/// these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
}

// =============================================================================
// Transfer Request
// =============================================================================

/// A single transfer to submit.
///
/// Built fresh for every submission attempt: a new request gets a new nonce
/// when signed, so resubmitting after a transport error never replays the
/// same signed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Sending account (must match the signer).
    pub sender: AccountId,
    /// Receiving account.
    pub recipient: AccountId,
    /// Amount in planck.
    pub amount: u128,
    /// Fixed-width memo attached to the transfer.
    pub memo: Memo,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_hex_roundtrip() {
        let hex = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let hash = BlockHash::from_hex(hex).unwrap();
        assert_eq!(hash.to_hex(), hex);
    }

    #[test]
    fn account_id_without_prefix() {
        let hex = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
        let account = AccountId::from_hex(hex).unwrap();
        assert_eq!(account.to_hex(), format!("0x{}", hex));
    }

    #[test]
    fn hash32_serializes_as_hex_string() {
        let hash = BlockHash([0xbb; 32]);
        let json = serde_json::to_value(hash).unwrap();
        assert_eq!(json, serde_json::json!(format!("0x{}", "bb".repeat(32))));

        let back: BlockHash = serde_json::from_value(json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<AccountId>("[1,2,3]").is_err());
    }

    #[test]
    fn hash32_invalid_length() {
        assert!(ExtrinsicHash::from_hex("0x1234").is_err());
    }
}
