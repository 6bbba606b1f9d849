//! Port trait for signing identities.

use crate::models::{AccountId, Party};

/// A key pair able to sign transfers.
///
/// Key material never leaves the implementation; the domain only sees the
/// public account.
pub trait SigningIdentity: Send + Sync {
    /// Public account of the key pair.
    fn account_id(&self) -> AccountId;

    /// SS58 address of the key pair.
    fn address(&self) -> String;

    /// Display record for balance reporting.
    fn party(&self, label: &str) -> Party {
        Party {
            label: label.to_string(),
            account: self.account_id(),
            address: self.address(),
        }
    }
}
