//! sr25519 identities derived from secret URIs.

use std::str::FromStr;

use subxt::utils::AccountId32;
use subxt_signer::SecretUri;
use subxt_signer::sr25519::Keypair;

use courier_core::error::{ChainError, ChainResult};
use courier_core::models::{AccountId, Party};
use courier_core::ports::SigningIdentity;

/// A signing key pair.
///
/// Derived deterministically from a secret URI: a dev path such as
/// `//Alice`, or a mnemonic with optional derivation path and password.
pub struct SubstrateIdentity {
    keypair: Keypair,
}

impl SubstrateIdentity {
    /// Derive a key pair from a secret URI.
    pub fn from_uri(uri: &str) -> ChainResult<Self> {
        let uri =
            SecretUri::from_str(uri).map_err(|e| ChainError::InvalidIdentity(e.to_string()))?;
        let keypair =
            Keypair::from_uri(&uri).map_err(|e| ChainError::InvalidIdentity(e.to_string()))?;
        Ok(Self { keypair })
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl SigningIdentity for SubstrateIdentity {
    fn account_id(&self) -> AccountId {
        AccountId(self.keypair.public_key().0)
    }

    fn address(&self) -> String {
        ss58_address(&self.account_id())
    }
}

// Never print key material
impl std::fmt::Debug for SubstrateIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateIdentity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// SS58 address (generic substrate prefix) of an account.
pub fn ss58_address(account: &AccountId) -> String {
    AccountId32::from(account.0).to_string()
}

/// Parse an SS58 address into a balance lookup target.
pub fn parse_party(label: &str, address: &str) -> ChainResult<Party> {
    let account = AccountId32::from_str(address)
        .map_err(|e| ChainError::InvalidIdentity(format!("{}: {}", address, e)))?;
    let account = AccountId(account.0);
    Ok(Party {
        label: label.to_string(),
        account,
        address: ss58_address(&account),
    })
}
