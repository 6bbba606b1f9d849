//! Substrate RPC adapter for the Courier transfer client.
//!
//! This crate implements the [`ChainSource`] and [`TransferGateway`] ports
//! from `courier-core` on top of subxt, and the [`SigningIdentity`] port on
//! top of subxt-signer sr25519 key pairs.
//!
//! # Features
//!
//! - Chain-head backend over WebSocket RPC
//! - Dynamic (metadata-driven) storage queries and calls, no codegen
//! - Transfer and memo submitted atomically via `Utility.batch_all`
//! - Dispatch errors of failed extrinsics resolved against runtime metadata
//!
//! # Usage
//!
//! ```ignore
//! use courier_substrate::{SubstrateClient, SubstrateClientConfig, SubstrateIdentity};
//!
//! let client = SubstrateClient::connect(SubstrateClientConfig::default()).await?;
//! let alice = SubstrateIdentity::from_uri("//Alice")?;
//! let balance = client.account_balance(&alice.account_id()).await?;
//! client.close();
//! ```
//!
//! [`ChainSource`]: courier_core::ports::ChainSource
//! [`TransferGateway`]: courier_core::ports::TransferGateway
//! [`SigningIdentity`]: courier_core::ports::SigningIdentity

mod client;
mod identity;
mod value;

pub use client::{SubstrateClient, SubstrateClientConfig};
pub use identity::{SubstrateIdentity, parse_party, ss58_address};
