//! Core domain layer for the Courier transfer client.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! services for submitting a memo-tagged transfer to a Substrate chain and
//! following it to finality. It follows hexagonal architecture principles:
//! this is the innermost layer with no dependency on the chain client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     courier (binary)                        │
//! │            (CLI, logging, signals, exit codes)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   courier-substrate                         │
//! │              (subxt RPC, sr25519 identities)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     courier-core  ← YOU ARE HERE            │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (AccountId, Memo, TransferRequest, outcomes)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Balance reporting, transfer orchestration, session pipeline
//! - [`error`] - Domain error types
//! - [`metrics`] - Metrics definitions
//!
//! # Ports
//!
//! - [`ports::ChainSource`] - Chain identity and account balances
//! - [`ports::TransferGateway`] - Fee estimation, submission, status stream
//! - [`ports::SigningIdentity`] - Public side of a signing key pair
//!
//! # Transfer Lifecycle
//!
//! 1. Fetch sender and recipient balances concurrently
//! 2. Encode the memo into its 32-byte field
//! 3. Estimate the fee
//! 4. Submit and consume status notifications until finalized or error
//! 5. Classify the finalized events into success or failure

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
