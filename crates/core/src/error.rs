//! Error types for the transfer client.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Local validation and business rule errors
//! - [`ChainError`] - Blockchain RPC and identity errors
//! - [`TransferError`] - Top-level session errors
//!
//! Error conversion is automatic via `From` implementations where the mapping
//! is unambiguous. Chain errors are wrapped explicitly by the services so the
//! failing step (balance query, fee estimation, submission) stays visible.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Local validation and domain rule violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Memo text does not fit into the fixed-width memo field.
    #[error("Memo too long: {actual} bytes exceeds maximum of {max}")]
    MemoTooLong {
        /// Maximum allowed length in bytes.
        max: usize,
        /// Actual length of the input in bytes.
        actual: usize,
    },

    /// Sender cannot cover the transfer amount.
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        /// Free balance of the sender (planck).
        available: u128,
        /// Amount requested (planck).
        required: u128,
    },

    /// The signing identity is not the sender of the request.
    #[error("Signer {signer} does not match transfer sender {sender}")]
    SignerMismatch { signer: String, sender: String },
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Blockchain RPC, decoding and identity errors.
///
/// These errors occur when communicating with the Substrate node
/// via WebSocket RPC, or when deriving/signing with a key pair.
#[derive(Debug, Error)]
pub enum ChainError {
    /// WebSocket connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// RPC request failed.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Status subscription failed or disconnected.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// Chain data could not be decoded.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Secret URI or address could not be parsed.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Signing or extrinsic construction failed.
    #[error("Signing error: {0}")]
    SigningError(String),
}

// =============================================================================
// Transport failures
// =============================================================================

/// Why the result of a submitted transfer is unknown.
///
/// Unlike a failed transfer, a transport failure means the network never
/// told us whether the extrinsic was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// The node reported an error, invalid or dropped status.
    #[error("node reported: {0}")]
    Status(String),

    /// The status subscription broke.
    #[error("connection error: {0}")]
    Connection(String),

    /// No terminal status arrived in time.
    #[error("no terminal status after {0:?}")]
    Timeout(Duration),

    /// The status stream ended without a terminal status.
    #[error("status stream closed before finalization")]
    StreamClosed,
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Top-level session errors.
///
/// Every variant is fatal to the session; the binary logs it and exits
/// non-zero.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Local validation error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Transport or handshake failure while talking to the node.
    #[error("Connection error: {0}")]
    ConnectionError(#[source] ChainError),

    /// Account state lookup failed.
    #[error("Balance query failed: {0}")]
    BalanceQueryFailed(#[source] ChainError),

    /// Fee simulation failed.
    #[error("Fee estimation failed: {0}")]
    FeeEstimationFailed(#[source] ChainError),

    /// The signed transfer could not be handed to the node.
    #[error("Submission error: {0}")]
    SubmissionError(#[source] ChainError),

    /// The transfer was submitted but its result is unknown.
    #[error("Transport error: {0}")]
    TransportError(#[from] TransportFailure),

    /// The network explicitly reported the extrinsic as failed.
    #[error("Transaction failed in block {block_hash}: {reason}")]
    TransactionFailed { block_hash: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for session operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
