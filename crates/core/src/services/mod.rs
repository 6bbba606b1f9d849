pub mod balances;
pub mod session;
pub mod transfer;

pub use balances::{BalanceReporter, TokenFormat, format_balance, has_sufficient_balance};
pub use session::{SessionConfig, SessionReport, TransferSession};
pub use transfer::{FinalityPolicy, TransferConfig, TransferService, classify_finalized};
