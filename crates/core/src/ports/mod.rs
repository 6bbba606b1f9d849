mod chain_source;
mod identity;
mod transfer_gateway;

pub use chain_source::*;
pub use identity::*;
pub use transfer_gateway::*;
