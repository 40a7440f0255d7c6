//! KRC fungible token contract for permissioned ledgers.
//!
//! Tracks balances and spending allowances of ledger identities. Issuance is
//! restricted to one organization, and writes that must be compliance-checked
//! go through a KYC gate backed by a separately deployed contract.
//!
//! # Key Types
//!
//! - [`KrcContract`]: invocation surface (function name plus string arguments)
//! - [`TokenLedger`]: the token state machine
//! - [`TxContext`]: per-invocation capabilities handed in by the host
//! - [`KycGate`]: compliance-gated writes
//! - [`MemoryLedger`]: in-memory host for tests and local development
//!
//! # Example
//!
//! ```
//! use krc_token::{KrcContract, KycRegistry, MemoryLedger, TokenConfig, X509Identity};
//!
//! let contract = KrcContract::new(TokenConfig::default());
//! let mut ledger = MemoryLedger::new("kalp");
//! ledger.deploy("kyc", KycRegistry);
//!
//! let issuer = X509Identity::for_subject("issuer", "mailabs");
//! let args = ["Kalp".to_string(), "KLP".to_string(), "2".to_string()];
//! let receipt = ledger
//!     .execute("krc", &issuer, |ctx| contract.invoke(ctx, "Initialize", &args))
//!     .unwrap();
//! assert_eq!(receipt.value, b"true");
//! ```

pub mod amount;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod events;
pub mod identity;
pub mod kyc;
pub mod ledger;
pub mod memory;
pub mod payment;
pub mod state;
pub mod validate;

#[cfg(test)]
#[macro_use]
mod mock;


pub use amount::Amount;
pub use config::TokenConfig;
pub use context::{CrossContractCaller, Response, TxContext};
pub use contract::{Function, KrcContract};
pub use error::{TokenError, TokenResult};
pub use events::{EventSink, TokenEvent};
pub use identity::{IdentityResolver, X509Identity};
pub use kyc::KycGate;
pub use ledger::TokenLedger;
pub use memory::{Chaincode, ChaincodeEvent, KycRecord, KycRegistry, MemoryLedger, Receipt};
pub use state::{composite_key, split_composite_key, StateStore};

/// Log target of every message emitted by the contract.
pub const LOG_TARGET: &str = "krc-token";
