//! Stake vault: custody of staked collateral.
//!
//! Stake is kept per `(StakeId, ActorId)`. A `StakeId` is the namespace of one
//! pool. Tokens live on an external ledger; the vault holds them in its own
//! custody account and keeps the per-actor bookkeeping:
//!
//! `ledger.balance_of(vault) == Σ stake records`
//!
//! Only authorized operators (the actor registry) may release or slash.

pub mod error;
pub mod ledger;
pub mod vault;

pub use error::StakeError;
pub use ledger::{LedgerError, TokenLedger};
pub use vault::{SlashMode, SlashOutcome, StakeVault};
