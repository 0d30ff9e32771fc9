//! The token ledger the vault pulls stake from and pays out to.
//!
//! The ledger is an external collaborator: balances, allowances and transfer
//! semantics are its business. The vault only relies on the operations below
//! being atomic and on `transfer_from` honouring prior `approve` calls.

use attest_types::ActorId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance on {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: ActorId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: ActorId,
        spender: ActorId,
        needed: u128,
        available: u128,
    },
}

pub trait TokenLedger: Send + Sync {
    fn balance_of(&self, account: &ActorId) -> u128;

    /// Amount `spender` may still pull from `owner` via `transfer_from`.
    fn allowance(&self, owner: &ActorId, spender: &ActorId) -> u128;

    /// Set the allowance `spender` may pull from `owner`.
    fn approve(&self, owner: &ActorId, spender: &ActorId, amount: u128);

    fn transfer(&self, from: &ActorId, to: &ActorId, amount: u128) -> Result<(), LedgerError>;

    /// Move `amount` from `owner` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &ActorId,
        owner: &ActorId,
        to: &ActorId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Destroy `amount` held by `from`.
    fn burn(&self, from: &ActorId, amount: u128) -> Result<(), LedgerError>;
}
