//! Nullable token ledger: balances and allowances held in memory.

use attest_stake::{LedgerError, TokenLedger};
use attest_types::ActorId;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Books {
    balances: HashMap<ActorId, u128>,
    allowances: HashMap<(ActorId, ActorId), u128>,
    supply: u128,
}

impl Books {
    fn balance(&self, account: &ActorId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn debit(&mut self, account: &ActorId, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                needed: amount,
                available,
            });
        }
        self.balances.insert(*account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: &ActorId, amount: u128) {
        *self.balances.entry(*account).or_insert(0) += amount;
    }
}

/// An in-memory fungible token ledger.
///
/// Thread-safe; every operation is atomic under one lock.
#[derive(Default)]
pub struct MemoryLedger {
    books: Mutex<Books>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens in `account`.
    pub fn mint(&self, account: &ActorId, amount: u128) {
        let mut books = self.books.lock();
        books.credit(account, amount);
        books.supply += amount;
    }

    /// Tokens in existence (minted minus burned).
    pub fn total_supply(&self) -> u128 {
        self.books.lock().supply
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, account: &ActorId) -> u128 {
        self.books.lock().balance(account)
    }

    fn allowance(&self, owner: &ActorId, spender: &ActorId) -> u128 {
        self.books
            .lock()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &ActorId, spender: &ActorId, amount: u128) {
        self.books
            .lock()
            .allowances
            .insert((*owner, *spender), amount);
    }

    fn transfer(&self, from: &ActorId, to: &ActorId, amount: u128) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        books.debit(from, amount)?;
        books.credit(to, amount);
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &ActorId,
        owner: &ActorId,
        to: &ActorId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        let key = (*owner, *spender);
        let allowed = books.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                needed: amount,
                available: allowed,
            });
        }
        books.debit(owner, amount)?;
        books.credit(to, amount);
        books.allowances.insert(key, allowed - amount);
        Ok(())
    }

    fn burn(&self, from: &ActorId, amount: u128) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        books.debit(from, amount)?;
        books.supply -= amount;
        Ok(())
    }
}
