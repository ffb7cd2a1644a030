//! Account store trait

use async_trait::async_trait;

use super::entity::{Account, AccountId, Stamp};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Result of a compare-and-swap write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The stored stamp matched and the new record was written
    Applied,
    /// The stored stamp had already moved; nothing was written
    Stale,
    /// No account with that ID exists
    Missing,
}

/// Durable storage for accounts
///
/// Implementations must enforce `username` uniqueness and make
/// `compare_and_swap` atomic with respect to every other write.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get an account by ID
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError>;

    /// Get an account by username
    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError>;

    /// Insert a new account. A taken ID fails with `DuplicateId`, a taken
    /// username with `Conflict`
    async fn insert(&self, account: Account) -> Result<Account, DomainError>;

    /// Replace the stored account if its concurrency stamp still equals
    /// `expected`
    async fn compare_and_swap(
        &self,
        account: &Account,
        expected: &Stamp,
    ) -> Result<SwapOutcome, DomainError>;
}
