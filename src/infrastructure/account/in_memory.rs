//! In-memory account store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::account::{Account, AccountId, AccountStore, Stamp, SwapOutcome};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    /// Index for username -> account ID lookup
    username_index: HashMap<String, AccountId>,
}

/// In-memory implementation of `AccountStore`
///
/// Both maps sit behind one lock so a swap and its uniqueness check happen
/// in a single critical section.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<Accounts>>,
}

impl InMemoryAccountStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given accounts
    pub fn with_accounts(accounts: Vec<Account>) -> Result<Self, DomainError> {
        let mut inner = Accounts::default();

        for account in accounts {
            if inner.by_id.contains_key(&account.id()) {
                return Err(DomainError::duplicate_id(format!(
                    "Account with ID '{}' already exists",
                    account.id()
                )));
            }
            if inner.username_index.contains_key(account.username()) {
                return Err(DomainError::conflict(format!(
                    "Username '{}' already exists",
                    account.username()
                )));
            }
            inner
                .username_index
                .insert(account.username().to_string(), account.id());
            inner.by_id.insert(account.id(), account);
        }

        Ok(Self {
            accounts: Arc::new(RwLock::new(inner)),
        })
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.by_id.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;

        Ok(accounts
            .username_index
            .get(username)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn insert(&self, account: Account) -> Result<Account, DomainError> {
        let mut accounts = self.accounts.write().await;

        if accounts.by_id.contains_key(&account.id()) {
            return Err(DomainError::duplicate_id(format!(
                "Account with ID '{}' already exists",
                account.id()
            )));
        }

        if accounts.username_index.contains_key(account.username()) {
            return Err(DomainError::conflict(format!(
                "Username '{}' already exists",
                account.username()
            )));
        }

        accounts
            .username_index
            .insert(account.username().to_string(), account.id());
        accounts.by_id.insert(account.id(), account.clone());

        Ok(account)
    }

    async fn compare_and_swap(
        &self,
        account: &Account,
        expected: &Stamp,
    ) -> Result<SwapOutcome, DomainError> {
        let mut guard = self.accounts.write().await;
        let accounts = &mut *guard;

        let Some(current) = accounts.by_id.get_mut(&account.id()) else {
            return Ok(SwapOutcome::Missing);
        };

        if current.concurrency_stamp() != expected {
            debug!(account_id = %account.id(), "Rejected stale account write");
            return Ok(SwapOutcome::Stale);
        }

        if current.username() != account.username() {
            if accounts.username_index.contains_key(account.username()) {
                return Err(DomainError::conflict(format!(
                    "Username '{}' already exists",
                    account.username()
                )));
            }
            accounts.username_index.remove(current.username());
            accounts
                .username_index
                .insert(account.username().to_string(), account.id());
        }

        *current = account.clone();

        Ok(SwapOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountProfile, AccountRecord, AccountState};
    use crate::test_support::fixture_now;

    fn create_test_account(username: &str, stamp: &str) -> Account {
        Account::new(
            AccountId::generate(),
            AccountProfile {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                mobile: "09301234567".to_string(),
                credential_hash: "hash".to_string(),
                state: AccountState::Active,
            },
            Stamp::new("security"),
            Stamp::new(stamp),
            fixture_now(),
        )
    }

    fn with_changes(account: &Account, change: impl FnOnce(&mut AccountRecord)) -> Account {
        let mut record = account.to_record();
        change(&mut record);
        Account::from(record)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryAccountStore::new();
        let account = create_test_account("owner", "v1");

        store.insert(account.clone()).await.unwrap();

        assert_eq!(store.get(account.id()).await.unwrap(), Some(account.clone()));
        assert_eq!(store.get_by_username("owner").await.unwrap(), Some(account));
        assert!(store.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_uniqueness() {
        let store = InMemoryAccountStore::new();

        store.insert(create_test_account("owner", "v1")).await.unwrap();
        let result = store.insert(create_test_account("owner", "v1")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryAccountStore::new();
        let account = create_test_account("owner", "v1");
        let same_id = with_changes(&account, |r| r.username = "other".to_string());

        store.insert(account).await.unwrap();
        let result = store.insert(same_id).await;

        assert!(matches!(result, Err(DomainError::DuplicateId { .. })));
        assert!(store.get_by_username("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_swap_with_current_stamp() {
        let store = InMemoryAccountStore::new();
        let account = create_test_account("owner", "v1");
        store.insert(account.clone()).await.unwrap();

        let updated = with_changes(&account, |r| {
            r.failed_login_count = 2;
            r.concurrency_stamp = Stamp::new("v2");
        });

        let outcome = store.compare_and_swap(&updated, &Stamp::new("v1")).await.unwrap();
        assert_eq!(outcome, SwapOutcome::Applied);

        let stored = store.get(account.id()).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_count(), 2);
        assert_eq!(stored.concurrency_stamp().as_str(), "v2");
    }

    #[tokio::test]
    async fn test_swap_with_stale_stamp() {
        let store = InMemoryAccountStore::new();
        let account = create_test_account("owner", "v2");
        store.insert(account.clone()).await.unwrap();

        let updated = with_changes(&account, |r| {
            r.failed_login_count = 7;
            r.concurrency_stamp = Stamp::new("v3");
        });

        let outcome = store.compare_and_swap(&updated, &Stamp::new("v1")).await.unwrap();
        assert_eq!(outcome, SwapOutcome::Stale);
        assert_eq!(store.get(account.id()).await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_swap_missing_account() {
        let store = InMemoryAccountStore::new();
        let account = create_test_account("owner", "v1");

        let outcome = store.compare_and_swap(&account, &Stamp::new("v1")).await.unwrap();
        assert_eq!(outcome, SwapOutcome::Missing);
    }

    #[tokio::test]
    async fn test_swap_keeps_username_index_consistent() {
        let store = InMemoryAccountStore::new();
        let owner = create_test_account("owner", "v1");
        store.insert(owner.clone()).await.unwrap();
        store.insert(create_test_account("taken", "v1")).await.unwrap();

        let clash = with_changes(&owner, |r| r.username = "taken".to_string());
        assert!(store.compare_and_swap(&clash, &Stamp::new("v1")).await.is_err());

        let renamed = with_changes(&owner, |r| {
            r.username = "renamed".to_string();
            r.concurrency_stamp = Stamp::new("v2");
        });
        store.compare_and_swap(&renamed, &Stamp::new("v1")).await.unwrap();

        assert!(store.get_by_username("owner").await.unwrap().is_none());
        assert!(store.get_by_username("renamed").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_with_accounts_indexes_usernames() {
        let owner = create_test_account("owner", "v1");
        let deleted = with_changes(&create_test_account("gone", "v1"), |r| {
            r.state = AccountState::Deleted;
        });
        let store = InMemoryAccountStore::with_accounts(vec![owner.clone(), deleted]).unwrap();

        assert_eq!(store.get_by_username("owner").await.unwrap(), Some(owner));
        let gone = store.get_by_username("gone").await.unwrap().unwrap();
        assert_eq!(gone.state(), AccountState::Deleted);
    }

    #[test]
    fn test_with_accounts_rejects_duplicate_usernames() {
        let result = InMemoryAccountStore::with_accounts(vec![
            create_test_account("owner", "v1"),
            create_test_account("owner", "v1"),
        ]);

        assert!(result.is_err());
    }
}
