//! Account guard
//!
//! Every mutating operation follows the same discipline: load the account,
//! reject it if it is deleted or the caller's concurrency stamp is stale,
//! apply the transition to a copy, give the copy a fresh concurrency stamp
//! and write it back with a compare-and-swap against the stamp the caller
//! presented. A lost race surfaces as `ConcurrencyConflict` with nothing
//! applied. The guard never retries and never logs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;

use super::capability::{CredentialHasher, StampGenerator};
use super::entity::{Account, AccountId, AccountProfile, AccountState, Stamp};
use super::policy::LockoutPolicy;
use super::repository::{AccountStore, SwapOutcome};
use super::validation::{
    validate_credential, validate_email, validate_mobile, validate_username,
    AccountValidationError,
};
use crate::domain::DomainError;

/// Errors returned by guard operations
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Account not found")]
    NotFound,

    #[error("Account was modified concurrently; reload it and retry")]
    ConcurrencyConflict,

    #[error("Account is locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Operation not allowed while the account is {state}")]
    InvalidState { state: AccountState },

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Account ID '{0}' is already in use")]
    IdTaken(AccountId),

    #[error("Validation error: {0}")]
    Validation(#[from] AccountValidationError),

    #[error(transparent)]
    Store(#[from] DomainError),
}

impl GuardError {
    /// Only a concurrency conflict is worth retrying after a reload
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }
}

/// Request for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterAccountRequest {
    /// Fixed ID for seeded accounts; a random one is generated when absent
    pub id: Option<AccountId>,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub credential: String,
    pub state: AccountState,
}

/// Enforces login, lockout and credential rotation as atomic,
/// conflict-checked transitions on a single account
pub struct AccountGuard<S: AccountStore, H: CredentialHasher> {
    store: Arc<S>,
    hasher: Arc<H>,
    stamps: Arc<dyn StampGenerator>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl<S: AccountStore, H: CredentialHasher> AccountGuard<S, H> {
    pub fn new(
        store: Arc<S>,
        hasher: Arc<H>,
        stamps: Arc<dyn StampGenerator>,
        clock: Arc<dyn Clock>,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            stamps,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Read the current state of an account
    pub async fn get(&self, id: AccountId) -> Result<Account, GuardError> {
        self.store.get(id).await?.ok_or(GuardError::NotFound)
    }

    /// Administrative lookup by username
    pub async fn find_by_username(&self, username: &str) -> Result<Account, GuardError> {
        self.store
            .get_by_username(username)
            .await?
            .ok_or(GuardError::NotFound)
    }

    /// Create an account in the `Pending` or `Active` state
    pub async fn register(&self, request: RegisterAccountRequest) -> Result<Account, GuardError> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        validate_mobile(&request.mobile)?;
        validate_credential(&request.credential)?;

        if !matches!(request.state, AccountState::Pending | AccountState::Active) {
            return Err(GuardError::InvalidState {
                state: request.state,
            });
        }

        if self.store.get_by_username(&request.username).await?.is_some() {
            return Err(GuardError::UsernameTaken(request.username));
        }

        let credential_hash = self.hasher.hash(&request.credential)?;
        let account = Account::new(
            request.id.unwrap_or_else(AccountId::generate),
            AccountProfile {
                username: request.username.clone(),
                email: request.email,
                mobile: request.mobile,
                credential_hash,
                state: request.state,
            },
            self.stamps.new_stamp(),
            self.stamps.new_stamp(),
            self.clock.utc(),
        );

        let id = account.id();

        // The store is the final arbiter of uniqueness
        self.store.insert(account).await.map_err(|e| {
            if e.is_duplicate_id() {
                GuardError::IdTaken(id)
            } else if e.is_conflict() {
                GuardError::UsernameTaken(request.username)
            } else {
                GuardError::Store(e)
            }
        })
    }

    /// Attempt a login against an account
    ///
    /// A lockout in force rejects the attempt without touching the account.
    /// A lockout whose end has passed is treated as cleared before the
    /// credential is checked. A failed check counts towards the lockout
    /// threshold and is committed before `InvalidCredential` (or
    /// `AccountLocked`, when this attempt reached the threshold) is returned.
    pub async fn attempt_login(
        &self,
        id: AccountId,
        supplied_credential: &str,
        expected: &Stamp,
    ) -> Result<Account, GuardError> {
        let mut account = self.get(id).await?;
        ensure_not_deleted(&account)?;

        let now = self.clock.utc();

        if let Some(until) = account.lockout_end_at().filter(|_| account.is_locked_at(now)) {
            return Err(GuardError::AccountLocked { until });
        }

        ensure_current(&account, expected)?;

        if !account.state().can_login() {
            return Err(GuardError::InvalidState {
                state: account.state(),
            });
        }

        if account.lockout_elapsed_at(now) {
            account.clear_lockout();
        }

        if self.hasher.verify(supplied_credential, account.credential_hash()) {
            account.record_successful_login(now);
            return self.commit(account, expected, now).await;
        }

        let locked = account.record_failed_login(&self.policy, now);
        let account = self.commit(account, expected, now).await?;

        match account.lockout_end_at() {
            Some(until) if locked => Err(GuardError::AccountLocked { until }),
            _ => Err(GuardError::InvalidCredential),
        }
    }

    /// Look an account up by username and make one login attempt against
    /// its current stamp
    ///
    /// Unknown and deleted usernames both report `InvalidCredential`, and so
    /// does an account whose state does not allow login.
    pub async fn authenticate(
        &self,
        username: &str,
        supplied_credential: &str,
    ) -> Result<Account, GuardError> {
        let account = match self.store.get_by_username(username).await? {
            Some(account) if !account.state().is_terminal() => account,
            _ => return Err(GuardError::InvalidCredential),
        };

        let expected = account.concurrency_stamp().clone();
        self.attempt_login(account.id(), supplied_credential, &expected)
            .await
            .map_err(|e| match e {
                GuardError::InvalidState { .. } => GuardError::InvalidCredential,
                other => other,
            })
    }

    /// Replace the credential hash and rotate both stamps
    ///
    /// The new security stamp invalidates every session issued under the old
    /// one, even when the hash itself is unchanged.
    pub async fn rotate_credential(
        &self,
        id: AccountId,
        new_credential_hash: &str,
        expected: &Stamp,
    ) -> Result<Account, GuardError> {
        let security_stamp = self.stamps.new_stamp();

        self.mutate(id, expected, |account, now| {
            account.replace_credential(new_credential_hash.to_string(), security_stamp, now);
            Ok(())
        })
        .await
    }

    /// Validate and hash a plaintext credential, then rotate to it
    pub async fn change_credential(
        &self,
        id: AccountId,
        new_credential: &str,
        expected: &Stamp,
    ) -> Result<Account, GuardError> {
        validate_credential(new_credential)?;
        let hash = self.hasher.hash(new_credential)?;
        self.rotate_credential(id, &hash, expected).await
    }

    /// Administrative override: reset the failure counter and lift any
    /// lockout. Always moves the concurrency stamp, even when there was
    /// nothing to clear.
    pub async fn clear_lockout(&self, id: AccountId, expected: &Stamp) -> Result<Account, GuardError> {
        self.mutate(id, expected, |account, _| {
            account.clear_lockout();
            Ok(())
        })
        .await
    }

    pub async fn activate(&self, id: AccountId, expected: &Stamp) -> Result<Account, GuardError> {
        self.transition(id, AccountState::Active, expected).await
    }

    pub async fn suspend(&self, id: AccountId, expected: &Stamp) -> Result<Account, GuardError> {
        self.transition(id, AccountState::Suspended, expected).await
    }

    /// Soft-delete. No further mutation is accepted afterwards.
    pub async fn delete(&self, id: AccountId, expected: &Stamp) -> Result<Account, GuardError> {
        self.transition(id, AccountState::Deleted, expected).await
    }

    pub async fn confirm_mobile(&self, id: AccountId, expected: &Stamp) -> Result<Account, GuardError> {
        self.mutate(id, expected, |account, _| {
            account.confirm_mobile();
            Ok(())
        })
        .await
    }

    /// Whether a session issued under `security_stamp` is still current
    pub async fn validate_session(
        &self,
        id: AccountId,
        security_stamp: &Stamp,
    ) -> Result<bool, GuardError> {
        let account = self.get(id).await?;
        Ok(account.state().can_login() && account.security_stamp() == security_stamp)
    }

    async fn transition(
        &self,
        id: AccountId,
        next: AccountState,
        expected: &Stamp,
    ) -> Result<Account, GuardError> {
        self.mutate(id, expected, |account, _| {
            if !account.state().can_transition_to(next) {
                return Err(GuardError::InvalidState {
                    state: account.state(),
                });
            }
            account.set_state(next);
            Ok(())
        })
        .await
    }

    async fn mutate<F>(&self, id: AccountId, expected: &Stamp, apply: F) -> Result<Account, GuardError>
    where
        F: FnOnce(&mut Account, DateTime<Utc>) -> Result<(), GuardError>,
    {
        let mut account = self.get(id).await?;
        ensure_not_deleted(&account)?;
        ensure_current(&account, expected)?;

        let now = self.clock.utc();
        apply(&mut account, now)?;

        self.commit(account, expected, now).await
    }

    async fn commit(
        &self,
        mut account: Account,
        expected: &Stamp,
        now: DateTime<Utc>,
    ) -> Result<Account, GuardError> {
        account.restamp(self.stamps.new_stamp(), now);

        match self.store.compare_and_swap(&account, expected).await? {
            SwapOutcome::Applied => Ok(account),
            SwapOutcome::Stale => Err(GuardError::ConcurrencyConflict),
            SwapOutcome::Missing => Err(GuardError::NotFound),
        }
    }
}

fn ensure_not_deleted(account: &Account) -> Result<(), GuardError> {
    if account.state().is_terminal() {
        return Err(GuardError::InvalidState {
            state: account.state(),
        });
    }
    Ok(())
}

fn ensure_current(account: &Account, expected: &Stamp) -> Result<(), GuardError> {
    if account.concurrency_stamp() != expected {
        return Err(GuardError::ConcurrencyConflict);
    }
    Ok(())
}
