//! Account entity and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::policy::LockoutPolicy;
use crate::domain::DomainError;

/// Stable account identifier, immutable after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("'{}' is not a valid account ID: {}", s, e)))
    }
}

/// Lifecycle state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Registered but not yet activated
    Pending,
    /// Can log in
    Active,
    /// Temporarily barred by an administrator
    Suspended,
    /// Soft-deleted. Terminal
    Deleted,
}

impl AccountState {
    pub const ALL: [AccountState; 4] = [
        AccountState::Pending,
        AccountState::Active,
        AccountState::Suspended,
        AccountState::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }

    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Whether an administrator may move an account from this state to `next`
    pub fn can_transition_to(&self, next: AccountState) -> bool {
        use AccountState::*;

        matches!(
            (*self, next),
            (Pending, Active)
                | (Suspended, Active)
                | (Pending, Suspended)
                | (Active, Suspended)
                | (Pending | Active | Suspended, Deleted)
        )
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unknown account state '{}'", s)))
    }
}

/// Opaque random token used for security and concurrency stamps
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stamp(String);

impl Stamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity fields supplied when an account is first created
#[derive(Debug, Clone)]
pub struct AccountProfile {
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub credential_hash: String,
    pub state: AccountState,
}

/// Flat persisted shape of an account, used by storage adapters to load and
/// save rows without reaching into the entity
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub is_mobile_confirmed: bool,
    pub credential_hash: String,
    pub last_credential_change_at: Option<DateTime<Utc>>,
    pub failed_login_count: u32,
    pub lockout_end_at: Option<DateTime<Utc>>,
    pub is_locked_out: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub state: AccountState,
    pub security_stamp: Stamp,
    pub concurrency_stamp: Stamp,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account entity
///
/// Lockout counters and stamps have no public setters; they only move
/// through the transitions `AccountGuard` applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    id: AccountId,
    username: String,
    email: String,
    mobile: String,
    is_mobile_confirmed: bool,
    /// Never exposed in serialization
    #[serde(skip_serializing)]
    credential_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_credential_change_at: Option<DateTime<Utc>>,
    failed_login_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    lockout_end_at: Option<DateTime<Utc>>,
    is_locked_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login_at: Option<DateTime<Utc>>,
    state: AccountState,
    #[serde(skip_serializing)]
    security_stamp: Stamp,
    concurrency_stamp: Stamp,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with fresh stamps and no login history
    pub fn new(
        id: AccountId,
        profile: AccountProfile,
        security_stamp: Stamp,
        concurrency_stamp: Stamp,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username: profile.username,
            email: profile.email,
            mobile: profile.mobile,
            is_mobile_confirmed: false,
            credential_hash: profile.credential_hash,
            last_credential_change_at: None,
            failed_login_count: 0,
            lockout_end_at: None,
            is_locked_out: false,
            last_login_at: None,
            state: profile.state,
            security_stamp,
            concurrency_stamp,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            is_mobile_confirmed: self.is_mobile_confirmed,
            credential_hash: self.credential_hash.clone(),
            last_credential_change_at: self.last_credential_change_at,
            failed_login_count: self.failed_login_count,
            lockout_end_at: self.lockout_end_at,
            is_locked_out: self.is_locked_out,
            last_login_at: self.last_login_at,
            state: self.state,
            security_stamp: self.security_stamp.clone(),
            concurrency_stamp: self.concurrency_stamp.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn is_mobile_confirmed(&self) -> bool {
        self.is_mobile_confirmed
    }

    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    pub fn last_credential_change_at(&self) -> Option<DateTime<Utc>> {
        self.last_credential_change_at
    }

    pub fn failed_login_count(&self) -> u32 {
        self.failed_login_count
    }

    pub fn lockout_end_at(&self) -> Option<DateTime<Utc>> {
        self.lockout_end_at
    }

    pub fn is_locked_out(&self) -> bool {
        self.is_locked_out
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn state(&self) -> AccountState {
        self.state
    }

    pub fn security_stamp(&self) -> &Stamp {
        &self.security_stamp
    }

    pub fn concurrency_stamp(&self) -> &Stamp {
        &self.concurrency_stamp
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Lockout checks

    /// Whether a lockout is in force at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end_at.is_some_and(|end| end > now)
    }

    /// Whether a lockout was set but has already run out at `now`
    pub fn lockout_elapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end_at.is_some_and(|end| end <= now)
    }

    // Transitions, applied by the guard

    pub(super) fn clear_lockout(&mut self) {
        self.failed_login_count = 0;
        self.lockout_end_at = None;
        self.is_locked_out = false;
    }

    /// Count a failed login. Returns true when this failure started a lockout.
    pub(super) fn record_failed_login(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        self.failed_login_count = self.failed_login_count.saturating_add(1);

        if self.failed_login_count >= policy.max_failed_attempts() {
            self.lockout_end_at = Some(now + policy.lockout_duration());
            self.is_locked_out = true;
            return true;
        }

        false
    }

    pub(super) fn record_successful_login(&mut self, now: DateTime<Utc>) {
        self.clear_lockout();
        self.last_login_at = Some(now);
    }

    pub(super) fn replace_credential(&mut self, credential_hash: String, security_stamp: Stamp, now: DateTime<Utc>) {
        self.credential_hash = credential_hash;
        self.last_credential_change_at = Some(now);
        self.security_stamp = security_stamp;
    }

    pub(super) fn set_state(&mut self, state: AccountState) {
        self.state = state;
    }

    pub(super) fn confirm_mobile(&mut self) {
        self.is_mobile_confirmed = true;
    }

    /// Mark a successful mutation: new concurrency stamp, new update time
    pub(super) fn restamp(&mut self, concurrency_stamp: Stamp, now: DateTime<Utc>) {
        self.concurrency_stamp = concurrency_stamp;
        self.updated_at = now;
    }
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            mobile: record.mobile,
            is_mobile_confirmed: record.is_mobile_confirmed,
            credential_hash: record.credential_hash,
            last_credential_change_at: record.last_credential_change_at,
            failed_login_count: record.failed_login_count,
            lockout_end_at: record.lockout_end_at,
            is_locked_out: record.is_locked_out,
            last_login_at: record.last_login_at,
            state: record.state,
            security_stamp: record.security_stamp,
            concurrency_stamp: record.concurrency_stamp,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
