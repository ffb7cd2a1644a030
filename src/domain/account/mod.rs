//! Account domain
//!
//! This module provides the account entity, the lockout policy, the storage
//! and credential capability traits, and the guard that applies every
//! security-relevant transition.

mod capability;
mod entity;
mod guard;
mod policy;
mod repository;
mod validation;

pub use capability::{CredentialHasher, StampGenerator};
pub use entity::{Account, AccountId, AccountProfile, AccountRecord, AccountState, Stamp};
pub use guard::{AccountGuard, GuardError, RegisterAccountRequest};
pub use policy::LockoutPolicy;
pub use repository::{AccountStore, SwapOutcome};
pub use validation::{
    validate_credential, validate_email, validate_mobile, validate_username,
    AccountValidationError,
};
pub(crate) use validation::{MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH};

#[cfg(test)]
pub use repository::MockAccountStore;
