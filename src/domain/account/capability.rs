//! Pluggable capabilities the guard consumes: credential hashing and stamp
//! generation

use std::fmt::Debug;

use super::entity::Stamp;
use crate::domain::DomainError;

/// Trait for credential hashing operations
pub trait CredentialHasher: Send + Sync + Debug {
    /// Hash a plaintext credential
    fn hash(&self, plaintext: &str) -> Result<String, DomainError>;

    /// Verify a plaintext credential against a stored hash
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Source of fresh security and concurrency stamps
///
/// Stamps must be uniformly random and of fixed length so collisions are
/// negligible.
pub trait StampGenerator: Send + Sync + Debug {
    fn new_stamp(&self) -> Stamp;
}
