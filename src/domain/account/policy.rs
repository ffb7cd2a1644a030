//! Lockout policy

use chrono::Duration;

use crate::domain::DomainError;

/// How many failed logins lock an account, and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_failed_attempts: u32,
    lockout_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_failed_attempts: u32, lockout_duration: Duration) -> Result<Self, DomainError> {
        if max_failed_attempts == 0 {
            return Err(DomainError::configuration(
                "max_failed_attempts must be at least 1",
            ));
        }

        if lockout_duration <= Duration::zero() {
            return Err(DomainError::configuration(
                "lockout_duration must be positive",
            ));
        }

        Ok(Self {
            max_failed_attempts,
            lockout_duration,
        })
    }

    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(15),
        }
    }
}
