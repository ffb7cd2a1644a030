//! Table definitions for persisted accounts
//!
//! Claims and role assignments reference `accounts(id)`. What happens to them
//! when an account row is removed is an explicit configuration choice, never
//! a default baked into the code. Accounts themselves are only soft-deleted,
//! so the policy matters for manual maintenance and future purge jobs.

use serde::Deserialize;

use crate::domain::account::{AccountState, MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH};

use super::stamp::STAMP_LENGTH;

pub(super) const PRIMARY_KEY_CONSTRAINT: &str = "accounts_pkey";
pub(super) const USERNAME_CONSTRAINT: &str = "accounts_username_key";

/// `ON DELETE` behaviour for rows that reference an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse to delete an account that still has claims or roles
    #[default]
    Restrict,
    /// Remove claims and roles together with the account
    Cascade,
    /// Like `Restrict`, but checked at the end of the statement
    NoAction,
}

impl DeletePolicy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::NoAction => "NO ACTION",
        }
    }
}

/// DDL for the account tables
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSchema {
    related_on_delete: DeletePolicy,
}

impl AccountSchema {
    pub fn new(related_on_delete: DeletePolicy) -> Self {
        Self { related_on_delete }
    }

    /// Statements in dependency order, each safe to re-run
    pub fn statements(&self) -> Vec<String> {
        let states = AccountState::ALL
            .iter()
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let on_delete = self.related_on_delete.as_sql();

        vec![
            format!(
                r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID NOT NULL,
    username VARCHAR({username_len}) NOT NULL,
    email VARCHAR({email_len}) NOT NULL,
    mobile VARCHAR(16) NOT NULL,
    is_mobile_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    credential_hash VARCHAR(256) NOT NULL,
    last_credential_change_at TIMESTAMPTZ,
    failed_login_count INTEGER NOT NULL DEFAULT 0 CHECK (failed_login_count >= 0),
    lockout_end_at TIMESTAMPTZ,
    is_locked_out BOOLEAN NOT NULL DEFAULT FALSE,
    last_login_at TIMESTAMPTZ,
    state VARCHAR(16) NOT NULL CHECK (state IN ({states})),
    security_stamp CHAR({len}) NOT NULL,
    concurrency_stamp VARCHAR({len}) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT {pkey} PRIMARY KEY (id),
    CONSTRAINT {username_key} UNIQUE (username)
)"#,
                username_len = MAX_USERNAME_LENGTH,
                email_len = MAX_EMAIL_LENGTH,
                states = states,
                len = STAMP_LENGTH,
                pkey = PRIMARY_KEY_CONSTRAINT,
                username_key = USERNAME_CONSTRAINT,
            ),
            format!(
                r#"
CREATE TABLE IF NOT EXISTS account_claims (
    id BIGSERIAL PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts (id) ON DELETE {on_delete},
    claim_type VARCHAR(128) NOT NULL,
    claim_value TEXT NOT NULL
)"#,
                on_delete = on_delete,
            ),
            format!(
                r#"
CREATE TABLE IF NOT EXISTS account_roles (
    account_id UUID NOT NULL REFERENCES accounts (id) ON DELETE {on_delete},
    role_id BIGINT NOT NULL,
    PRIMARY KEY (account_id, role_id)
)"#,
                on_delete = on_delete,
            ),
            "CREATE INDEX IF NOT EXISTS account_claims_account_id_idx ON account_claims (account_id)"
                .to_string(),
        ]
    }

    /// All statements as one script, for printing
    pub fn render(&self) -> String {
        self.statements()
            .iter()
            .map(|s| format!("{};\n", s.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
