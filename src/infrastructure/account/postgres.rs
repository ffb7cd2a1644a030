//! PostgreSQL account store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::account::{
    Account, AccountId, AccountRecord, AccountStore, Stamp, SwapOutcome,
};
use crate::domain::DomainError;

use super::schema::{AccountSchema, PRIMARY_KEY_CONSTRAINT, USERNAME_CONSTRAINT};

const SELECT_COLUMNS: &str = r#"
    SELECT id, username, email, mobile, is_mobile_confirmed, credential_hash,
           last_credential_change_at, failed_login_count, lockout_end_at, is_locked_out,
           last_login_at, state, security_stamp, concurrency_stamp, created_at, updated_at
    FROM accounts
"#;

/// PostgreSQL implementation of `AccountStore`
///
/// The compare-and-swap is a single `UPDATE ... WHERE concurrency_stamp = $2`,
/// so atomicity comes from the row lock the update takes.
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to database: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Create the account tables if they do not exist yet
    pub async fn migrate(&self, schema: &AccountSchema) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        for statement in schema.statements() {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to apply schema: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        info!("Account schema is up to date");
        Ok(())
    }

    async fn exists(&self, id: AccountId) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check account: {}", e)))
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE username = $1", SELECT_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to get account by username: {}", e))
            })?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn insert(&self, account: Account) -> Result<Account, DomainError> {
        let record = account.to_record();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, mobile, is_mobile_confirmed,
                                  credential_hash, last_credential_change_at, failed_login_count,
                                  lockout_end_at, is_locked_out, last_login_at, state,
                                  security_stamp, concurrency_stamp, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.mobile)
        .bind(record.is_mobile_confirmed)
        .bind(&record.credential_hash)
        .bind(record.last_credential_change_at)
        .bind(count_to_db(record.failed_login_count))
        .bind(record.lockout_end_at)
        .bind(record.is_locked_out)
        .bind(record.last_login_at)
        .bind(record.state.as_str())
        .bind(record.security_stamp.as_str())
        .bind(record.concurrency_stamp.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &record, "create"))?;

        Ok(account)
    }

    async fn compare_and_swap(
        &self,
        account: &Account,
        expected: &Stamp,
    ) -> Result<SwapOutcome, DomainError> {
        let record = account.to_record();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $3, email = $4, mobile = $5, is_mobile_confirmed = $6,
                credential_hash = $7, last_credential_change_at = $8, failed_login_count = $9,
                lockout_end_at = $10, is_locked_out = $11, last_login_at = $12, state = $13,
                security_stamp = $14, concurrency_stamp = $15, updated_at = $16
            WHERE id = $1 AND concurrency_stamp = $2
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(expected.as_str())
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.mobile)
        .bind(record.is_mobile_confirmed)
        .bind(&record.credential_hash)
        .bind(record.last_credential_change_at)
        .bind(count_to_db(record.failed_login_count))
        .bind(record.lockout_end_at)
        .bind(record.is_locked_out)
        .bind(record.last_login_at)
        .bind(record.state.as_str())
        .bind(record.security_stamp.as_str())
        .bind(record.concurrency_stamp.as_str())
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &record, "update"))?;

        if result.rows_affected() == 1 {
            return Ok(SwapOutcome::Applied);
        }

        if self.exists(record.id).await? {
            debug!(account_id = %record.id, "Rejected stale account write");
            Ok(SwapOutcome::Stale)
        } else {
            Ok(SwapOutcome::Missing)
        }
    }
}

fn map_write_error(error: sqlx::Error, record: &AccountRecord, action: &str) -> DomainError {
    let constraint = error
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint());

    constraint
        .and_then(|name| unique_violation_error(name, record))
        .unwrap_or_else(|| {
            DomainError::storage(format!("Failed to {} account: {}", action, error))
        })
}

/// Map a violated unique constraint to the conflict it stands for
fn unique_violation_error(constraint: &str, record: &AccountRecord) -> Option<DomainError> {
    match constraint {
        USERNAME_CONSTRAINT => Some(DomainError::conflict(format!(
            "Username '{}' already exists",
            record.username
        ))),
        PRIMARY_KEY_CONSTRAINT => Some(DomainError::duplicate_id(format!(
            "Account with ID '{}' already exists",
            record.id
        ))),
        _ => None,
    }
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Failed to read account row: {}", e));

    let id: Uuid = row.try_get("id").map_err(read)?;
    let failed_login_count: i32 = row.try_get("failed_login_count").map_err(read)?;
    let state: String = row.try_get("state").map_err(read)?;
    let security_stamp: String = row.try_get("security_stamp").map_err(read)?;
    let concurrency_stamp: String = row.try_get("concurrency_stamp").map_err(read)?;

    let failed_login_count = u32::try_from(failed_login_count).map_err(|_| {
        DomainError::storage(format!(
            "Invalid failed_login_count {} for account {}",
            failed_login_count, id
        ))
    })?;

    let record = AccountRecord {
        id: AccountId::from_uuid(id),
        username: row.try_get("username").map_err(read)?,
        email: row.try_get("email").map_err(read)?,
        mobile: row.try_get("mobile").map_err(read)?,
        is_mobile_confirmed: row.try_get("is_mobile_confirmed").map_err(read)?,
        credential_hash: row.try_get("credential_hash").map_err(read)?,
        last_credential_change_at: row
            .try_get::<Option<DateTime<Utc>>, _>("last_credential_change_at")
            .map_err(read)?,
        failed_login_count,
        lockout_end_at: row
            .try_get::<Option<DateTime<Utc>>, _>("lockout_end_at")
            .map_err(read)?,
        is_locked_out: row.try_get("is_locked_out").map_err(read)?,
        last_login_at: row
            .try_get::<Option<DateTime<Utc>>, _>("last_login_at")
            .map_err(read)?,
        state: state.parse()?,
        // CHAR columns come back blank-padded
        security_stamp: Stamp::new(security_stamp.trim_end()),
        concurrency_stamp: Stamp::new(concurrency_stamp),
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    };

    Ok(Account::from(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_conversion_saturates() {
        assert_eq!(count_to_db(0), 0);
        assert_eq!(count_to_db(5), 5);
        assert_eq!(count_to_db(u32::MAX), i32::MAX);
    }

    fn test_record() -> AccountRecord {
        let account = Account::new(
            AccountId::from_uuid(Uuid::from_u128(1)),
            crate::domain::account::AccountProfile {
                username: "owner".to_string(),
                email: "owner@example.com".to_string(),
                mobile: "09000000000".to_string(),
                credential_hash: "hash".to_string(),
                state: crate::domain::account::AccountState::Active,
            },
            Stamp::new("security"),
            Stamp::new("v1"),
            crate::test_support::fixture_now(),
        );
        account.to_record()
    }

    #[test]
    fn test_unique_violations_are_told_apart() {
        let record = test_record();

        let username = unique_violation_error(USERNAME_CONSTRAINT, &record).unwrap();
        assert!(username.is_conflict());
        assert!(username.to_string().contains("owner"));

        let id = unique_violation_error(PRIMARY_KEY_CONSTRAINT, &record).unwrap();
        assert!(id.is_duplicate_id());
        assert!(!id.is_conflict());

        assert!(unique_violation_error("account_roles_pkey", &record).is_none());
    }

    #[test]
    fn test_select_covers_every_column() {
        for column in [
            "is_mobile_confirmed",
            "last_credential_change_at",
            "failed_login_count",
            "lockout_end_at",
            "is_locked_out",
            "security_stamp",
            "concurrency_stamp",
        ] {
            assert!(SELECT_COLUMNS.contains(column), "missing {}", column);
        }
    }
}
