//! Account infrastructure module
//!
//! Implementations of the account capabilities: Argon2 credential hashing,
//! random stamps, in-memory and PostgreSQL stores, the table schema and the
//! bootstrap seed list.

mod in_memory;
mod password;
mod postgres;
mod schema;
mod seed;
mod stamp;

pub use in_memory::InMemoryAccountStore;
pub use password::Argon2Hasher;
pub use postgres::PostgresAccountStore;
pub use schema::{AccountSchema, DeletePolicy};
pub use seed::{apply_seeds, seed_accounts, SeedAccount, OWNER_ACCOUNT_ID};
pub use stamp::{RandomStampGenerator, STAMP_LENGTH};
