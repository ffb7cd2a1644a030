//! Bootstrap accounts

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::domain::account::{
    AccountGuard, AccountId, AccountState, AccountStore, CredentialHasher, GuardError,
    RegisterAccountRequest,
};

/// Well-known ID of the seeded owner account
pub const OWNER_ACCOUNT_ID: Uuid = Uuid::from_u128(1);

/// A seed entry and whether its credential was generated on the spot
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub request: RegisterAccountRequest,
    pub generated_credential: bool,
}

/// The static seed list: a single active owner account
pub fn seed_accounts(config: &SeedConfig) -> Vec<SeedAccount> {
    let (credential, generated_credential) = match &config.owner_password {
        Some(p) if !p.is_empty() => (p.clone(), false),
        _ => (generate_random_credential(), true),
    };

    vec![SeedAccount {
        request: RegisterAccountRequest {
            id: Some(AccountId::from_uuid(OWNER_ACCOUNT_ID)),
            username: config.owner_username.clone(),
            email: config.owner_email.clone(),
            mobile: config.owner_mobile.clone(),
            credential,
            state: AccountState::Active,
        },
        generated_credential,
    }]
}

/// Register every seed account whose username is still free.
/// Returns how many accounts were created.
pub async fn apply_seeds<S, H>(
    guard: &AccountGuard<S, H>,
    seeds: Vec<SeedAccount>,
) -> Result<usize, GuardError>
where
    S: AccountStore,
    H: CredentialHasher,
{
    let mut created = 0;

    for seed in seeds {
        let username = seed.request.username.clone();
        let credential = seed.request.credential.clone();

        match guard.register(seed.request).await {
            Ok(account) => {
                created += 1;
                info!(account_id = %account.id(), username = %username, "Seed account created");

                if seed.generated_credential {
                    info!("Generated credential for '{}': {}", username, credential);
                    info!("Please change this credential after first login.");
                }
            }
            Err(GuardError::UsernameTaken(_)) => {
                info!(username = %username, "Seed account already present, skipping");
            }
            Err(GuardError::IdTaken(id)) => {
                warn!(
                    account_id = %id,
                    username = %username,
                    "Seed account ID is held by an account with another username"
                );
                return Err(GuardError::IdTaken(id));
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to create seed account");
                return Err(e);
            }
        }
    }

    Ok(created)
}

fn generate_random_credential() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::LockoutPolicy;
    use crate::infrastructure::account::{InMemoryAccountStore, RandomStampGenerator};
    use crate::test_support::{fixture_now, MutableClock, PlainHasher};
    use std::sync::Arc;

    fn seed_config(password: Option<&str>) -> SeedConfig {
        SeedConfig {
            owner_password: password.map(str::to_string),
            ..SeedConfig::default()
        }
    }

    fn guard() -> AccountGuard<InMemoryAccountStore, PlainHasher> {
        AccountGuard::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(PlainHasher),
            Arc::new(RandomStampGenerator::new()),
            Arc::new(MutableClock::new(fixture_now())),
            LockoutPolicy::default(),
        )
    }

    #[test]
    fn test_seed_list_holds_the_owner() {
        let seeds = seed_accounts(&seed_config(Some("owner")));

        assert_eq!(seeds.len(), 1);
        let owner = &seeds[0];
        assert_eq!(owner.request.id, Some(AccountId::from_uuid(OWNER_ACCOUNT_ID)));
        assert_eq!(owner.request.username, "owner");
        assert_eq!(owner.request.credential, "owner");
        assert_eq!(owner.request.state, AccountState::Active);
        assert!(!owner.generated_credential);
    }

    #[test]
    fn test_missing_password_is_generated() {
        let seeds = seed_accounts(&seed_config(None));

        assert!(seeds[0].generated_credential);
        assert_eq!(seeds[0].request.credential.len(), 16);

        let empty = seed_accounts(&seed_config(Some("")));
        assert!(empty[0].generated_credential);
    }

    #[tokio::test]
    async fn test_apply_seeds_is_idempotent() {
        let guard = guard();

        let created = apply_seeds(&guard, seed_accounts(&seed_config(Some("owner"))))
            .await
            .unwrap();
        assert_eq!(created, 1);

        let again = apply_seeds(&guard, seed_accounts(&seed_config(Some("owner"))))
            .await
            .unwrap();
        assert_eq!(again, 0);

        let owner = guard.get(AccountId::from_uuid(OWNER_ACCOUNT_ID)).await.unwrap();
        assert_eq!(owner.state(), AccountState::Active);
        assert!(guard.authenticate("owner", "owner").await.is_ok());
    }

    #[tokio::test]
    async fn test_renamed_owner_reports_id_clash() {
        let guard = guard();
        apply_seeds(&guard, seed_accounts(&seed_config(Some("owner"))))
            .await
            .unwrap();

        let mut renamed = seed_config(Some("owner"));
        renamed.owner_username = "renamed_owner".to_string();
        let result = apply_seeds(&guard, seed_accounts(&renamed)).await;

        assert!(matches!(
            result,
            Err(GuardError::IdTaken(id)) if id == AccountId::from_uuid(OWNER_ACCOUNT_ID)
        ));
        assert!(matches!(
            guard.find_by_username("renamed_owner").await,
            Err(GuardError::NotFound)
        ));
        let owner = guard.get(AccountId::from_uuid(OWNER_ACCOUNT_ID)).await.unwrap();
        assert_eq!(owner.username(), "owner");
    }

    #[tokio::test]
    async fn test_apply_seeds_surfaces_invalid_entries() {
        let guard = guard();
        let mut config = seed_config(Some("owner"));
        config.owner_email = "not-an-email".to_string();

        let result = apply_seeds(&guard, seed_accounts(&config)).await;
        assert!(matches!(result, Err(GuardError::Validation(_))));
    }
}
