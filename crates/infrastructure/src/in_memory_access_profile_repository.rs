use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pondok_application::AccessProfileRepository;
use pondok_core::{AccountId, AppResult};
use pondok_domain::AccessProfile;

/// In-memory access profile repository.
#[derive(Debug, Default)]
pub struct InMemoryAccessProfileRepository {
    profiles: RwLock<HashMap<AccountId, AccessProfile>>,
}

impl InMemoryAccessProfileRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessProfileRepository for InMemoryAccessProfileRepository {
    async fn find_profile(&self, account_id: AccountId) -> AppResult<Option<AccessProfile>> {
        Ok(self.profiles.read().await.get(&account_id).cloned())
    }

    async fn list_profiles(&self) -> AppResult<Vec<AccessProfile>> {
        let mut profiles: Vec<AccessProfile> =
            self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|left, right| {
            left.full_name()
                .cmp(&right.full_name())
                .then_with(|| left.account_id().cmp(&right.account_id()))
        });
        Ok(profiles)
    }

    async fn save_profile(&self, profile: AccessProfile) -> AppResult<AccessProfile> {
        self.profiles
            .write()
            .await
            .insert(profile.account_id(), profile.clone());
        Ok(profile)
    }
}
