use std::sync::Arc;

use quiz_core::model::{UserId, UserProfile};
use storage::repository::{ResultStore, StoredResult, UserProfileStore};

use crate::error::ProfileServiceError;

/// Read side of a user's progress: cumulative points, history, past results.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn UserProfileStore>,
    results: Arc<dyn ResultStore>,
}

impl ProfileService {
    #[must_use]
    pub fn new(profiles: Arc<dyn UserProfileStore>, results: Arc<dyn ResultStore>) -> Self {
        Self { profiles, results }
    }

    /// Profile for `user_id`; a user who never submitted gets an empty profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be read.
    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile, ProfileServiceError> {
        let profile = self.profiles.get_profile(user_id).await?;
        Ok(profile.unwrap_or_else(|| UserProfile::empty(user_id.clone())))
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be read.
    pub async fn recent_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredResult>, ProfileServiceError> {
        Ok(self.results.results_for_user(user_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn unknown_user_has_empty_profile() {
        let repo = InMemoryRepository::new();
        let service = ProfileService::new(Arc::new(repo.clone()), Arc::new(repo));

        let profile = service.profile(&UserId::new("new-user")).await.unwrap();
        assert_eq!(profile, UserProfile::empty(UserId::new("new-user")));
        assert!(
            service
                .recent_results(&UserId::new("new-user"), 5)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
