use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::identity::AuthProvider;
use crate::profile_service::ProfileService;
use crate::quiz_loader::QuizLoader;
use crate::result_submitter::ResultSubmitter;
use crate::sessions::QuizSessionService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    sessions: Arc<QuizSessionService>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        require_all_answered: bool,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, auth, require_all_answered))
    }

    /// Build services over an already constructed storage bundle.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        require_all_answered: bool,
    ) -> Self {
        let loader = QuizLoader::new(Arc::clone(&storage.quizzes));
        let submitter = ResultSubmitter::new(clock, auth, Arc::clone(&storage.submissions));
        let sessions = Arc::new(
            QuizSessionService::new(clock, loader, submitter)
                .with_require_all_answered(require_all_answered),
        );
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.quizzes)));
        let profiles = Arc::new(ProfileService::new(
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.results),
        ));

        Self {
            catalog,
            sessions,
            profiles,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }
}
