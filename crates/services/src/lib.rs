#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod identity;
pub mod profile_service;
pub mod quiz_loader;
pub mod result_submitter;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, QuizSummary};
pub use error::{AppServicesError, FetchError, ProfileServiceError, QuizError};
pub use identity::{AuthProvider, StaticIdentity};
pub use profile_service::ProfileService;
pub use quiz_loader::QuizLoader;
pub use result_submitter::{ResultSubmitter, SubmissionOutcome};
pub use sessions::{QuizSession, QuizSessionService, SessionProgress, SessionStatus};
