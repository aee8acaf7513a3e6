use async_trait::async_trait;
use quiz_core::model::{
    HistoryEntry, Question, QuestionRef, QuizDefinitionError, QuizId, ResultId, ResultRecord,
    SubmissionId, UserId, UserProfile, UserProfileDelta,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::document::Document;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Stored shape of a quiz: questions are references, not inline data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRecord {
    pub id: QuizId,
    pub topic: String,
    pub subject: Option<String>,
    pub question_refs: Vec<QuestionRef>,
    /// Total as written by whoever authored the quiz; may disagree with the questions.
    pub total_points: Option<u32>,
}

/// Stored shape of a question referenced by one or more quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: QuestionRef,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: Option<u32>,
}

impl QuestionRecord {
    /// Convert the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuizDefinitionError` if the stored question fails validation.
    pub fn into_question(self) -> Result<Question, QuizDefinitionError> {
        Question::new(self.prompt, self.options, self.correct_answer, self.points)
    }
}

/// A persisted result together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResult {
    pub id: ResultId,
    pub record: ResultRecord,
}

/// Read access to quizzes and the questions they reference.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Fetch a quiz by ID.
    ///
    /// Returns `Ok(None)` when no quiz exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the record is malformed.
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<QuizRecord>, StorageError>;

    /// Resolve a single question reference.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for a dangling reference, or other storage errors.
    async fn get_question(&self, id: &QuestionRef) -> Result<QuestionRecord, StorageError>;

    /// List quizzes ordered by ID, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or a record is malformed.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizRecord>, StorageError>;
}

/// Append-only store of quiz results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append a result record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result with the same submission id exists.
    async fn create_result(&self, record: &ResultRecord) -> Result<ResultId, StorageError>;

    /// Most recent results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredResult>, StorageError>;
}

/// Cumulative per-user profile.
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    /// Add `delta` to the user's points, creating the profile if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn increment_points(&self, user_id: &UserId, delta: u32) -> Result<(), StorageError>;

    /// Append an entry to the user's quiz history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn append_history(
        &self,
        user_id: &UserId,
        entry: &HistoryEntry,
    ) -> Result<(), StorageError>;

    /// Fetch a profile; `Ok(None)` if the user never submitted anything.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StorageError>;
}

/// Writes a result and its profile delta as one unit.
#[async_trait]
pub trait SubmissionPersistence: Send + Sync {
    /// Persist `record` and apply `delta` atomically.
    ///
    /// Idempotent on `record.submission_id`: a replay returns the result as it
    /// was first stored, even if the replayed record differs, and leaves the
    /// profile untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `delta` belongs to a different user than
    /// `record`, or other storage errors. On error nothing is written.
    async fn commit_submission(
        &self,
        record: &ResultRecord,
        delta: &UserProfileDelta,
    ) -> Result<StoredResult, StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    quizzes: BTreeMap<QuizId, Value>,
    questions: HashMap<QuestionRef, Value>,
    results: Vec<StoredResult>,
    profiles: HashMap<UserId, UserProfile>,
}

impl InMemoryState {
    fn find_submission(&self, submission_id: SubmissionId) -> Option<&StoredResult> {
        self.results
            .iter()
            .find(|r| r.record.submission_id == submission_id)
    }

    fn push_result(&mut self, record: &ResultRecord) -> StoredResult {
        let stored = StoredResult {
            id: ResultId::new(self.results.len() as u64 + 1),
            record: record.clone(),
        };
        self.results.push(stored.clone());
        stored
    }

    fn profile_mut(&mut self, user_id: &UserId) -> &mut UserProfile {
        self.profiles
            .entry(user_id.clone())
            .or_insert_with(|| UserProfile::empty(user_id.clone()))
    }
}

/// In-memory document store for tests and prototyping.
///
/// Quizzes and questions are kept as raw JSON documents, so reads go through
/// the same validation as a real document backend.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Store a raw quiz document as-is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_quiz_document(&self, id: QuizId, doc: Value) -> Result<(), StorageError> {
        self.lock()?.quizzes.insert(id, doc);
        Ok(())
    }

    /// Store a raw question document as-is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_question_document(
        &self,
        id: QuestionRef,
        doc: Value,
    ) -> Result<(), StorageError> {
        self.lock()?.questions.insert(id, doc);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn upsert_quiz(&self, quiz: &QuizRecord) -> Result<(), StorageError> {
        self.insert_quiz_document(quiz.id.clone(), quiz.to_document().into_value())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn upsert_question(&self, question: &QuestionRecord) -> Result<(), StorageError> {
        self.insert_question_document(question.id.clone(), question.to_document().into_value())
    }

    /// Number of stored results, for assertions in tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn result_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.results.len())
    }
}

#[async_trait]
impl QuizStore for InMemoryRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<QuizRecord>, StorageError> {
        let doc = self.lock()?.quizzes.get(id).cloned();
        doc.map(|value| QuizRecord::from_document(id.clone(), &Document::from_value(value)?))
            .transpose()
    }

    async fn get_question(&self, id: &QuestionRef) -> Result<QuestionRecord, StorageError> {
        let value = self
            .lock()?
            .questions
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound)?;
        QuestionRecord::from_document(id.clone(), &Document::from_value(value)?)
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizRecord>, StorageError> {
        let guard = self.lock()?;
        guard
            .quizzes
            .iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(id, value)| {
                QuizRecord::from_document(id.clone(), &Document::from_value(value.clone())?)
            })
            .collect()
    }
}

#[async_trait]
impl ResultStore for InMemoryRepository {
    async fn create_result(&self, record: &ResultRecord) -> Result<ResultId, StorageError> {
        let mut guard = self.lock()?;
        if guard.find_submission(record.submission_id).is_some() {
            return Err(StorageError::Conflict);
        }
        Ok(guard.push_result(record).id)
    }

    async fn results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredResult>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<StoredResult> = guard
            .results
            .iter()
            .filter(|r| &r.record.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.record
                .submitted_at
                .cmp(&a.record.submitted_at)
                .then(b.id.cmp(&a.id))
        });
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }
}

#[async_trait]
impl UserProfileStore for InMemoryRepository {
    async fn increment_points(&self, user_id: &UserId, delta: u32) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let profile = guard.profile_mut(user_id);
        profile.points = profile.points.saturating_add(u64::from(delta));
        Ok(())
    }

    async fn append_history(
        &self,
        user_id: &UserId,
        entry: &HistoryEntry,
    ) -> Result<(), StorageError> {
        self.lock()?.profile_mut(user_id).history.push(entry.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.lock()?.profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl SubmissionPersistence for InMemoryRepository {
    async fn commit_submission(
        &self,
        record: &ResultRecord,
        delta: &UserProfileDelta,
    ) -> Result<StoredResult, StorageError> {
        if delta.user_id != record.user_id {
            return Err(StorageError::Conflict);
        }

        // One guard for both writes keeps them atomic.
        let mut guard = self.lock()?;
        if let Some(existing) = guard.find_submission(record.submission_id) {
            return Ok(existing.clone());
        }
        let stored = guard.push_result(record);
        guard.profile_mut(&delta.user_id).apply(delta);
        Ok(stored)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizStore>,
    pub results: Arc<dyn ResultStore>,
    pub profiles: Arc<dyn UserProfileStore>,
    pub submissions: Arc<dyn SubmissionPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one repository value across every store role.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuizStore + ResultStore + UserProfileStore + SubmissionPersistence + Clone + 'static,
    {
        let quizzes: Arc<dyn QuizStore> = Arc::new(repo.clone());
        let results: Arc<dyn ResultStore> = Arc::new(repo.clone());
        let profiles: Arc<dyn UserProfileStore> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionPersistence> = Arc::new(repo);
        Self {
            quizzes,
            results,
            profiles,
            submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::AnswerMap;
    use quiz_core::time::fixed_now;
    use serde_json::json;

    fn record(user: &str, score: u32, minutes: i64) -> ResultRecord {
        ResultRecord {
            submission_id: SubmissionId::generate(),
            quiz_id: QuizId::new("quiz-1"),
            user_id: UserId::new(user),
            answers: AnswerMap::new(),
            score,
            submitted_at: fixed_now() + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn missing_quiz_reads_as_none_and_missing_question_as_not_found() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_quiz(&QuizId::new("nope")).await.unwrap().is_none());
        let err = repo
            .get_question(&QuestionRef::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn malformed_quiz_document_surfaces_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.insert_quiz_document(QuizId::new("bad"), json!({ "topic": 42 }))
            .unwrap();
        let err = repo.get_quiz(&QuizId::new("bad")).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn list_quizzes_is_ordered_and_limited() {
        let repo = InMemoryRepository::new();
        for id in ["b", "a", "c"] {
            repo.insert_quiz_document(
                QuizId::new(id),
                json!({ "topic": format!("Topic {id}"), "questions": [] }),
            )
            .unwrap();
        }
        let listed = repo.list_quizzes(2).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn create_result_rejects_duplicate_submission() {
        let repo = InMemoryRepository::new();
        let rec = record("u1", 3, 0);
        repo.create_result(&rec).await.unwrap();
        let err = repo.create_result(&rec).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn commit_submission_is_idempotent() {
        let repo = InMemoryRepository::new();
        let rec = record("u1", 4, 0);
        let delta = rec.profile_delta();

        let first = repo.commit_submission(&rec, &delta).await.unwrap();
        assert_eq!(first.record, rec);

        let mut changed = rec.clone();
        changed.score = 9;
        let replay = repo
            .commit_submission(&changed, &changed.profile_delta())
            .await
            .unwrap();
        assert_eq!(first, replay);
        assert_eq!(replay.record.score, 4);
        assert_eq!(repo.result_count().unwrap(), 1);

        let profile = repo.get_profile(&UserId::new("u1")).await.unwrap().unwrap();
        assert_eq!(profile.points, 4);
        assert_eq!(profile.history.len(), 1);
    }

    #[tokio::test]
    async fn commit_submission_rejects_mismatched_user() {
        let repo = InMemoryRepository::new();
        let rec = record("u1", 4, 0);
        let mut delta = rec.profile_delta();
        delta.user_id = UserId::new("u2");

        let err = repo.commit_submission(&rec, &delta).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.result_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn results_for_user_are_newest_first() {
        let repo = InMemoryRepository::new();
        repo.create_result(&record("u1", 1, 0)).await.unwrap();
        repo.create_result(&record("u2", 9, 5)).await.unwrap();
        repo.create_result(&record("u1", 2, 10)).await.unwrap();

        let results = repo.results_for_user(&UserId::new("u1"), 10).await.unwrap();
        let scores: Vec<_> = results.iter().map(|r| r.record.score).collect();
        assert_eq!(scores, vec![2, 1]);
    }

    #[tokio::test]
    async fn increment_and_append_build_profile() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        repo.increment_points(&user, 5).await.unwrap();
        repo.increment_points(&user, 2).await.unwrap();
        repo.append_history(
            &user,
            &HistoryEntry {
                quiz_id: QuizId::new("quiz-1"),
                score: 7,
                submitted_at: fixed_now(),
            },
        )
        .await
        .unwrap();

        let profile = repo.get_profile(&user).await.unwrap().unwrap();
        assert_eq!(profile.points, 7);
        assert_eq!(profile.history[0].quiz_id, QuizId::new("quiz-1"));
    }
}
