use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::{AnswerMap, QuizDefinition, ResultId, ResultRecord, SubmissionId};
use storage::repository::SubmissionPersistence;
use tracing::{info, warn};

use crate::Clock;
use crate::error::QuizError;
use crate::identity::AuthProvider;

/// What the user sees after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub result_id: ResultId,
    pub score: u32,
    pub total_points: u32,
}

type InFlightSet = Arc<Mutex<HashSet<SubmissionId>>>;

fn lock_set(set: &InFlightSet) -> MutexGuard<'_, HashSet<SubmissionId>> {
    // The set holds plain ids; a panic elsewhere cannot leave it inconsistent.
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the single-flight latch when the submit attempt ends, however it ends.
struct InFlight {
    set: InFlightSet,
    id: SubmissionId,
}

impl InFlight {
    fn acquire(set: &InFlightSet, id: SubmissionId) -> Option<Self> {
        if !lock_set(set).insert(id) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            id,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock_set(&self.set).remove(&self.id);
    }
}

/// Scores an answer set and persists the result with its profile update.
#[derive(Clone)]
pub struct ResultSubmitter {
    clock: Clock,
    auth: Arc<dyn AuthProvider>,
    submissions: Arc<dyn SubmissionPersistence>,
    in_flight: InFlightSet,
}

impl ResultSubmitter {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        submissions: Arc<dyn SubmissionPersistence>,
    ) -> Self {
        Self {
            clock,
            auth,
            submissions,
            in_flight: Arc::default(),
        }
    }

    /// Score `answers` against `quiz` and persist the result for the current user.
    ///
    /// Identity is checked before anything is written. Only one submit per
    /// `submission_id` may run at a time, and a replay of an already committed
    /// submission returns the stored result id without touching the profile.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unauthenticated` when no user is signed in,
    /// `QuizError::SubmissionInProgress` when the same submission is already
    /// being written, and `QuizError::Submit` when persistence fails. No error
    /// leaves a partial write behind.
    pub async fn submit(
        &self,
        submission_id: SubmissionId,
        quiz: &QuizDefinition,
        answers: &AnswerMap,
    ) -> Result<SubmissionOutcome, QuizError> {
        let Some(user_id) = self.auth.current_identity() else {
            warn!(quiz_id = %quiz.id(), "submit rejected: no signed-in user");
            return Err(QuizError::Unauthenticated);
        };

        let Some(_latch) = InFlight::acquire(&self.in_flight, submission_id) else {
            return Err(QuizError::SubmissionInProgress);
        };

        let record = ResultRecord::scored(
            submission_id,
            quiz,
            user_id,
            answers.clone(),
            self.clock.now(),
        );
        let delta = record.profile_delta();

        let stored = self
            .submissions
            .commit_submission(&record, &delta)
            .await
            .map_err(|err| {
                warn!(
                    quiz_id = %record.quiz_id,
                    submission_id = %submission_id,
                    error = %err,
                    "submission failed"
                );
                QuizError::Submit(err)
            })?;

        // On a replay the stored record wins over the answers passed in now.
        info!(
            quiz_id = %stored.record.quiz_id,
            user_id = %stored.record.user_id,
            result_id = %stored.id,
            score = stored.record.score,
            total = quiz.total_points(),
            "quiz submitted"
        );

        Ok(SubmissionOutcome {
            result_id: stored.id,
            score: stored.record.score,
            total_points: quiz.total_points(),
        })
    }
}
