use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answers::AnswerMap;
use crate::model::ids::{QuizId, SubmissionId, UserId};
use crate::model::quiz::QuizDefinition;
use crate::scoring::score;

/// Immutable record of one completed quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub submission_id: SubmissionId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub answers: AnswerMap,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Score `answers` against `quiz` and build the record.
    #[must_use]
    pub fn scored(
        submission_id: SubmissionId,
        quiz: &QuizDefinition,
        user_id: UserId,
        answers: AnswerMap,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let score = score(quiz, &answers);
        Self {
            submission_id,
            quiz_id: quiz.id().clone(),
            user_id,
            answers,
            score,
            submitted_at,
        }
    }

    /// Profile change this result implies.
    #[must_use]
    pub fn profile_delta(&self) -> UserProfileDelta {
        UserProfileDelta {
            user_id: self.user_id.clone(),
            points: self.score,
            history: HistoryEntry {
                quiz_id: self.quiz_id.clone(),
                score: self.score,
                submitted_at: self.submitted_at,
            },
        }
    }
}

/// One line of a user's quiz history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub quiz_id: QuizId,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Points increment plus history append applied after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfileDelta {
    pub user_id: UserId,
    pub points: u32,
    pub history: HistoryEntry,
}

/// Cumulative profile state as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub points: u64,
    pub history: Vec<HistoryEntry>,
}

impl UserProfile {
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            history: Vec::new(),
        }
    }

    /// Apply a delta in place; used by backends without a query language.
    pub fn apply(&mut self, delta: &UserProfileDelta) {
        self.points = self.points.saturating_add(u64::from(delta.points));
        self.history.push(delta.history.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quiz::Question;
    use crate::time::fixed_now;

    fn quiz() -> QuizDefinition {
        let q = |correct: &str| {
            Question::new(
                "Pick one",
                vec!["A".into(), "B".into()],
                correct,
                Some(3),
            )
            .unwrap()
        };
        QuizDefinition::new(QuizId::new("quiz-1"), "Letters", vec![q("A"), q("B")]).unwrap()
    }

    #[test]
    fn scored_record_carries_recomputable_score() {
        let answers: AnswerMap = [(0, "A"), (1, "A")].into_iter().collect();
        let record = ResultRecord::scored(
            SubmissionId::generate(),
            &quiz(),
            UserId::new("u1"),
            answers.clone(),
            fixed_now(),
        );
        assert_eq!(record.score, 3);
        assert_eq!(record.score, score(&quiz(), &answers));
        assert_eq!(record.quiz_id, QuizId::new("quiz-1"));
    }

    #[test]
    fn profile_delta_mirrors_record() {
        let record = ResultRecord::scored(
            SubmissionId::generate(),
            &quiz(),
            UserId::new("u1"),
            [(1, "B")].into_iter().collect(),
            fixed_now(),
        );
        let delta = record.profile_delta();

        let mut profile = UserProfile::empty(UserId::new("u1"));
        profile.apply(&delta);
        profile.apply(&delta);
        assert_eq!(profile.points, 6);
        assert_eq!(profile.history.len(), 2);
        assert_eq!(profile.history[0].score, 3);
        assert_eq!(profile.history[0].submitted_at, fixed_now());
    }
}
