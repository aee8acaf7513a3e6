mod answers;
mod ids;
mod quiz;
mod result;
mod session;

pub use answers::AnswerMap;
pub use ids::{ParseIdError, QuestionRef, QuizId, ResultId, SubmissionId, UserId};
pub use quiz::{DEFAULT_QUESTION_POINTS, Question, QuizDefinition, QuizDefinitionError};
pub use result::{HistoryEntry, ResultRecord, UserProfile, UserProfileDelta};
pub use session::{Direction, SessionError, SessionState};
