mod service;
mod session;

// Public API of the quiz session subsystem.
pub use service::QuizSessionService;
pub use session::{QuizSession, SessionProgress, SessionStatus};
