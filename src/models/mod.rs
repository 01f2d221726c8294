pub mod event;
pub mod question;
pub mod session_config;

pub use event::{EventPayload, SessionEvent};
pub use question::{AnswerOutcome, AnsweredQuestion, Question, QuestionKind, QuestionOption};
pub use session_config::SessionConfig;
