pub mod auth;
pub mod question;
pub mod results;
pub mod session;

pub use auth::{AuthResponse, RefreshResponse, UserLogin};
pub use question::{PerformanceRating, QuestionKind, QuizOption, QuizQuestion};
pub use results::{QuestionResult, SessionSummary};
pub use session::{
    ActiveSessionResponse, AnswerSubmissionRequest, AnswerSubmissionResponse, NewSessionRequest,
    QuestionFeedbackResponse, QuizMode, SessionCreateResponse, SessionResponse,
};
