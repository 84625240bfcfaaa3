use async_trait::async_trait;

use crate::errors::CoreResult;
use crate::models::{
    AnswerSubmissionRequest, AnswerSubmissionResponse, QuestionFeedbackResponse, QuestionResult,
    SessionResponse,
};

/// The backend operations the session core depends on. `ApiClient` is the
/// production implementation; tests substitute an in-memory recorder.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Fetches the questions remaining in a session, with any prior progress
    /// and the remaining time budget in seconds.
    async fn resume_session(&self, session_id: &str) -> CoreResult<SessionResponse>;

    /// Persists one answer and returns the graded outcome.
    async fn submit_answer(
        &self,
        session_id: &str,
        submission: &AnswerSubmissionRequest,
    ) -> CoreResult<AnswerSubmissionResponse>;

    /// Reveals the correct option and explanation without recording a
    /// submission.
    async fn question_feedback(&self, question_id: &str) -> CoreResult<QuestionFeedbackResponse>;

    /// Removes an empty or abandoned session.
    async fn delete_session(&self, session_id: &str) -> CoreResult<()>;

    /// Fetches persisted per-question outcomes for the results view.
    async fn session_results(&self, session_id: &str) -> CoreResult<Vec<QuestionResult>>;
}
