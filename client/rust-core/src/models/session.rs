use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::question::{PerformanceRating, QuizQuestion};

/// How a session is run: test (timed, feedback withheld until the end),
/// review (spaced-repetition, immediate feedback) or tutor (untimed, hints).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    Test,
    Review,
    Tutor,
}

impl FromStr for QuizMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" => Ok(QuizMode::Test),
            "review" => Ok(QuizMode::Review),
            "tutor" => Ok(QuizMode::Tutor),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// Response to resuming a session: the questions left (answered ones carry
/// prior progress) and the remaining time budget in seconds, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: Option<String>,
    pub questions: Vec<QuizQuestion>,
    #[serde(rename = "timeLeft", default)]
    pub time_left: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSessionRequest {
    pub tag_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSessionResponse {
    pub id: String,
    pub session_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmissionRequest {
    pub question_id: String,
    pub selected_option_id: String,
    pub performance_rating: Option<PerformanceRating>,
    pub time_to_answer_ms: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmissionResponse {
    pub is_correct: bool,
    pub correct_option_id: String,
    pub explanation: String,
}

/// Reveal payload for the "check answer before committing" flow; does not
/// record a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFeedbackResponse {
    pub explanation: String,
    pub correct_option_id: String,
}
