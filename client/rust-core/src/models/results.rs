use serde::{Deserialize, Serialize};

use crate::utils::time::format_hms;

/// One per-question outcome, in session order. Wire names are camelCase to
/// match the persisted results payload served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    pub question_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
    pub time_to_answer_ms: u64,
}

/// The assembled results view for a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub results: Vec<QuestionResult>,
    pub correct_count: usize,
    pub total_time_ms: u64,
}

impl SessionSummary {
    pub fn total_time_hms(&self) -> String {
        format_hms(self.total_time_ms)
    }
}
