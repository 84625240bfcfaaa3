use serde::{Deserialize, Serialize};

/// A single answer option. `is_correct` is only present once the backend has
/// revealed the answer (feedback endpoint or submission response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub option_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Test,
    Review,
    Tutor,
}

/// A question as served for a quiz session, including any prior progress.
/// Immutable once loaded; the client only mutates its own interaction state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question_text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<QuizOption>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub correct_option: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub option_picked_id: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub time_to_answer_ms: Option<u64>,
    #[serde(default)]
    pub needs_review: Option<bool>,
}

impl QuizQuestion {
    pub fn option_text(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.option_text.as_str())
    }
}

/// Self-assessed recall quality, collected in review mode after a correct
/// answer. Drives the backend's spaced-repetition scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Forgot,
    Struggled,
    Recalled,
    Effortless,
}
