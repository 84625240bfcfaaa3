use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use medquiz_core::api::QuizBackend;
use medquiz_core::errors::{CoreError, CoreResult};
use medquiz_core::models::{
    AnswerSubmissionRequest, AnswerSubmissionResponse, QuestionFeedbackResponse, QuestionKind,
    QuestionResult, QuizMode, QuizOption, QuizQuestion, SessionResponse,
};
use medquiz_core::SessionController;

pub fn init_tracing() {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// In-memory backend that records every call, with per-question answer keys
/// and optional failure/latency injection for the submission pipeline tests.
pub struct MockBackend {
    pub questions: Vec<QuizQuestion>,
    pub time_left: Option<i64>,
    /// Correct option id per question, used to grade submissions and serve
    /// feedback requests.
    pub answer_key: HashMap<String, String>,
    pub submissions: Mutex<Vec<AnswerSubmissionRequest>>,
    pub deleted_sessions: Mutex<Vec<String>>,
    /// Number of submissions to fail before succeeding again.
    pub submit_failures_left: AtomicUsize,
    /// Artificial latency before a submission resolves.
    pub submit_delay: Option<Duration>,
    /// Canned camelCase results payload served by `session_results`.
    pub results_payload: Option<String>,
}

impl MockBackend {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let answer_key = questions
            .iter()
            .filter_map(|q| {
                q.options
                    .iter()
                    .find(|o| o.is_correct == Some(true))
                    .map(|o| (q.id.clone(), o.id.clone()))
            })
            .collect();

        Self {
            questions,
            time_left: None,
            answer_key,
            submissions: Mutex::new(Vec::new()),
            deleted_sessions: Mutex::new(Vec::new()),
            submit_failures_left: AtomicUsize::new(0),
            submit_delay: None,
            results_payload: None,
        }
    }

    pub fn with_time_left(mut self, secs: i64) -> Self {
        self.time_left = Some(secs);
        self
    }

    pub fn failing_submissions(self, count: usize) -> Self {
        self.submit_failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn with_results_payload(mut self, json: &str) -> Self {
        self.results_payload = Some(json.to_string());
        self
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn recorded_submissions(&self) -> Vec<AnswerSubmissionRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizBackend for MockBackend {
    async fn resume_session(&self, session_id: &str) -> CoreResult<SessionResponse> {
        Ok(SessionResponse {
            session_id: Some(session_id.to_string()),
            questions: self.questions.clone(),
            time_left: self.time_left,
        })
    }

    async fn submit_answer(
        &self,
        _session_id: &str,
        submission: &AnswerSubmissionRequest,
    ) -> CoreResult<AnswerSubmissionResponse> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        // Every attempt is recorded, including the ones that fail
        self.submissions.lock().unwrap().push(submission.clone());

        if self
            .submit_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CoreError::Backend {
                status: 500,
                detail: "injected submission failure".to_string(),
            });
        }

        let correct_option_id = self
            .answer_key
            .get(&submission.question_id)
            .cloned()
            .unwrap_or_default();
        Ok(AnswerSubmissionResponse {
            is_correct: submission.selected_option_id == correct_option_id,
            correct_option_id,
            explanation: format!("Explanation for {}", submission.question_id),
        })
    }

    async fn question_feedback(&self, question_id: &str) -> CoreResult<QuestionFeedbackResponse> {
        let correct_option_id =
            self.answer_key
                .get(question_id)
                .cloned()
                .ok_or(CoreError::Backend {
                    status: 404,
                    detail: format!("unknown question {}", question_id),
                })?;
        Ok(QuestionFeedbackResponse {
            explanation: format!("Explanation for {}", question_id),
            correct_option_id,
        })
    }

    async fn delete_session(&self, session_id: &str) -> CoreResult<()> {
        self.deleted_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(())
    }

    async fn session_results(&self, _session_id: &str) -> CoreResult<Vec<QuestionResult>> {
        match self.results_payload.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Question fixture with options "{id}-a".."{id}-d"; the second option is
/// the correct one.
pub fn question(id: &str) -> QuizQuestion {
    QuizQuestion {
        id: id.to_string(),
        question_text: format!("What is the answer to {}?", id),
        kind: QuestionKind::Review,
        options: ["a", "b", "c", "d"]
            .iter()
            .map(|suffix| QuizOption {
                id: format!("{}-{}", id, suffix),
                option_text: format!("Option {}", suffix.to_uppercase()),
                is_correct: Some(*suffix == "b"),
            })
            .collect(),
        hint: Some(format!("Hint for {}", id)),
        correct_option: None,
        explanation: None,
        option_picked_id: None,
        is_correct: None,
        time_to_answer_ms: None,
        needs_review: None,
    }
}

/// Same fixture with prior progress attached.
pub fn answered_question(id: &str, picked_suffix: &str, prior_ms: u64) -> QuizQuestion {
    let mut q = question(id);
    q.option_picked_id = Some(format!("{}-{}", id, picked_suffix));
    q.correct_option = Some(format!("{}-b", id));
    q.time_to_answer_ms = Some(prior_ms);
    q
}

pub async fn load_controller(
    backend: Arc<MockBackend>,
    mode: QuizMode,
) -> SessionController {
    init_tracing();
    SessionController::load(backend, "session-1", mode)
        .await
        .expect("failed to load session")
}
