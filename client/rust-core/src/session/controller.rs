use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::api::QuizBackend;
use crate::errors::{CoreError, CoreResult};
use crate::models::{PerformanceRating, QuestionFeedbackResponse, QuizMode, QuizQuestion,
    SessionSummary};
use crate::session::results::build_summary;
use crate::session::state::{QuestionState, SessionState};

/// Seconds granted per unanswered question when the backend reports no
/// remaining time budget.
const DEFAULT_SECS_PER_QUESTION: i64 = 60;

/// Drives one quiz session: owns the per-question state store and timer,
/// navigates between questions, fires submit-if-changed at transition points
/// and detects completion.
///
/// Submissions are fire-and-forget spawned tasks; navigation never waits for
/// an acknowledgment. A per-question in-flight guard keeps submissions for
/// one question serialized, and success handlers only write the
/// last-submitted marker and reveal fields, never the live selection.
pub struct SessionController {
    session_id: String,
    mode: QuizMode,
    backend: Arc<dyn QuizBackend>,
    state: Arc<Mutex<SessionState>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    time_budget_secs: i64,
}

impl SessionController {
    /// Fetches the session's remaining questions and builds the initial
    /// state. An empty question set abandons the session: the server-side
    /// delete is best-effort and the caller gets `EmptySession` to navigate
    /// away on.
    pub async fn load(
        backend: Arc<dyn QuizBackend>,
        session_id: impl Into<String>,
        mode: QuizMode,
    ) -> CoreResult<Self> {
        let session_id = session_id.into();
        let response = backend.resume_session(&session_id).await?;

        if response.questions.is_empty() {
            if let Err(e) = backend.delete_session(&session_id).await {
                tracing::warn!("Error deleting empty session {}: {}", session_id, e);
            }
            return Err(CoreError::EmptySession);
        }

        let question_count = response.questions.len();
        let mut state = SessionState::from_questions(mode, response.questions);
        let time_budget_secs = response
            .time_left
            .unwrap_or(DEFAULT_SECS_PER_QUESTION * state.unanswered_count() as i64);
        state.start_timer_for_current();

        tracing::info!(
            "Session {} loaded: {} questions, mode {:?}, resuming at index {}",
            session_id,
            question_count,
            mode,
            state.current
        );

        Ok(Self {
            session_id,
            mode,
            backend,
            state: Arc::new(Mutex::new(state)),
            pending: Mutex::new(Vec::new()),
            time_budget_secs,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    /// Remaining time budget in seconds for the external countdown timer.
    pub fn time_budget_secs(&self) -> i64 {
        self.time_budget_secs
    }

    pub fn current_index(&self) -> usize {
        self.lock().current
    }

    pub fn question_count(&self) -> usize {
        self.lock().order.len()
    }

    pub fn current_question(&self) -> QuizQuestion {
        let state = self.lock();
        let question_id = state.current_question_id();
        state.states[&question_id].question.clone()
    }

    pub fn question_state(&self, question_id: &str) -> Option<QuestionState> {
        self.lock().states.get(question_id).cloned()
    }

    /// All question states in session order, for the navigation grid.
    pub fn question_states(&self) -> Vec<QuestionState> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.states.get(id).cloned())
            .collect()
    }

    /// Records the user's choice for the current question. Ignored once the
    /// answer has been revealed.
    pub fn select_option(&self, option_id: &str) {
        let mut state = self.lock();
        let question_id = state.current_question_id();
        let Some(q_state) = state.states.get_mut(&question_id) else {
            return;
        };
        if !q_state.answerable() {
            tracing::debug!(
                "Ignoring selection for revealed question {}",
                question_id
            );
            return;
        }
        if !q_state.question.options.iter().any(|o| o.id == option_id) {
            tracing::warn!(
                "Option {} does not belong to question {}, ignoring",
                option_id,
                question_id
            );
            return;
        }
        q_state.selected_option_id = Some(option_id.to_string());
    }

    /// Reveals the hint for the current question (tutor mode).
    pub fn show_hint(&self) {
        if self.mode != QuizMode::Tutor {
            tracing::debug!("Hints are only available in tutor mode");
            return;
        }
        let mut state = self.lock();
        let question_id = state.current_question_id();
        if let Some(q_state) = state.states.get_mut(&question_id) {
            q_state.show_hint = true;
        }
    }

    /// Self-assessed recall quality. Only accepted in review mode on a
    /// revealed question answered correctly; the rating rides along with the
    /// next submission for that question.
    pub fn rate_performance(&self, rating: PerformanceRating) {
        if self.mode != QuizMode::Review {
            tracing::debug!("Performance ratings are only collected in review mode");
            return;
        }
        let mut state = self.lock();
        let question_id = state.current_question_id();
        let Some(q_state) = state.states.get_mut(&question_id) else {
            return;
        };
        let correct = match (&q_state.selected_option_id, &q_state.correct_option_id) {
            (Some(selected), Some(correct)) => selected == correct,
            _ => false,
        };
        if !q_state.show_explanation || !correct {
            tracing::debug!(
                "Ignoring rating for question {}: not revealed or not correct",
                question_id
            );
            return;
        }
        q_state.performance_rating = Some(rating);
        q_state.show_rating = false;
    }

    /// Reveals the correct option and explanation for the current question
    /// without recording a submission, then finalizes its timer. Refused in
    /// test mode, where feedback is withheld until the session ends.
    pub async fn check_answer(&self) -> CoreResult<QuestionFeedbackResponse> {
        if self.mode == QuizMode::Test {
            tracing::debug!("Answer feedback is withheld in test mode");
            return Err(CoreError::FeedbackWithheld);
        }

        let question_id = { self.lock().current_question_id() };
        let feedback = self.backend.question_feedback(&question_id).await?;

        let mut state = self.lock();
        if let Some(q_state) = state.states.get_mut(&question_id) {
            q_state.explanation = Some(feedback.explanation.clone());
            q_state.correct_option_id = Some(feedback.correct_option_id.clone());
            q_state.show_explanation = true;
            q_state.show_rating = true;
        }
        state.suspend_timer_for(&question_id);

        Ok(feedback)
    }

    /// Moves to the question at `index`. Out-of-range indexes are refused
    /// rather than crashing an in-progress session. This is the timer
    /// suspension point: the outgoing question's elapsed time is finalized
    /// and the incoming question starts accruing.
    pub fn go_to(&self, index: usize) {
        let mut state = self.lock();
        if index >= state.order.len() {
            tracing::debug!(
                "Ignoring navigation to out-of-range index {} ({} questions)",
                index,
                state.order.len()
            );
            return;
        }
        state.suspend_current_timer();
        state.current = index;
        state.start_timer_for_current();
    }

    /// Submits the current question if its answer changed, then advances.
    pub fn next(&self) {
        let (question_id, target) = {
            let state = self.lock();
            (state.current_question_id(), state.current + 1)
        };
        self.spawn_submit_if_changed(question_id, false);
        self.go_to(target);
    }

    /// Submits the current question if its answer changed, then goes back.
    pub fn prev(&self) {
        let (question_id, current) = {
            let state = self.lock();
            (state.current_question_id(), state.current)
        };
        self.spawn_submit_if_changed(question_id, false);
        match current.checked_sub(1) {
            Some(target) => self.go_to(target),
            None => tracing::debug!("Ignoring prev at the first question"),
        }
    }

    /// Ends the session: final submit-if-changed with the completed flag,
    /// timer finalized, session marked done. In test mode this is the only
    /// completion trigger (user action or countdown expiry).
    pub fn end(&self) {
        let question_id = { self.lock().current_question_id() };
        self.spawn_submit_if_changed(question_id, true);

        let mut state = self.lock();
        state.suspend_current_timer();
        state.done = true;
        tracing::info!("Session {} marked done", self.session_id);
    }

    /// Waits for all outstanding submission tasks to settle. Failed
    /// submissions stay unacknowledged and retry naturally on the next
    /// transition.
    pub async fn drain_submissions(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            pending.drain(..).collect()
        };
        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!("Submission task panicked: {}", e);
            }
        }
    }

    /// Completion check, run by the caller after transition points.
    pub fn is_complete(&self) -> bool {
        self.lock().is_complete()
    }

    /// Assembles the results summary once the session is complete and closes
    /// the session; late submission responses after this are dropped.
    /// Returns `None` while incomplete, and on every call after the first.
    pub fn take_summary(&self) -> Option<SessionSummary> {
        let mut state = self.lock();
        if state.closed || !state.is_complete() {
            return None;
        }
        // Completion via the final submission leaves the current question's
        // timer running; fold that span in before reading totals.
        state.suspend_current_timer();
        let summary = build_summary(&state);
        state.closed = true;
        tracing::info!(
            "Session {} complete: {}/{} correct in {}",
            self.session_id,
            summary.correct_count,
            summary.results.len(),
            summary.total_time_hms()
        );
        Some(summary)
    }

    fn spawn_submit_if_changed(&self, question_id: String, completed: bool) {
        let submission = {
            let mut state = self.lock();
            match state.prepare_submission(&question_id, completed) {
                Some(submission) => submission,
                None => return,
            }
        };

        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let session_id = self.session_id.clone();

        let handle = tokio::spawn(async move {
            let result = backend.submit_answer(&session_id, &submission).await;
            let mut state = state.lock().expect("session state lock poisoned");
            match result {
                Ok(response) => {
                    if state.closed {
                        tracing::debug!(
                            "Dropping submission result for closed session {}",
                            session_id
                        );
                    } else {
                        state.apply_submission_success(&submission, &response);
                        tracing::info!(
                            "Answer recorded: session={}, question={}, correct={}",
                            session_id,
                            submission.question_id,
                            response.is_correct
                        );
                    }
                }
                Err(e) => {
                    // No state change on failure: the selection still differs
                    // from the last submitted one, so the next transition
                    // resubmits.
                    tracing::error!(
                        "Error submitting answer for question {}: {}",
                        submission.question_id,
                        e
                    );
                }
            }
            state.in_flight.remove(&submission.question_id);
        });

        self.pending
            .lock()
            .expect("pending lock poisoned")
            .push(handle);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }
}
