use std::collections::{HashMap, HashSet};

use crate::models::{
    AnswerSubmissionRequest, AnswerSubmissionResponse, PerformanceRating, QuizMode, QuizQuestion,
};
use crate::session::timer::{TimerAccumulator, MAX_QUESTION_MS};

/// Interaction state for one question, keyed by question id in the session
/// store. The loaded question body itself is immutable.
#[derive(Debug, Clone)]
pub struct QuestionState {
    pub index: usize,
    pub question: QuizQuestion,
    pub selected_option_id: Option<String>,
    /// The choice last acknowledged by the backend; submission fires only
    /// when the live selection differs from this.
    pub last_submitted_option_id: Option<String>,
    pub submitted: bool,
    pub show_explanation: bool,
    pub show_hint: bool,
    pub show_rating: bool,
    pub elapsed_ms: u64,
    pub performance_rating: Option<PerformanceRating>,
    pub correct_option_id: Option<String>,
    pub explanation: Option<String>,
}

impl QuestionState {
    /// Selection is enabled until the answer has been revealed.
    pub fn answerable(&self) -> bool {
        !self.show_explanation
    }
}

/// The single mutable resource of a quiz session: per-question states, the
/// visit order, the timer and the in-flight submission guard. Owned by the
/// controller behind a mutex; never shared across sessions.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) mode: QuizMode,
    pub(crate) states: HashMap<String, QuestionState>,
    pub(crate) order: Vec<String>,
    pub(crate) current: usize,
    pub(crate) done: bool,
    pub(crate) closed: bool,
    pub(crate) in_flight: HashSet<String>,
    pub(crate) timer: TimerAccumulator,
}

impl SessionState {
    /// Builds the store from the session's question list: previously answered
    /// questions first (stable order), one state per question seeded from any
    /// prior progress, resuming at the first unanswered question.
    pub(crate) fn from_questions(mode: QuizMode, mut questions: Vec<QuizQuestion>) -> Self {
        questions.sort_by_key(|q| q.option_picked_id.is_none());

        let mut states = HashMap::with_capacity(questions.len());
        let mut order = Vec::with_capacity(questions.len());
        let mut timer = TimerAccumulator::new();

        for (index, question) in questions.into_iter().enumerate() {
            let answered = question.option_picked_id.is_some();
            let prior_ms = question.time_to_answer_ms.unwrap_or(0);
            let test_mode = mode == QuizMode::Test;

            timer.seed(&question.id, prior_ms);
            order.push(question.id.clone());
            states.insert(
                question.id.clone(),
                QuestionState {
                    index,
                    selected_option_id: question.option_picked_id.clone(),
                    last_submitted_option_id: question.option_picked_id.clone(),
                    submitted: answered,
                    show_explanation: if test_mode { false } else { answered },
                    show_hint: if test_mode { true } else { answered },
                    show_rating: if test_mode { true } else { answered },
                    elapsed_ms: prior_ms.min(MAX_QUESTION_MS),
                    performance_rating: None,
                    correct_option_id: question.correct_option.clone(),
                    explanation: question.explanation.clone(),
                    question,
                },
            );
        }

        let current = Self::resume_index(&order, &states);

        Self {
            mode,
            states,
            order,
            current,
            done: false,
            closed: false,
            in_flight: HashSet::new(),
            timer,
        }
    }

    /// First unanswered question, or index 0 when every question is already
    /// answered.
    fn resume_index(order: &[String], states: &HashMap<String, QuestionState>) -> usize {
        order
            .iter()
            .position(|id| states.get(id).is_some_and(|s| !s.submitted))
            .unwrap_or(0)
    }

    pub(crate) fn current_question_id(&self) -> String {
        self.order[self.current].clone()
    }

    pub(crate) fn unanswered_count(&self) -> usize {
        self.states.values().filter(|s| !s.submitted).count()
    }

    /// Test mode always times the visible question; feedback modes stop
    /// timing once the answer has been revealed.
    pub(crate) fn start_timer_for_current(&mut self) {
        let question_id = self.current_question_id();
        let timed = match self.states.get(&question_id) {
            Some(state) => self.mode == QuizMode::Test || !state.show_explanation,
            None => false,
        };
        if timed {
            self.timer.start(&question_id);
        }
    }

    pub(crate) fn suspend_current_timer(&mut self) {
        let question_id = self.current_question_id();
        self.suspend_timer_for(&question_id);
    }

    pub(crate) fn suspend_timer_for(&mut self, question_id: &str) {
        let total = self.timer.stop_and_accumulate(question_id);
        if let Some(state) = self.states.get_mut(question_id) {
            state.elapsed_ms = total;
        }
    }

    /// Change-detection and the in-flight guard. Returns the submission to
    /// fire, or `None` when nothing changed, nothing is selected, or a
    /// submission for this question is already outstanding.
    pub(crate) fn prepare_submission(
        &mut self,
        question_id: &str,
        completed: bool,
    ) -> Option<AnswerSubmissionRequest> {
        if self.in_flight.contains(question_id) {
            tracing::debug!(
                "Submission already in flight for question {}, skipping",
                question_id
            );
            return None;
        }

        let state = self.states.get(question_id)?;
        let selected = state.selected_option_id.clone()?;
        if state.last_submitted_option_id.as_deref() == Some(selected.as_str()) {
            return None;
        }

        let time_to_answer_ms = self.timer.current_total(question_id);
        self.in_flight.insert(question_id.to_string());

        Some(AnswerSubmissionRequest {
            question_id: question_id.to_string(),
            selected_option_id: selected,
            performance_rating: state.performance_rating,
            time_to_answer_ms,
            completed,
        })
    }

    /// Applied only on backend acknowledgment; the live selection is never
    /// touched here, so a late response cannot clobber a newer choice.
    pub(crate) fn apply_submission_success(
        &mut self,
        submission: &AnswerSubmissionRequest,
        response: &AnswerSubmissionResponse,
    ) {
        if let Some(state) = self.states.get_mut(&submission.question_id) {
            state.last_submitted_option_id = Some(submission.selected_option_id.clone());
            state.submitted = true;
            state.correct_option_id = Some(response.correct_option_id.clone());
            state.explanation = Some(response.explanation.clone());
            state.elapsed_ms = submission.time_to_answer_ms.min(MAX_QUESTION_MS);
        }
    }

    /// Review/tutor sessions complete once every question is submitted; test
    /// sessions only on an explicit end (user action or countdown expiry).
    pub(crate) fn is_complete(&self) -> bool {
        match self.mode {
            QuizMode::Test => self.done,
            _ => !self.states.is_empty() && self.states.values().all(|s| s.submitted),
        }
    }
}
