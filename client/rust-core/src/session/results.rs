use crate::models::{QuestionResult, SessionSummary};
use crate::session::state::SessionState;

/// Assembles the ordered results list and totals for a completed session.
/// A question counts as correct only when both a selected and a revealed
/// correct option exist and they match.
pub(crate) fn build_summary(state: &SessionState) -> SessionSummary {
    let mut results = Vec::with_capacity(state.order.len());
    let mut total_time_ms: u64 = 0;

    for question_id in &state.order {
        let Some(q_state) = state.states.get(question_id) else {
            continue;
        };
        let question = &q_state.question;

        let user_answer = q_state
            .selected_option_id
            .as_deref()
            .and_then(|id| question.option_text(id))
            .unwrap_or_default()
            .to_string();
        let correct_answer = q_state
            .correct_option_id
            .as_deref()
            .and_then(|id| question.option_text(id))
            .unwrap_or_default()
            .to_string();

        let is_correct = match (&q_state.selected_option_id, &q_state.correct_option_id) {
            (Some(selected), Some(correct)) => selected == correct,
            _ => false,
        };

        let time_to_answer_ms = state.timer.accumulated(question_id);
        total_time_ms += time_to_answer_ms;

        results.push(QuestionResult {
            question_id: question_id.clone(),
            question_text: question.question_text.clone(),
            user_answer,
            correct_answer,
            is_correct,
            explanation: q_state.explanation.clone(),
            time_to_answer_ms,
        });
    }

    let correct_count = results.iter().filter(|r| r.is_correct).count();

    SessionSummary {
        results,
        correct_count,
        total_time_ms,
    }
}
