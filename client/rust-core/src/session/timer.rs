use std::collections::HashMap;
use std::time::Instant;

/// Upper bound on active time recorded against a single question, so a tab
/// left open overnight cannot record implausible study times.
pub const MAX_QUESTION_MS: u64 = 5 * 60 * 1000;

/// Per-question active-time accumulator with a single running slot: only the
/// currently visible question accrues time. Owned by the session state
/// rather than floating in a closure, so start/stop happen at explicit
/// navigation points.
#[derive(Debug, Default)]
pub struct TimerAccumulator {
    running: Option<(String, Instant)>,
    accumulated: HashMap<String, u64>,
}

impl TimerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds prior elapsed time reported by the backend, clamped to the cap
    /// so the bound covers a question's lifetime, not one page load.
    pub fn seed(&mut self, question_id: &str, elapsed_ms: u64) {
        self.accumulated
            .insert(question_id.to_string(), elapsed_ms.min(MAX_QUESTION_MS));
    }

    /// Starts timing a question. No-op while any timer is already running.
    pub fn start(&mut self, question_id: &str) {
        self.start_at(question_id, Instant::now());
    }

    /// Stops the running timer for this question and folds the clamped delta
    /// into its total. If this question's timer is not the one running, the
    /// stored total is returned unchanged.
    pub fn stop_and_accumulate(&mut self, question_id: &str) -> u64 {
        self.stop_at(question_id, Instant::now())
    }

    pub fn accumulated(&self, question_id: &str) -> u64 {
        self.accumulated.get(question_id).copied().unwrap_or(0)
    }

    /// Total including the in-flight span of a currently running timer,
    /// without stopping it. Used when a submission snapshots elapsed time.
    pub fn current_total(&self, question_id: &str) -> u64 {
        self.current_total_at(question_id, Instant::now())
    }

    fn start_at(&mut self, question_id: &str, now: Instant) {
        if self.running.is_some() {
            return;
        }
        self.running = Some((question_id.to_string(), now));
    }

    fn stop_at(&mut self, question_id: &str, now: Instant) -> u64 {
        match self.running.take() {
            Some((running_id, started)) if running_id == question_id => {
                let delta = now.saturating_duration_since(started).as_millis() as u64;
                let prev = self.accumulated(question_id);
                let total = prev.saturating_add(delta).min(MAX_QUESTION_MS);
                self.accumulated.insert(question_id.to_string(), total);
                total
            }
            other => {
                // Leave an unrelated running timer untouched
                self.running = other;
                self.accumulated(question_id)
            }
        }
    }

    fn current_total_at(&self, question_id: &str, now: Instant) -> u64 {
        let base = self.accumulated(question_id);
        match &self.running {
            Some((running_id, started)) if running_id == question_id => {
                let delta = now.saturating_duration_since(*started).as_millis() as u64;
                base.saturating_add(delta).min(MAX_QUESTION_MS)
            }
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn accumulates_across_start_stop_cycles() {
        let mut timer = TimerAccumulator::new();
        let t0 = Instant::now();

        timer.start_at("q1", t0);
        let total = timer.stop_at("q1", t0 + Duration::from_secs(10));
        assert_eq!(total, 10_000);

        timer.start_at("q1", t0 + Duration::from_secs(60));
        let total = timer.stop_at("q1", t0 + Duration::from_secs(65));
        assert_eq!(total, 15_000);
        assert_eq!(timer.accumulated("q1"), 15_000);
    }

    #[test]
    fn total_never_exceeds_cap() {
        let mut timer = TimerAccumulator::new();
        let t0 = Instant::now();

        timer.start_at("q1", t0);
        let total = timer.stop_at("q1", t0 + Duration::from_secs(400));
        assert_eq!(total, MAX_QUESTION_MS);

        // Further sessions on the same question stay clamped
        timer.start_at("q1", t0 + Duration::from_secs(500));
        let total = timer.stop_at("q1", t0 + Duration::from_secs(600));
        assert_eq!(total, MAX_QUESTION_MS);
    }

    #[test]
    fn cap_applies_to_the_sum_with_prior_time() {
        let mut timer = TimerAccumulator::new();
        timer.seed("q1", 295_000);

        let t0 = Instant::now();
        timer.start_at("q1", t0);
        let total = timer.stop_at("q1", t0 + Duration::from_secs(30));
        assert_eq!(total, MAX_QUESTION_MS);
    }

    #[test]
    fn seed_is_clamped() {
        let mut timer = TimerAccumulator::new();
        timer.seed("q1", 10 * 60 * 1000);
        assert_eq!(timer.accumulated("q1"), MAX_QUESTION_MS);
    }

    #[test]
    fn only_one_timer_runs_at_a_time() {
        let mut timer = TimerAccumulator::new();
        let t0 = Instant::now();

        timer.start_at("q1", t0);
        // q2's start is a no-op while q1 is running
        timer.start_at("q2", t0 + Duration::from_secs(1));

        assert_eq!(timer.stop_at("q2", t0 + Duration::from_secs(5)), 0);

        // q1 was still the running timer all along
        let total = timer.stop_at("q1", t0 + Duration::from_secs(8));
        assert_eq!(total, 8_000);
        assert_eq!(timer.accumulated("q2"), 0);
    }

    #[test]
    fn stop_without_running_timer_returns_existing_total() {
        let mut timer = TimerAccumulator::new();
        timer.seed("q1", 4_000);
        assert_eq!(timer.stop_and_accumulate("q1"), 4_000);
    }

    #[test]
    fn current_total_includes_running_span() {
        let mut timer = TimerAccumulator::new();
        let t0 = Instant::now();

        timer.start_at("q1", t0);
        assert_eq!(
            timer.current_total_at("q1", t0 + Duration::from_secs(3)),
            3_000
        );
        // Peeking does not stop the timer
        let total = timer.stop_at("q1", t0 + Duration::from_secs(5));
        assert_eq!(total, 5_000);
    }
}
