use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::{ExamQuestion, MultipleChoice};
use super::scoring::{self, TopicScore};

/// Seconds granted per question when a session is built with [`ExamSession::new`].
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 120;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("an exam needs at least one question")]
    Empty,

    #[error("option {option} is out of range for a question with {len} options")]
    OptionOutOfRange { option: usize, len: usize },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamPhase {
    InProgress,
    /// Terminal. Answers and the countdown are frozen; navigation still works for review.
    Submitted,
}

/// What a single `tick()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown moved; carries the seconds left.
    Counting(u32),
    /// This tick took the countdown to zero and submitted the exam.
    TimedOut,
    /// Nothing happened: the exam was already submitted.
    Idle,
}

/// Per-question view used when reviewing a submitted exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionReview {
    pub selected: Option<usize>,
    pub correct_option: usize,
    pub is_correct: bool,
}

/// Snapshot of the outcome, suitable for the host to award XP and render results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResult {
    pub score: u8,
    pub correct: u32,
    pub total: u32,
    pub topics: Vec<TopicScore>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed exam over a fixed list of questions.
///
/// The session never owns a timer: the host calls [`ExamSession::tick`] once per
/// second. Every operation is safe to call redundantly, so a tick racing a manual
/// submit cannot corrupt state.
#[derive(Debug, Clone)]
pub struct ExamSession {
    questions: Vec<ExamQuestion>,
    current: usize,
    answers: Vec<Option<usize>>,
    phase: ExamPhase,
    remaining_seconds: u32,
}

impl ExamSession {
    /// Start an exam with [`DEFAULT_SECONDS_PER_QUESTION`] per question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<ExamQuestion>) -> Result<Self, ExamError> {
        Self::with_seconds_per_question(questions, DEFAULT_SECONDS_PER_QUESTION)
    }

    /// Start an exam with a custom per-question time allowance.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Empty` if `questions` is empty.
    pub fn with_seconds_per_question(
        questions: Vec<ExamQuestion>,
        seconds_per_question: u32,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::Empty);
        }
        let count = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        let remaining_seconds = count.saturating_mul(seconds_per_question);

        Ok(Self {
            answers: vec![None; questions.len()],
            questions,
            current: 0,
            phase: ExamPhase::InProgress,
            remaining_seconds,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &ExamQuestion {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == ExamPhase::Submitted
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Fraction of questions answered, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        self.answered_count() as f32 / self.questions.len() as f32
    }

    /// Select an option for the current question, replacing any earlier choice.
    ///
    /// No-op once the exam is submitted.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::OptionOutOfRange` if `option` is not an index into the
    /// current question's options. State is left untouched.
    pub fn select_answer(&mut self, option: usize) -> Result<(), ExamError> {
        if self.is_submitted() {
            return Ok(());
        }
        let question = &self.questions[self.current];
        if !question.accepts(option) {
            return Err(ExamError::OptionOutOfRange {
                option,
                len: question.as_question().option_count(),
            });
        }
        self.answers[self.current] = Some(option);
        Ok(())
    }

    /// Jump to `index`, clamped to the last question.
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.questions.len() - 1);
    }

    pub fn next(&mut self) {
        self.go_to(self.current.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.go_to(self.current.saturating_sub(1));
    }

    /// Advance the countdown by one second; auto-submits when it reaches zero.
    pub fn tick(&mut self) -> Tick {
        if self.is_submitted() {
            return Tick::Idle;
        }
        if self.remaining_seconds == 0 {
            self.submit();
            return Tick::TimedOut;
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.submit();
            Tick::TimedOut
        } else {
            Tick::Counting(self.remaining_seconds)
        }
    }

    /// Freeze answers and rewind to the first question for review.
    ///
    /// Returns `true` if this call performed the transition, `false` if the exam was
    /// already submitted.
    pub fn submit(&mut self) -> bool {
        if self.is_submitted() {
            return false;
        }
        self.phase = ExamPhase::Submitted;
        self.current = 0;
        true
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        scoring::count_correct(&self.questions, &self.answers)
    }

    /// Percentage of questions answered correctly, 0–100. Unanswered counts as wrong.
    #[must_use]
    pub fn score(&self) -> u8 {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        scoring::percentage(self.correct_count(), total)
    }

    #[must_use]
    pub fn topic_breakdown(&self) -> Vec<TopicScore> {
        scoring::compute_topic_breakdown(&self.questions, &self.answers)
    }

    #[must_use]
    pub fn review(&self, index: usize) -> Option<QuestionReview> {
        let question = self.questions.get(index)?;
        let selected = self.answer(index);
        Some(QuestionReview {
            selected,
            correct_option: question.as_question().correct_option(),
            is_correct: question.is_correct(selected),
        })
    }

    #[must_use]
    pub fn result(&self) -> ExamResult {
        ExamResult {
            score: self.score(),
            correct: self.correct_count(),
            total: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            topics: self.topic_breakdown(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, ExamQuestionDraft, QuestionDraft};

    fn question(topic: &str, correct: usize) -> ExamQuestion {
        ExamQuestionDraft {
            question: QuestionDraft::new(
                format!("Question about {topic}"),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct,
                "explanation",
            ),
            topic: topic.into(),
            difficulty: Difficulty::Medium,
        }
        .validate()
        .unwrap()
    }

    fn exam(topics: &[(&str, usize)]) -> ExamSession {
        ExamSession::new(topics.iter().map(|(t, c)| question(t, *c)).collect()).unwrap()
    }

    fn answer_all(session: &mut ExamSession, options: &[usize]) {
        for (idx, option) in options.iter().enumerate() {
            session.go_to(idx);
            session.select_answer(*option).unwrap();
        }
    }

    #[test]
    fn new_session_initial_state() {
        let session = exam(&[("A", 0), ("B", 1), ("C", 2)]);
        assert_eq!(session.phase(), ExamPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_seconds(), 360);
        assert!(session.answers().iter().all(Option::is_none));
    }

    #[test]
    fn empty_exam_is_rejected() {
        assert_eq!(ExamSession::new(Vec::new()).unwrap_err(), ExamError::Empty);
    }

    #[test]
    fn perfect_exam_scores_100() {
        let mut session = exam(&[("Cells", 1), ("Energy", 1), ("Cells", 1)]);
        answer_all(&mut session, &[1, 1, 1]);
        assert!(session.submit());

        assert_eq!(session.score(), 100);
        let breakdown = session.topic_breakdown();
        assert_eq!(breakdown.len(), 2);
        assert!(breakdown.iter().all(|t| t.percentage == 100));
    }

    #[test]
    fn all_wrong_or_unanswered_scores_zero() {
        let mut session = exam(&[("A", 0), ("A", 0)]);
        assert_eq!(session.score(), 0);
        answer_all(&mut session, &[1, 2]);
        session.submit();
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn later_selection_overwrites_earlier_one() {
        let mut session = exam(&[("A", 2)]);
        session.select_answer(0).unwrap();
        session.select_answer(2).unwrap();
        assert_eq!(session.answer(0), Some(2));
        assert_eq!(session.score(), 100);
    }

    #[test]
    fn out_of_range_option_fails_without_changing_state() {
        let mut session = exam(&[("A", 0)]);
        session.select_answer(1).unwrap();
        let err = session.select_answer(4).unwrap_err();
        assert_eq!(err, ExamError::OptionOutOfRange { option: 4, len: 4 });
        assert_eq!(session.answer(0), Some(1));
    }

    #[test]
    fn navigation_clamps_at_bounds() {
        let mut session = exam(&[("A", 0), ("B", 0), ("C", 0)]);
        session.previous();
        assert_eq!(session.current_index(), 0);
        session.go_to(99);
        assert_eq!(session.current_index(), 2);
        assert!(session.is_last());
        session.next();
        assert_eq!(session.current_index(), 2);
        session.previous();
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn navigation_does_not_change_score() {
        let mut session = exam(&[("A", 0), ("B", 1), ("C", 2)]);
        answer_all(&mut session, &[0, 0, 2]);
        let before = session.score();
        session.go_to(0);
        session.next();
        session.next();
        session.previous();
        session.go_to(usize::MAX);
        assert_eq!(session.score(), before);
    }

    #[test]
    fn submit_freezes_answers_and_rewinds() {
        let mut session = exam(&[("A", 0), ("B", 0)]);
        session.go_to(1);
        session.select_answer(0).unwrap();
        session.submit();

        assert_eq!(session.current_index(), 0);
        session.select_answer(0).unwrap();
        assert_eq!(session.answer(0), None);
    }

    #[test]
    fn review_navigation_allowed_after_submit() {
        let mut session = exam(&[("A", 0), ("B", 3)]);
        session.go_to(1);
        session.select_answer(1).unwrap();
        session.submit();

        session.next();
        assert_eq!(session.current_index(), 1);
        let review = session.review(1).unwrap();
        assert_eq!(review.selected, Some(1));
        assert_eq!(review.correct_option, 3);
        assert!(!review.is_correct);
        assert!(session.review(2).is_none());
    }

    #[test]
    fn double_submit_is_idempotent() {
        let mut session = exam(&[("A", 0), ("B", 1)]);
        session.select_answer(0).unwrap();
        session.tick();
        assert!(session.submit());

        let score = session.score();
        let remaining = session.remaining_seconds();
        assert!(!session.submit());
        assert_eq!(session.score(), score);
        assert_eq!(session.remaining_seconds(), remaining);
        assert_eq!(session.phase(), ExamPhase::Submitted);
    }

    #[test]
    fn timeout_auto_submits() {
        let mut session = exam(&[("A", 0), ("B", 1)]);
        assert_eq!(session.remaining_seconds(), 240);
        session.select_answer(0).unwrap();

        for _ in 0..239 {
            assert!(matches!(session.tick(), Tick::Counting(_)));
        }
        assert_eq!(session.phase(), ExamPhase::InProgress);
        assert_eq!(session.tick(), Tick::TimedOut);
        assert_eq!(session.phase(), ExamPhase::Submitted);
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.score(), 50);
    }

    #[test]
    fn late_tick_after_submit_changes_nothing() {
        let mut session = exam(&[("A", 0), ("B", 1)]);
        session.select_answer(0).unwrap();
        session.submit();
        let remaining = session.remaining_seconds();
        let score = session.score();

        assert_eq!(session.tick(), Tick::Idle);
        assert_eq!(session.remaining_seconds(), remaining);
        assert_eq!(session.score(), score);
    }

    #[test]
    fn ticks_after_timeout_never_underflow() {
        let mut session = ExamSession::with_seconds_per_question(vec![question("A", 0)], 1).unwrap();
        assert_eq!(session.tick(), Tick::TimedOut);
        for _ in 0..5 {
            assert_eq!(session.tick(), Tick::Idle);
        }
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn zero_allowance_submits_on_first_tick() {
        let mut session = ExamSession::with_seconds_per_question(vec![question("A", 0)], 0).unwrap();
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.tick(), Tick::TimedOut);
        assert!(session.is_submitted());
    }

    #[test]
    fn result_snapshot_matches_accessors() {
        let mut session = exam(&[("A", 0), ("B", 1), ("A", 2)]);
        answer_all(&mut session, &[0, 0, 2]);
        let result = session.result();
        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.score, 67);
        assert_eq!(result.topics, session.topic_breakdown());
    }

    #[test]
    fn progress_tracks_answered_questions() {
        let mut session = exam(&[("A", 0), ("B", 0), ("C", 0), ("D", 0)]);
        session.select_answer(1).unwrap();
        session.go_to(3);
        session.select_answer(0).unwrap();
        assert_eq!(session.answered_count(), 2);
        assert!((session.progress() - 0.5).abs() < f32::EPSILON);
    }
}
