//! Pure scoring helpers shared by exam and flashcard sessions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::question::{ExamQuestion, MultipleChoice};

/// Correctness aggregate for one topic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
}

/// `round(100 * correct / total)` with halves rounded up. Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Number of questions whose answer slot selects the correct option.
///
/// Missing slots (a shorter `answers`) count as unanswered.
#[must_use]
pub fn count_correct<Q: MultipleChoice>(questions: &[Q], answers: &[Option<usize>]) -> u32 {
    let count = questions
        .iter()
        .enumerate()
        .filter(|(idx, q)| q.is_correct(answers.get(*idx).copied().flatten()))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Groups questions by topic in first-occurrence order.
#[must_use]
pub fn compute_topic_breakdown(
    questions: &[ExamQuestion],
    answers: &[Option<usize>],
) -> Vec<TopicScore> {
    let mut order: Vec<TopicScore> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (idx, question) in questions.iter().enumerate() {
        let slot = *index.entry(question.topic()).or_insert_with(|| {
            order.push(TopicScore {
                topic: question.topic().to_string(),
                correct: 0,
                total: 0,
                percentage: 0,
            });
            order.len() - 1
        });
        let entry = &mut order[slot];
        entry.total = entry.total.saturating_add(1);
        if question.is_correct(answers.get(idx).copied().flatten()) {
            entry.correct = entry.correct.saturating_add(1);
        }
    }

    for entry in &mut order {
        entry.percentage = percentage(entry.correct, entry.total);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, ExamQuestionDraft, QuestionDraft};

    fn exam_q(topic: &str, correct: usize) -> ExamQuestion {
        ExamQuestionDraft {
            question: QuestionDraft::new(
                format!("{topic}?"),
                vec!["a".into(), "b".into(), "c".into()],
                correct,
                "",
            ),
            topic: topic.into(),
            difficulty: Difficulty::Medium,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 8), 38);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn percentage_of_nothing_is_zero() {
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn breakdown_keeps_first_occurrence_order() {
        let questions = vec![
            exam_q("Cells", 0),
            exam_q("Energy", 1),
            exam_q("Cells", 2),
            exam_q("Genetics", 0),
        ];
        let answers = vec![Some(0), Some(0), None, Some(0)];

        let breakdown = compute_topic_breakdown(&questions, &answers);
        let topics: Vec<&str> = breakdown.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, ["Cells", "Energy", "Genetics"]);

        assert_eq!(breakdown[0].correct, 1);
        assert_eq!(breakdown[0].total, 2);
        assert_eq!(breakdown[0].percentage, 50);
        assert_eq!(breakdown[1].percentage, 0);
        assert_eq!(breakdown[2].percentage, 100);
    }

    #[test]
    fn breakdown_totals_match_overall_count() {
        let questions = vec![exam_q("A", 0), exam_q("B", 1), exam_q("A", 1), exam_q("C", 2)];
        let answers = vec![Some(0), Some(1), Some(0), None];

        let breakdown = compute_topic_breakdown(&questions, &answers);
        let correct: u32 = breakdown.iter().map(|t| t.correct).sum();
        let total: u32 = breakdown.iter().map(|t| t.total).sum();

        assert_eq!(correct, count_correct(&questions, &answers));
        assert_eq!(total, 4);
    }

    #[test]
    fn short_answer_slice_counts_as_unanswered() {
        let questions = vec![exam_q("A", 0), exam_q("A", 0)];
        assert_eq!(count_correct(&questions, &[Some(0)]), 1);
    }
}
