//! Validation of generator output.
//!
//! Generators return loosely structured JSON. Every entry is checked on its own:
//! one malformed question is dropped and reported, the rest are kept.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use study_core::model::{
    Difficulty, ExamQuestion, ExamQuestionDraft, Question, QuestionDraft, QuestionError,
};

use crate::error::IngestError;

pub const DEFAULT_TOPIC: &str = "General";

/// One entry that did not survive validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

/// Questions that passed validation plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

impl RawQuestion {
    fn into_draft(self) -> (QuestionDraft, Option<String>, Option<String>) {
        let draft = QuestionDraft::new(
            self.question,
            self.options,
            self.correct_index,
            self.explanation.unwrap_or_default(),
        );
        (draft, self.topic, self.difficulty)
    }
}

/// Parse a flashcard list.
///
/// # Errors
///
/// Returns `IngestError` if the payload is not a JSON list or no entry is usable.
pub fn parse_flashcards(raw: &str) -> Result<IngestReport<Question>, IngestError> {
    parse_entries(raw, |entry| {
        let (draft, _, _) = entry.into_draft();
        draft.validate()
    })
}

/// Parse an exam question list. Missing topics become [`DEFAULT_TOPIC`] and
/// unknown difficulties become `Medium`.
///
/// # Errors
///
/// Returns `IngestError` if the payload is not a JSON list or no entry is usable.
pub fn parse_exam(raw: &str) -> Result<IngestReport<ExamQuestion>, IngestError> {
    parse_entries(raw, |entry| {
        let (question, topic, difficulty) = entry.into_draft();
        let topic = topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let difficulty = difficulty
            .and_then(|d| d.parse::<Difficulty>().ok())
            .unwrap_or_default();
        ExamQuestionDraft {
            question,
            topic,
            difficulty,
        }
        .validate()
    })
}

fn parse_entries<T>(
    raw: &str,
    validate: impl Fn(RawQuestion) -> Result<T, QuestionError>,
) -> Result<IngestReport<T>, IngestError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let entries = into_entries(value)?;

    let mut report = IngestReport {
        accepted: Vec::with_capacity(entries.len()),
        rejected: Vec::new(),
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let outcome = serde_json::from_value::<RawQuestion>(entry)
            .map_err(|err| err.to_string())
            .and_then(|raw| validate(raw).map_err(|err| err.to_string()));
        match outcome {
            Ok(question) => report.accepted.push(question),
            Err(reason) => {
                warn!(index, %reason, "dropping generated question");
                report.rejected.push(RejectedEntry { index, reason });
            }
        }
    }

    if report.accepted.is_empty() {
        return Err(IngestError::NoValidQuestions {
            rejected: report.rejected.len(),
        });
    }
    Ok(report)
}

/// Accepts a bare list or an object wrapping exactly one list
/// (`{"questions": [...]}`), which JSON-mode models like to produce.
fn into_entries(value: Value) -> Result<Vec<Value>, IngestError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) => {
            let mut lists = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (lists.next(), lists.next()) {
                (Some(items), None) => Ok(items),
                _ => Err(IngestError::NotAList),
            }
        }
        _ => Err(IngestError::NotAList),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_flashcards() {
        let raw = r#"[
            {"question": "Capital of France?", "options": ["Paris", "Rome"], "correctIndex": 0, "explanation": "Paris."},
            {"question": "2 + 2?", "options": ["3", "4"], "correctIndex": 1}
        ]"#;
        let report = parse_flashcards(raw).unwrap();
        assert_eq!(report.accepted.len(), 2);
        assert!(report.rejected.is_empty());
        assert_eq!(report.accepted[1].explanation(), "");
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "```json\n[{\"question\": \"Q\", \"options\": [\"a\", \"b\"], \"correctIndex\": 1}]\n```";
        let report = parse_flashcards(raw).unwrap();
        assert_eq!(report.accepted[0].correct_option(), 1);
    }

    #[test]
    fn rejects_bad_entries_individually() {
        let raw = r#"[
            {"question": "ok", "options": ["a", "b"], "correctIndex": 0},
            {"question": "out of range", "options": ["a", "b"], "correctIndex": 5},
            {"question": "one option", "options": ["a"], "correctIndex": 0},
            {"options": ["a", "b"], "correctIndex": 0},
            {"question": "negative", "options": ["a", "b"], "correctIndex": -1}
        ]"#;
        let report = parse_flashcards(raw).unwrap();
        assert_eq!(report.accepted.len(), 1);
        let rejected: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, [1, 2, 3, 4]);
    }

    #[test]
    fn exam_defaults_topic_and_difficulty() {
        let raw = r#"{"questions": [
            {"id": 1, "question": "Q1", "options": ["a", "b"], "correctIndex": 0, "topic": "Cells", "difficulty": "hard"},
            {"id": 2, "question": "Q2", "options": ["a", "b"], "correctIndex": 1, "difficulty": "impossible"},
            {"id": 3, "question": "Q3", "options": ["a", "b"], "correctIndex": 1, "topic": "  "}
        ]}"#;
        let report = parse_exam(raw).unwrap();
        let exam = report.accepted;
        assert_eq!(exam[0].topic(), "Cells");
        assert_eq!(exam[0].difficulty(), Difficulty::Hard);
        assert_eq!(exam[1].topic(), DEFAULT_TOPIC);
        assert_eq!(exam[1].difficulty(), Difficulty::Medium);
        assert_eq!(exam[2].topic(), DEFAULT_TOPIC);
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let raw = r#"[{"question": "", "options": ["a", "b"], "correctIndex": 0}]"#;
        assert!(matches!(
            parse_flashcards(raw),
            Err(IngestError::NoValidQuestions { rejected: 1 })
        ));
        assert!(matches!(parse_flashcards("[]"), Err(IngestError::NoValidQuestions { rejected: 0 })));
    }

    #[test]
    fn non_list_payloads_are_rejected() {
        assert!(matches!(parse_exam("not json"), Err(IngestError::Json(_))));
        assert!(matches!(parse_exam(r#"{"text": "hi"}"#), Err(IngestError::NotAList)));
        assert!(matches!(parse_exam("42"), Err(IngestError::NotAList)));
    }
}
