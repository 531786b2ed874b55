use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("correct option {index} is out of range for {len} options")]
    CorrectOptionOutOfRange { index: usize, len: usize },

    #[error("exam question topic cannot be empty")]
    EmptyTopic,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Declared difficulty of an exam question. Only used for post-exam analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestionError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated multiple-choice question, as produced by a generator or a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_option,
            explanation: explanation.into(),
        }
    }

    /// Validate into an immutable `Question`.
    ///
    /// Prompt, options and explanation are trimmed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are given,
    /// any option is blank, or `correct_option` does not index into `options`.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions(self.options.len()));
        }

        let mut options = Vec::with_capacity(self.options.len());
        for (idx, option) in self.options.into_iter().enumerate() {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption(idx));
            }
            options.push(option);
        }

        if self.correct_option >= options.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index: self.correct_option,
                len: options.len(),
            });
        }

        Ok(Question {
            prompt,
            options,
            correct_option: self.correct_option,
            explanation: self.explanation.trim().to_string(),
        })
    }
}

/// A validated multiple-choice question. Flashcards are plain questions.
///
/// `correct_option` always indexes into `options`; there is no way to mutate a
/// question after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: String,
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        Self {
            prompt: q.prompt,
            options: q.options,
            correct_option: q.correct_option,
            explanation: q.explanation,
        }
    }
}

//
// ─── EXAM QUESTION ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestionDraft {
    #[serde(flatten)]
    pub question: QuestionDraft,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl ExamQuestionDraft {
    /// Validate into an `ExamQuestion`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the question is invalid or the topic is blank.
    pub fn validate(self) -> Result<ExamQuestion, QuestionError> {
        let topic = self.topic.trim().to_string();
        if topic.is_empty() {
            return Err(QuestionError::EmptyTopic);
        }
        let question = self.question.validate()?;
        Ok(ExamQuestion {
            question,
            topic,
            difficulty: self.difficulty,
        })
    }
}

/// A question that belongs to an exam: carries a topic label and difficulty for analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExamQuestionDraft", into = "ExamQuestionDraft")]
pub struct ExamQuestion {
    question: Question,
    topic: String,
    difficulty: Difficulty,
}

impl ExamQuestion {
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

impl TryFrom<ExamQuestionDraft> for ExamQuestion {
    type Error = QuestionError;

    fn try_from(draft: ExamQuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<ExamQuestion> for ExamQuestionDraft {
    fn from(q: ExamQuestion) -> Self {
        Self {
            question: q.question.into(),
            topic: q.topic,
            difficulty: q.difficulty,
        }
    }
}

//
// ─── SHARED BEHAVIOUR ──────────────────────────────────────────────────────────
//

/// Common view over flashcards and exam questions so scoring is written once.
pub trait MultipleChoice {
    fn as_question(&self) -> &Question;

    /// True when `answer` selects the correct option. Unanswered is never correct.
    fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.as_question().correct_option())
    }

    /// True when `option` is a selectable index for this question.
    fn accepts(&self, option: usize) -> bool {
        option < self.as_question().option_count()
    }
}

impl MultipleChoice for Question {
    fn as_question(&self) -> &Question {
        self
    }
}

impl MultipleChoice for ExamQuestion {
    fn as_question(&self) -> &Question {
        &self.question
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
