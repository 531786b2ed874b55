//! Content generation for documents: explanations, flashcards, exams and chat.

use async_trait::async_trait;
use study_core::model::{ChatMessage, ExamQuestion, Question, SourceDocument};

use crate::error::GeneratorError;

mod fallback;
mod http;
mod local;

pub use fallback::FallbackGenerator;
pub use http::{GeneratorConfig, HttpGenerator};
pub use local::LocalGenerator;

/// How many flashcards a generator is asked for.
pub const FLASHCARD_COUNT: usize = 8;
/// How many exam questions a generator is asked for.
pub const EXAM_QUESTION_COUNT: usize = 10;

/// What to produce for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Summary,
    DeepExplanation,
    Flashcards,
    Exam,
    ChatTurn {
        history: Vec<ChatMessage>,
        message: String,
    },
}

impl GenerationRequest {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::DeepExplanation => "deep explanation",
            Self::Flashcards => "flashcards",
            Self::Exam => "exam",
            Self::ChatTurn { .. } => "chat turn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
    Text(String),
    Flashcards(Vec<Question>),
    Exam(Vec<ExamQuestion>),
}

impl GeneratedContent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Flashcards(_) => "flashcards",
            Self::Exam(_) => "exam questions",
        }
    }

    /// # Errors
    ///
    /// Returns `GeneratorError::UnexpectedContent` for non-text content.
    pub fn into_text(self) -> Result<String, GeneratorError> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(GeneratorError::UnexpectedContent {
                expected: "text",
                got: other.kind(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns `GeneratorError::UnexpectedContent` unless this is a flashcard list.
    pub fn into_flashcards(self) -> Result<Vec<Question>, GeneratorError> {
        match self {
            Self::Flashcards(cards) => Ok(cards),
            other => Err(GeneratorError::UnexpectedContent {
                expected: "flashcards",
                got: other.kind(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns `GeneratorError::UnexpectedContent` unless this is an exam.
    pub fn into_exam(self) -> Result<Vec<ExamQuestion>, GeneratorError> {
        match self {
            Self::Exam(questions) => Ok(questions),
            other => Err(GeneratorError::UnexpectedContent {
                expected: "exam questions",
                got: other.kind(),
            }),
        }
    }
}

/// Produces study material for a document.
///
/// Implementations must return the variant matching the request:
/// `Text` for summaries, explanations and chat turns, `Flashcards` and `Exam`
/// for the structured requests.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GeneratorError` when the backend is unavailable or its output is unusable.
    async fn generate(
        &self,
        document: &SourceDocument,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GeneratorError>;
}
