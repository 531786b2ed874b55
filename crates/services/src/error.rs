//! Shared error types for the services crate.

use thiserror::Error;

use study_core::model::{
    AppSettingsError, ExamError, FlashcardError, LessonError, LessonId, QuestionError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while turning generator output into questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    #[error("generator output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("generator output is not a list of questions")]
    NotAList,
    #[error("generator output contained no usable questions ({rejected} rejected)")]
    NoValidQuestions { rejected: usize },
}

/// Errors emitted by content generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("content generator is not configured")]
    Disabled,
    #[error("content generator returned an empty response")]
    EmptyResponse,
    #[error("content generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("document {0:?} has too little text to build questions from")]
    InsufficientContent(String),
    #[error("expected {expected} from the generator, got {got}")]
    UnexpectedContent {
        expected: &'static str,
        got: &'static str,
    },
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryServiceError {
    #[error("lesson {0} not found")]
    NotFound(LessonId),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted by `AppSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsServiceError {
    #[error(transparent)]
    Validation(#[from] AppSettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the study workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error("the exam has not been submitted yet")]
    ExamNotSubmitted,
    #[error("the flashcard session is not finished yet")]
    FlashcardsNotFinished,
    #[error("chat message cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    Flashcard(#[from] FlashcardError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] AppSettingsServiceError),
}
