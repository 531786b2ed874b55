use thiserror::Error;

use crate::model::{
    AppSettingsError, ExamError, FlashcardError, LessonError, QuestionError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    Flashcard(#[from] FlashcardError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Settings(#[from] AppSettingsError),
}
