mod app_settings;
mod chat;
mod exam;
mod flashcard;
mod ids;
mod lesson;
mod question;
pub mod scoring;
mod stats;

pub use app_settings::{AppSettings, AppSettingsDraft, AppSettingsError};
pub use chat::{ChatMessage, ChatRole};
pub use exam::{
    DEFAULT_SECONDS_PER_QUESTION, ExamError, ExamPhase, ExamResult, ExamSession, QuestionReview,
    Tick,
};
pub use flashcard::{Advance, Answer, CardState, FlashcardError, FlashcardSession};
pub use ids::{LessonId, ParseIdError};
pub use lesson::{DocumentKind, LessonDraft, LessonError, SavedLesson, SourceDocument, ValidatedLesson};
pub use question::{
    Difficulty, ExamQuestion, ExamQuestionDraft, MultipleChoice, Question, QuestionDraft,
    QuestionError,
};
pub use scoring::TopicScore;
pub use stats::{Badge, StudyEvent, UserStats, XP_PER_LEVEL, XpAward};
