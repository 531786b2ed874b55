use std::sync::Arc;

use study_core::Clock;
use study_core::model::{
    ChatMessage, ExamResult, ExamSession, FlashcardSession, SourceDocument, StudyEvent, XpAward,
};
use tracing::info;

use crate::error::StudyError;
use crate::generator::{ContentGenerator, GenerationRequest};
use crate::progress_service::ProgressService;

/// A generated explanation and what reading it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    pub award: Option<XpAward>,
}

/// Result of finishing an exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamOutcome {
    pub result: ExamResult,
    pub award: XpAward,
}

/// Turns documents into study sessions and records progress as they finish.
#[derive(Clone)]
pub struct StudyService {
    clock: Clock,
    generator: Arc<dyn ContentGenerator>,
    progress: Arc<ProgressService>,
}

impl StudyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generator: Arc<dyn ContentGenerator>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            generator,
            progress,
        }
    }

    /// Record that a document was loaded for study.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Progress` if stats cannot be persisted.
    pub async fn open_document(&self, document: &SourceDocument) -> Result<XpAward, StudyError> {
        info!(document = document.name(), kind = ?document.kind(), "document opened");
        Ok(self.progress.record(StudyEvent::FileProcessed).await?)
    }

    /// Summary (`deep == false`) or in-depth explanation of a document.
    /// Reading a deep explanation is recorded.
    ///
    /// # Errors
    ///
    /// Returns `StudyError` if generation or progress persistence fails.
    pub async fn explain(
        &self,
        document: &SourceDocument,
        deep: bool,
    ) -> Result<Explanation, StudyError> {
        let request = if deep {
            GenerationRequest::DeepExplanation
        } else {
            GenerationRequest::Summary
        };
        let text = self
            .generator
            .generate(document, &request)
            .await?
            .into_text()?;
        let award = if deep {
            Some(self.progress.record(StudyEvent::DeepAnalysisRead).await?)
        } else {
            None
        };
        Ok(Explanation { text, award })
    }

    /// # Errors
    ///
    /// Returns `StudyError` if generation fails or yields no cards.
    pub async fn start_flashcards(
        &self,
        document: &SourceDocument,
    ) -> Result<FlashcardSession, StudyError> {
        let cards = self
            .generator
            .generate(document, &GenerationRequest::Flashcards)
            .await?
            .into_flashcards()?;
        info!(document = document.name(), cards = cards.len(), "flashcard session started");
        Ok(FlashcardSession::new(cards)?)
    }

    /// # Errors
    ///
    /// Returns `StudyError` if generation fails or yields no questions.
    pub async fn start_exam(&self, document: &SourceDocument) -> Result<ExamSession, StudyError> {
        let questions = self
            .generator
            .generate(document, &GenerationRequest::Exam)
            .await?
            .into_exam()?;
        let session = ExamSession::new(questions)?;
        info!(
            document = document.name(),
            questions = session.len(),
            seconds = session.remaining_seconds(),
            "exam started"
        );
        Ok(session)
    }

    /// Record a finished flashcard session.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::FlashcardsNotFinished` if cards are left.
    pub async fn finish_flashcards(
        &self,
        session: &FlashcardSession,
    ) -> Result<XpAward, StudyError> {
        if !session.is_complete() {
            return Err(StudyError::FlashcardsNotFinished);
        }
        info!(
            score = session.final_score(),
            correct = session.correct_count(),
            cards = session.len(),
            "flashcard session finished"
        );
        Ok(self
            .progress
            .record(StudyEvent::FlashcardsCompleted {
                correct_cards: session.correct_count(),
            })
            .await?)
    }

    /// Record a submitted exam.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ExamNotSubmitted` if the exam is still running.
    pub async fn finish_exam(&self, session: &ExamSession) -> Result<ExamOutcome, StudyError> {
        if !session.is_submitted() {
            return Err(StudyError::ExamNotSubmitted);
        }
        let result = session.result();
        info!(
            score = result.score,
            correct = result.correct,
            total = result.total,
            "exam finished"
        );
        let award = self
            .progress
            .record(StudyEvent::ExamCompleted {
                score: result.score,
            })
            .await?;
        Ok(ExamOutcome { result, award })
    }

    /// Ask the tutor about a document. Both turns are appended to `history`.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::EmptyMessage` for blank messages, or the generator failure.
    pub async fn chat(
        &self,
        document: &SourceDocument,
        history: &mut Vec<ChatMessage>,
        message: &str,
    ) -> Result<ChatMessage, StudyError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(StudyError::EmptyMessage);
        }
        let request = GenerationRequest::ChatTurn {
            history: history.clone(),
            message: message.to_string(),
        };
        let asked_at = self.clock.now();
        let reply = self
            .generator
            .generate(document, &request)
            .await?
            .into_text()?;

        let reply = ChatMessage::tutor(reply, self.clock.now());
        history.push(ChatMessage::user(message, asked_at));
        history.push(reply.clone());
        Ok(reply)
    }
}
