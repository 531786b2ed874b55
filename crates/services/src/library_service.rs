use std::sync::Arc;

use study_core::Clock;
use study_core::model::{LessonDraft, LessonId, SavedLesson, StudyEvent, XpAward};
use storage::repository::LessonRepository;
use tracing::info;

use crate::error::LibraryServiceError;
use crate::progress_service::ProgressService;

/// Offline lesson library: documents plus the material generated for them.
#[derive(Clone)]
pub struct LibraryService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<ProgressService>,
}

impl LibraryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            lessons,
            progress,
        }
    }

    /// Validate and store a new lesson, then record it for the Librarian badge.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::Lesson` for validation failures.
    /// Returns `LibraryServiceError::Storage` if persistence fails.
    pub async fn save(
        &self,
        draft: LessonDraft,
    ) -> Result<(LessonId, XpAward), LibraryServiceError> {
        let lesson = draft.validate(self.clock.now())?;
        let id = self.lessons.insert_lesson(&lesson).await?;
        let library_size = self.lessons.count_lessons().await?;
        info!(lesson_id = %id, name = %lesson.name, library_size, "lesson saved");

        let award = self
            .progress
            .record(StudyEvent::LessonSaved { library_size })
            .await?;
        Ok((id, award))
    }

    /// Merge new artifacts into an existing lesson. Artifacts left empty in
    /// `draft` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::NotFound` if the lesson does not exist.
    pub async fn update(
        &self,
        id: LessonId,
        draft: LessonDraft,
    ) -> Result<SavedLesson, LibraryServiceError> {
        let mut stored = self
            .lessons
            .get_lesson(id)
            .await?
            .ok_or(LibraryServiceError::NotFound(id))?;
        let update = draft.validate(self.clock.now())?.assign_id(id);
        self.lessons.upsert_lesson(&update).await?;
        stored.merge(update);
        Ok(stored)
    }

    /// All lessons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<SavedLesson>, LibraryServiceError> {
        Ok(self.lessons.list_lessons().await?)
    }

    /// # Errors
    ///
    /// Returns `LibraryServiceError::NotFound` if the lesson does not exist.
    pub async fn get(&self, id: LessonId) -> Result<SavedLesson, LibraryServiceError> {
        self.lessons
            .get_lesson(id)
            .await?
            .ok_or(LibraryServiceError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `LibraryServiceError::NotFound` if the lesson does not exist.
    pub async fn delete(&self, id: LessonId) -> Result<(), LibraryServiceError> {
        if self.lessons.delete_lesson(id).await? {
            info!(lesson_id = %id, "lesson deleted");
            Ok(())
        } else {
            Err(LibraryServiceError::NotFound(id))
        }
    }
}
