use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_core::model::{AppSettings, LessonId, SavedLesson, UserStats, ValidatedLesson};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the offline lesson library.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Store a new lesson and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError>;

    /// Persist a lesson by id. If it already exists the two are merged:
    /// artifacts missing from `lesson` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &SavedLesson) -> Result<(), StorageError>;

    /// Fetch a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing lesson is `Ok(None)`.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<SavedLesson>, StorageError>;

    /// All lessons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_lessons(&self) -> Result<Vec<SavedLesson>, StorageError>;

    /// Remove a lesson. Returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_lessons(&self) -> Result<u32, StorageError>;
}

/// Single-row store for the learner's progress.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; nothing stored yet is `Ok(None)`.
    async fn load_stats(&self) -> Result<Option<UserStats>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the stats cannot be stored.
    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AppSettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; nothing stored yet is `Ok(None)`.
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<LessonTable>>,
    stats: Arc<Mutex<Option<UserStats>>>,
    settings: Arc<Mutex<Option<AppSettings>>>,
}

#[derive(Default)]
struct LessonTable {
    next_id: u64,
    rows: HashMap<LessonId, SavedLesson>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        guard.next_id += 1;
        let id = LessonId::new(guard.next_id);
        guard.rows.insert(id, lesson.clone().assign_id(id));
        Ok(id)
    }

    async fn upsert_lesson(&self, lesson: &SavedLesson) -> Result<(), StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        guard.next_id = guard.next_id.max(lesson.id.value());
        match guard.rows.get_mut(&lesson.id) {
            Some(existing) => existing.merge(lesson.clone()),
            None => {
                guard.rows.insert(lesson.id, lesson.clone());
            }
        }
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<SavedLesson>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn list_lessons(&self) -> Result<Vec<SavedLesson>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        let mut lessons: Vec<SavedLesson> = guard.rows.values().cloned().collect();
        lessons.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| b.id.cmp(&a.id)));
        Ok(lessons)
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.rows.remove(&id).is_some())
    }

    async fn count_lessons(&self) -> Result<u32, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        u32::try_from(guard.rows.len()).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}

#[async_trait]
impl StatsRepository for InMemoryRepository {
    async fn load_stats(&self) -> Result<Option<UserStats>, StorageError> {
        let guard = self.stats.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        let mut guard = self.stats.lock().map_err(poisoned)?;
        *guard = Some(stats.clone());
        Ok(())
    }
}

#[async_trait]
impl AppSettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        let guard = self.settings.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        let mut guard = self.settings.lock().map_err(poisoned)?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub app_settings: Arc<dyn AppSettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            lessons: Arc::new(repo.clone()),
            stats: Arc::new(repo.clone()),
            app_settings: Arc::new(repo),
        }
    }
}
