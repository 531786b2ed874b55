use async_trait::async_trait;
use study_core::model::{LessonId, SavedLesson, ValidatedLesson};

use super::SqliteRepository;
use super::mapping::{
    conn, flashcards_to_json, lesson_id_from_i64, lesson_id_to_i64, map_lesson_row,
};
use crate::repository::{LessonRepository, StorageError};

const LESSON_COLUMNS: &str = "id, name, saved_at, document_name, document_mime, document_data, \
                              summary, deep_analysis, flashcards";

#[async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (
                name, saved_at, document_name, document_mime, document_data,
                summary, deep_analysis, flashcards
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(&lesson.name)
        .bind(lesson.saved_at)
        .bind(lesson.document.name())
        .bind(lesson.document.mime_type())
        .bind(lesson.document.data())
        .bind(lesson.summary.as_deref())
        .bind(lesson.deep_analysis.as_deref())
        .bind(flashcards_to_json(lesson.flashcards.as_ref())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        lesson_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_lesson(&self, lesson: &SavedLesson) -> Result<(), StorageError> {
        // Artifacts that are NULL in the incoming row keep the stored value.
        sqlx::query(
            r"
            INSERT INTO lessons (
                id, name, saved_at, document_name, document_mime, document_data,
                summary, deep_analysis, flashcards
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                saved_at = excluded.saved_at,
                document_name = excluded.document_name,
                document_mime = excluded.document_mime,
                document_data = excluded.document_data,
                summary = COALESCE(excluded.summary, lessons.summary),
                deep_analysis = COALESCE(excluded.deep_analysis, lessons.deep_analysis),
                flashcards = COALESCE(excluded.flashcards, lessons.flashcards)
            ",
        )
        .bind(lesson_id_to_i64(lesson.id)?)
        .bind(&lesson.name)
        .bind(lesson.saved_at)
        .bind(lesson.document.name())
        .bind(lesson.document.mime_type())
        .bind(lesson.document.data())
        .bind(lesson.summary.as_deref())
        .bind(lesson.deep_analysis.as_deref())
        .bind(flashcards_to_json(lesson.flashcards.as_ref())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<SavedLesson>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"))
            .bind(lesson_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn list_lessons(&self) -> Result<Vec<SavedLesson>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY saved_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(lesson_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }

    async fn count_lessons(&self) -> Result<u32, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        u32::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}
