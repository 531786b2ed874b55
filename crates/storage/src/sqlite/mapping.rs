use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::model::{Badge, LessonId, Question, SavedLesson, SourceDocument, UserStats};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    u64::try_from(v)
        .map(LessonId::new)
        .map_err(|_| StorageError::Serialization("lesson_id sign overflow".into()))
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("lesson_id overflow".into()))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

pub(crate) fn flashcards_to_json(
    cards: Option<&Vec<Question>>,
) -> Result<Option<String>, StorageError> {
    cards.map(|c| serde_json::to_string(c).map_err(ser)).transpose()
}

pub(crate) fn badges_to_json(badges: &[Badge]) -> Result<String, StorageError> {
    serde_json::to_string(badges).map_err(ser)
}

pub(crate) fn map_lesson_row(row: &sqlx::sqlite::SqliteRow) -> Result<SavedLesson, StorageError> {
    let id = lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;

    let document = SourceDocument::new(
        row.try_get::<String, _>("document_name").map_err(ser)?,
        row.try_get::<String, _>("document_mime").map_err(ser)?,
        row.try_get::<Vec<u8>, _>("document_data").map_err(ser)?,
    )
    .map_err(ser)?;

    let flashcards = row
        .try_get::<Option<String>, _>("flashcards")
        .map_err(ser)?
        .map(|raw| serde_json::from_str::<Vec<Question>>(&raw).map_err(ser))
        .transpose()?;

    Ok(SavedLesson {
        id,
        name: row.try_get("name").map_err(ser)?,
        saved_at,
        document,
        summary: row.try_get("summary").map_err(ser)?,
        deep_analysis: row.try_get("deep_analysis").map_err(ser)?,
        flashcards,
    })
}

pub(crate) fn map_stats_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserStats, StorageError> {
    let badges_raw: String = row.try_get("badges").map_err(ser)?;
    let badges: Vec<Badge> = serde_json::from_str(&badges_raw).map_err(ser)?;

    Ok(UserStats::from_persisted(
        u32_from_i64("xp", row.try_get("xp").map_err(ser)?)?,
        badges,
        u32_from_i64("files_processed", row.try_get("files_processed").map_err(ser)?)?,
        u32_from_i64("exams_completed", row.try_get("exams_completed").map_err(ser)?)?,
        u32_from_i64(
            "flashcards_completed",
            row.try_get("flashcards_completed").map_err(ser)?,
        )?,
        u32_from_i64(
            "deep_analyses_read",
            row.try_get("deep_analyses_read").map_err(ser)?,
        )?,
    ))
}
