use async_trait::async_trait;
use study_core::model::UserStats;

use super::SqliteRepository;
use super::mapping::{badges_to_json, conn, map_stats_row};
use crate::repository::{StatsRepository, StorageError};

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn load_stats(&self) -> Result<Option<UserStats>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT xp, badges, files_processed, exams_completed, flashcards_completed, deep_analyses_read
            FROM user_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_stats_row).transpose()
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_stats (
                id, xp, badges, files_processed, exams_completed, flashcards_completed, deep_analyses_read
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                xp = excluded.xp,
                badges = excluded.badges,
                files_processed = excluded.files_processed,
                exams_completed = excluded.exams_completed,
                flashcards_completed = excluded.flashcards_completed,
                deep_analyses_read = excluded.deep_analyses_read
            ",
        )
        .bind(1_i64)
        .bind(i64::from(stats.xp()))
        .bind(badges_to_json(stats.badges())?)
        .bind(i64::from(stats.files_processed()))
        .bind(i64::from(stats.exams_completed()))
        .bind(i64::from(stats.flashcards_completed()))
        .bind(i64::from(stats.deep_analyses_read()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
