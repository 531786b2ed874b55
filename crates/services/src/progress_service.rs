use std::sync::Arc;

use study_core::model::{StudyEvent, UserStats, XpAward};
use storage::repository::StatsRepository;
use tracing::info;

use crate::error::ProgressServiceError;

/// Loads, updates and persists the learner's XP, level and badges.
#[derive(Clone)]
pub struct ProgressService {
    stats: Arc<dyn StatsRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(stats: Arc<dyn StatsRepository>) -> Self {
        Self { stats }
    }

    /// Current stats, or fresh level-1 stats if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` on storage failures.
    pub async fn stats(&self) -> Result<UserStats, ProgressServiceError> {
        Ok(self.stats.load_stats().await?.unwrap_or_default())
    }

    /// Apply an event and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` on storage failures.
    pub async fn record(&self, event: StudyEvent) -> Result<XpAward, ProgressServiceError> {
        let mut stats = self.stats().await?;
        let award = stats.record(event);
        self.stats.save_stats(&stats).await?;

        if award.xp_gained > 0 || !award.new_badges.is_empty() {
            info!(
                ?event,
                xp_gained = award.xp_gained,
                total_xp = stats.xp(),
                level = stats.level(),
                badges = ?award.new_badges,
                "progress recorded"
            );
        }
        if award.leveled_up {
            info!(level = stats.level(), "level up");
        }
        Ok(award)
    }
}
