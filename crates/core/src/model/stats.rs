use std::fmt;

use serde::{Deserialize, Serialize};

/// Experience points needed per level.
pub const XP_PER_LEVEL: u32 = 500;

const XP_FILE_PROCESSED: u32 = 50;
const XP_PER_FLASHCARD: u32 = 10;
const XP_PER_EXAM_POINT: u32 = 5;
const LIBRARIAN_THRESHOLD: u32 = 3;

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Pioneer,
    DeepThinker,
    FlashMaster,
    Scholar,
    PerfectScore,
    Librarian,
}

impl Badge {
    pub const ALL: [Badge; 6] = [
        Badge::Pioneer,
        Badge::DeepThinker,
        Badge::FlashMaster,
        Badge::Scholar,
        Badge::PerfectScore,
        Badge::Librarian,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Badge::Pioneer => "Pioneer",
            Badge::DeepThinker => "Deep Thinker",
            Badge::FlashMaster => "Flash Master",
            Badge::Scholar => "Scholar",
            Badge::PerfectScore => "Perfect Score",
            Badge::Librarian => "Librarian",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Badge::Pioneer => "Upload your first document",
            Badge::DeepThinker => "Read a deep analysis",
            Badge::FlashMaster => "Finish a flashcard session",
            Badge::Scholar => "Finish a practice exam",
            Badge::PerfectScore => "Score 100% on a practice exam",
            Badge::Librarian => "Keep 3 lessons in the offline library",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Something the learner did that may earn XP or a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyEvent {
    FileProcessed,
    DeepAnalysisRead,
    FlashcardsCompleted { correct_cards: u32 },
    ExamCompleted { score: u8 },
    LessonSaved { library_size: u32 },
}

/// What a recorded event earned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XpAward {
    pub xp_gained: u32,
    pub new_badges: Vec<Badge>,
    pub leveled_up: bool,
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    xp: u32,
    level: u32,
    badges: Vec<Badge>,
    files_processed: u32,
    exams_completed: u32,
    flashcards_completed: u32,
    #[serde(default)]
    deep_analyses_read: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            badges: Vec::new(),
            files_processed: 0,
            exams_completed: 0,
            flashcards_completed: 0,
            deep_analyses_read: 0,
        }
    }
}

impl UserStats {
    /// Rehydrate stats from storage. The level is recomputed from `xp`
    /// and duplicate badges are dropped.
    #[must_use]
    pub fn from_persisted(
        xp: u32,
        badges: Vec<Badge>,
        files_processed: u32,
        exams_completed: u32,
        flashcards_completed: u32,
        deep_analyses_read: u32,
    ) -> Self {
        let mut unique = Vec::with_capacity(badges.len());
        for badge in badges {
            if !unique.contains(&badge) {
                unique.push(badge);
            }
        }
        Self {
            xp,
            level: level_for(xp),
            badges: unique,
            files_processed,
            exams_completed,
            flashcards_completed,
            deep_analyses_read,
        }
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// XP earned inside the current level.
    #[must_use]
    pub fn xp_into_level(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }

    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    #[must_use]
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    #[must_use]
    pub fn files_processed(&self) -> u32 {
        self.files_processed
    }

    #[must_use]
    pub fn exams_completed(&self) -> u32 {
        self.exams_completed
    }

    #[must_use]
    pub fn flashcards_completed(&self) -> u32 {
        self.flashcards_completed
    }

    #[must_use]
    pub fn deep_analyses_read(&self) -> u32 {
        self.deep_analyses_read
    }

    /// Apply an event: bump counters, add XP, unlock badges.
    pub fn record(&mut self, event: StudyEvent) -> XpAward {
        let mut unlocked = Vec::new();

        let xp_gained = match event {
            StudyEvent::FileProcessed => {
                self.files_processed = self.files_processed.saturating_add(1);
                unlocked.push(Badge::Pioneer);
                XP_FILE_PROCESSED
            }
            StudyEvent::DeepAnalysisRead => {
                self.deep_analyses_read = self.deep_analyses_read.saturating_add(1);
                unlocked.push(Badge::DeepThinker);
                0
            }
            StudyEvent::FlashcardsCompleted { correct_cards } => {
                self.flashcards_completed = self.flashcards_completed.saturating_add(1);
                unlocked.push(Badge::FlashMaster);
                correct_cards.saturating_mul(XP_PER_FLASHCARD)
            }
            StudyEvent::ExamCompleted { score } => {
                self.exams_completed = self.exams_completed.saturating_add(1);
                unlocked.push(Badge::Scholar);
                if score >= 100 {
                    unlocked.push(Badge::PerfectScore);
                }
                u32::from(score).saturating_mul(XP_PER_EXAM_POINT)
            }
            StudyEvent::LessonSaved { library_size } => {
                if library_size >= LIBRARIAN_THRESHOLD {
                    unlocked.push(Badge::Librarian);
                }
                0
            }
        };

        let previous_level = self.level;
        self.xp = self.xp.saturating_add(xp_gained);
        self.level = level_for(self.xp);

        let mut new_badges = Vec::new();
        for badge in unlocked {
            if !self.badges.contains(&badge) {
                self.badges.push(badge);
                new_badges.push(badge);
            }
        }

        XpAward {
            xp_gained,
            new_badges,
            leveled_up: self.level > previous_level,
        }
    }
}

fn level_for(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_level_one() {
        let stats = UserStats::default();
        assert_eq!(stats.xp(), 0);
        assert_eq!(stats.level(), 1);
        assert!(stats.badges().is_empty());
    }

    #[test]
    fn file_processed_awards_fifty_and_pioneer_once() {
        let mut stats = UserStats::default();
        let first = stats.record(StudyEvent::FileProcessed);
        assert_eq!(first.xp_gained, 50);
        assert_eq!(first.new_badges, vec![Badge::Pioneer]);

        let second = stats.record(StudyEvent::FileProcessed);
        assert!(second.new_badges.is_empty());
        assert_eq!(stats.files_processed(), 2);
        assert_eq!(stats.xp(), 100);
    }

    #[test]
    fn flashcards_award_ten_per_correct_card() {
        let mut stats = UserStats::default();
        let award = stats.record(StudyEvent::FlashcardsCompleted { correct_cards: 6 });
        assert_eq!(award.xp_gained, 60);
        assert_eq!(award.new_badges, vec![Badge::FlashMaster]);
        assert_eq!(stats.flashcards_completed(), 1);
    }

    #[test]
    fn perfect_exam_unlocks_two_badges_and_levels_up() {
        let mut stats = UserStats::default();
        let award = stats.record(StudyEvent::ExamCompleted { score: 100 });
        assert_eq!(award.xp_gained, 500);
        assert_eq!(award.new_badges, vec![Badge::Scholar, Badge::PerfectScore]);
        assert!(award.leveled_up);
        assert_eq!(stats.level(), 2);
        assert_eq!(stats.xp_into_level(), 0);
    }

    #[test]
    fn imperfect_exam_only_unlocks_scholar() {
        let mut stats = UserStats::default();
        let award = stats.record(StudyEvent::ExamCompleted { score: 90 });
        assert_eq!(award.xp_gained, 450);
        assert_eq!(award.new_badges, vec![Badge::Scholar]);
        assert!(!award.leveled_up);
    }

    #[test]
    fn librarian_needs_three_lessons() {
        let mut stats = UserStats::default();
        assert!(stats.record(StudyEvent::LessonSaved { library_size: 2 }).new_badges.is_empty());
        let award = stats.record(StudyEvent::LessonSaved { library_size: 3 });
        assert_eq!(award.new_badges, vec![Badge::Librarian]);
        assert_eq!(award.xp_gained, 0);
    }

    #[test]
    fn deep_analysis_unlocks_deep_thinker() {
        let mut stats = UserStats::default();
        let award = stats.record(StudyEvent::DeepAnalysisRead);
        assert_eq!(award.new_badges, vec![Badge::DeepThinker]);
        assert_eq!(stats.deep_analyses_read(), 1);
    }

    #[test]
    fn from_persisted_recomputes_level_and_dedups_badges() {
        let stats = UserStats::from_persisted(
            1_250,
            vec![Badge::Pioneer, Badge::Scholar, Badge::Pioneer],
            3,
            1,
            2,
            0,
        );
        assert_eq!(stats.level(), 3);
        assert_eq!(stats.badges(), [Badge::Pioneer, Badge::Scholar]);
    }
}
