use thiserror::Error;

use super::question::{MultipleChoice, Question};
use super::scoring;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Gating violations. None of them change session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardError {
    #[error("a flashcard session needs at least one card")]
    Empty,

    #[error("option {option} is out of range for a card with {len} options")]
    OptionOutOfRange { option: usize, len: usize },

    #[error("an option is already selected; retry first")]
    SelectionLocked,

    #[error("select an option before revealing the card")]
    NoSelection,

    #[error("reveal the card before moving on")]
    NotRevealed,

    #[error("only a wrong answer can be retried")]
    NothingToRetry,

    #[error("session already completed")]
    Completed,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Outcome of selecting an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// `credited` is false when the card was already failed once.
    Correct { credited: bool },
    Wrong { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the card at this index.
    Next(usize),
    Completed,
}

/// Observable state of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Unanswered,
    AnsweredWrong { attempts: u32 },
    /// A wrong answer was cleared with `retry()`; the failure is remembered.
    Retrying { attempts: u32 },
    AnsweredCorrect { credited: bool },
    Revealed { correct: bool },
}

#[derive(Debug, Clone, Copy, Default)]
struct CardProgress {
    selected: Option<usize>,
    wrong_attempts: u32,
    failed_once: bool,
    credited: bool,
    revealed: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Self-paced multiple-choice drill with immediate feedback and retries.
///
/// Credit is granted only when a card is answered correctly before any wrong
/// attempt on it. A card first answered wrong and later fixed on retry earns nothing.
#[derive(Debug, Clone)]
pub struct FlashcardSession {
    cards: Vec<Question>,
    current: usize,
    progress: Vec<CardProgress>,
    completed: bool,
}

impl FlashcardSession {
    /// # Errors
    ///
    /// Returns `FlashcardError::Empty` if `cards` is empty.
    pub fn new(cards: Vec<Question>) -> Result<Self, FlashcardError> {
        if cards.is_empty() {
            return Err(FlashcardError::Empty);
        }
        Ok(Self {
            progress: vec![CardProgress::default(); cards.len()],
            cards,
            current: 0,
            completed: false,
        })
    }

    #[must_use]
    pub fn cards(&self) -> &[Question] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_card(&self) -> &Question {
        &self.cards[self.current]
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Option currently selected on the active card, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.progress[self.current].selected
    }

    #[must_use]
    pub fn card_state(&self, index: usize) -> Option<CardState> {
        let card = self.cards.get(index)?;
        let progress = self.progress.get(index)?;

        let state = match progress.selected {
            Some(selected) if progress.revealed => CardState::Revealed {
                correct: card.is_correct(Some(selected)),
            },
            Some(selected) if card.is_correct(Some(selected)) => CardState::AnsweredCorrect {
                credited: progress.credited,
            },
            Some(_) => CardState::AnsweredWrong {
                attempts: progress.wrong_attempts,
            },
            None if progress.failed_once => CardState::Retrying {
                attempts: progress.wrong_attempts,
            },
            None => CardState::Unanswered,
        };
        Some(state)
    }

    #[must_use]
    pub fn current_state(&self) -> CardState {
        self.card_state(self.current).unwrap_or(CardState::Unanswered)
    }

    /// Choose an option on the current card.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::Completed` once the session is over,
    /// `SelectionLocked` while an earlier selection stands or the card is revealed,
    /// and `OptionOutOfRange` for an invalid index.
    pub fn select_option(&mut self, option: usize) -> Result<Answer, FlashcardError> {
        if self.completed {
            return Err(FlashcardError::Completed);
        }
        let card = &self.cards[self.current];
        let progress = &mut self.progress[self.current];

        if progress.selected.is_some() || progress.revealed {
            return Err(FlashcardError::SelectionLocked);
        }
        if !card.accepts(option) {
            return Err(FlashcardError::OptionOutOfRange {
                option,
                len: card.option_count(),
            });
        }

        progress.selected = Some(option);
        if card.is_correct(Some(option)) {
            if !progress.failed_once {
                progress.credited = true;
            }
            Ok(Answer::Correct {
                credited: progress.credited,
            })
        } else {
            progress.failed_once = true;
            progress.wrong_attempts = progress.wrong_attempts.saturating_add(1);
            Ok(Answer::Wrong {
                attempts: progress.wrong_attempts,
            })
        }
    }

    /// Clear a wrong selection so the learner can try the same card again.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::NothingToRetry` unless a wrong, unrevealed selection stands.
    pub fn retry(&mut self) -> Result<(), FlashcardError> {
        if self.completed {
            return Err(FlashcardError::Completed);
        }
        let card = &self.cards[self.current];
        let progress = &mut self.progress[self.current];

        match progress.selected {
            Some(selected) if !progress.revealed && !card.is_correct(Some(selected)) => {
                progress.selected = None;
                Ok(())
            }
            _ => Err(FlashcardError::NothingToRetry),
        }
    }

    /// Flip the current card to show its explanation. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::NoSelection` if no option is selected yet.
    pub fn reveal(&mut self) -> Result<(), FlashcardError> {
        if self.completed {
            return Err(FlashcardError::Completed);
        }
        let progress = &mut self.progress[self.current];
        if progress.selected.is_none() {
            return Err(FlashcardError::NoSelection);
        }
        progress.revealed = true;
        Ok(())
    }

    /// Move past a revealed card. Past the last card the session completes.
    ///
    /// Calling this again after completion returns `Advance::Completed`.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::NotRevealed` if the current card is not revealed yet.
    pub fn advance(&mut self) -> Result<Advance, FlashcardError> {
        if self.completed {
            return Ok(Advance::Completed);
        }
        if !self.progress[self.current].revealed {
            return Err(FlashcardError::NotRevealed);
        }

        if self.current + 1 < self.cards.len() {
            self.current += 1;
            Ok(Advance::Next(self.current))
        } else {
            self.completed = true;
            Ok(Advance::Completed)
        }
    }

    /// Cards answered correctly on the first attempt.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        let count = self.progress.iter().filter(|p| p.credited).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// `round(100 * credited / total)`.
    #[must_use]
    pub fn final_score(&self) -> u8 {
        let total = u32::try_from(self.cards.len()).unwrap_or(u32::MAX);
        scoring::percentage(self.correct_count(), total)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
