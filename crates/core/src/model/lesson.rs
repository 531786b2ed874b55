use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson name cannot be empty")]
    EmptyName,

    #[error("document {0:?} has no content")]
    EmptyDocument(String),

    #[error("document name cannot be empty")]
    EmptyDocumentName,
}

//
// ─── SOURCE DOCUMENT ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    Text,
}

/// An uploaded file or pasted text, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl SourceDocument {
    /// # Errors
    ///
    /// Returns `LessonError` if the name is blank or `data` is empty.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self, LessonError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(LessonError::EmptyDocumentName);
        }
        if data.is_empty() {
            return Err(LessonError::EmptyDocument(name));
        }
        let mime_type = mime_type.into().trim().to_ascii_lowercase();
        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    /// A pasted-text document.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the name or the text is blank.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Result<Self, LessonError> {
        let text = text.into();
        let name = name.into();
        if text.trim().is_empty() {
            return Err(LessonError::EmptyDocument(name));
        }
        Self::new(name, "text/plain", text.into_bytes())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        if self.mime_type == "application/pdf" {
            DocumentKind::Pdf
        } else if self.mime_type.starts_with("image/") {
            DocumentKind::Image
        } else {
            DocumentKind::Text
        }
    }

    /// Document body as UTF-8 text, lossily decoded. `None` for PDFs and images.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self.kind() {
            DocumentKind::Text => Some(String::from_utf8_lossy(&self.data).into_owned()),
            DocumentKind::Pdf | DocumentKind::Image => None,
        }
    }
}

//
// ─── LESSON TYPES ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub name: String,
    pub document: SourceDocument,
    pub summary: Option<String>,
    pub deep_analysis: Option<String>,
    pub flashcards: Option<Vec<Question>>,
}

impl LessonDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, document: SourceDocument) -> Self {
        Self {
            name: name.into(),
            document,
            summary: None,
            deep_analysis: None,
            flashcards: None,
        }
    }

    /// # Errors
    ///
    /// Returns `LessonError::EmptyName` if the name is blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedLesson, LessonError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LessonError::EmptyName);
        }
        Ok(ValidatedLesson {
            name,
            document: self.document,
            summary: normalize_optional(self.summary),
            deep_analysis: normalize_optional(self.deep_analysis),
            flashcards: self.flashcards.filter(|cards| !cards.is_empty()),
            saved_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLesson {
    pub name: String,
    pub document: SourceDocument,
    pub summary: Option<String>,
    pub deep_analysis: Option<String>,
    pub flashcards: Option<Vec<Question>>,
    pub saved_at: DateTime<Utc>,
}

impl ValidatedLesson {
    #[must_use]
    pub fn assign_id(self, id: LessonId) -> SavedLesson {
        SavedLesson {
            id,
            name: self.name,
            saved_at: self.saved_at,
            document: self.document,
            summary: self.summary,
            deep_analysis: self.deep_analysis,
            flashcards: self.flashcards,
        }
    }
}

/// A document plus the artifacts generated for it, kept for offline study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLesson {
    pub id: LessonId,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub document: SourceDocument,
    pub summary: Option<String>,
    pub deep_analysis: Option<String>,
    pub flashcards: Option<Vec<Question>>,
}

impl SavedLesson {
    /// Merge a newer copy of the same lesson into this one.
    ///
    /// Artifacts present in `update` replace ours; absent ones are kept.
    pub fn merge(&mut self, update: SavedLesson) {
        self.name = update.name;
        self.saved_at = update.saved_at;
        self.document = update.document;
        if update.summary.is_some() {
            self.summary = update.summary;
        }
        if update.deep_analysis.is_some() {
            self.deep_analysis = update.deep_analysis;
        }
        if update.flashcards.is_some() {
            self.flashcards = update.flashcards;
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|val| !val.trim().is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
