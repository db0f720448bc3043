use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::UserId;

pub type NoteId = Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_at: DateTime<Utc>,
}

/// What the notes list needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// A create (`note_id: None`) or an update of an existing note.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SaveNote {
    #[serde(default)]
    pub note_id: Option<NoteId>,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl SaveNote {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Note),
    Updated(Note),
    /// Nothing was written, the note had no title.
    NoOp,
}

impl SaveOutcome {
    pub fn note(&self) -> Option<&Note> {
        match self {
            SaveOutcome::Created(note) | SaveOutcome::Updated(note) => Some(note),
            SaveOutcome::NoOp => None,
        }
    }
}

/// Number of whitespace-delimited words in `body`.
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

pub(super) const NOTE_COLUMNS: &str = "id, title, body, created_at, created_by, updated_at";

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        let body: String = row.get(2)?;

        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            word_count: word_count(&body),
            body,
            created_at: row.get(3)?,
            created_by: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for NoteSummary {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            updated_at: row.get(2)?,
        })
    }
}
