//! The note editor: one working buffer bound to at most one note.
//!
//! [`EditorSession`] is a plain value. [`EditorSession::transition`] takes an
//! [`Action`] and returns the next session together with the [`Effect`]s that
//! have to run against the store, in order. Every action that leaves the
//! current note first asks [`EditorSession::reconcile`] for the pending save,
//! so unsaved text is never dropped without an attempt to persist it.

use serde::Serialize;

use super::{word_count, Note, NoteId, SaveNote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "note_id", rename_all = "snake_case")]
pub enum EditorState {
    /// Nothing selected, blank fields.
    Empty,
    /// A note that has not been persisted yet.
    Draft,
    /// Mirrors a persisted note, possibly with unsaved edits.
    Bound(NoteId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Persisted {
    title: String,
    body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSession {
    pub state: EditorState,
    pub title: String,
    pub body: String,
    #[serde(skip)]
    persisted: Option<Persisted>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Edit { title: String, body: String },
    Save,
    Open(NoteId),
    New,
    Delete(NoteId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `confirm` marks an explicit save: on success the session binds to the
    /// saved note and the matching flash is shown. Implicit saves are silent.
    Save { note: SaveNote, confirm: bool },
    /// Bind the session to this note, loaded from the store.
    Open(NoteId),
    Delete(NoteId),
    Flash(Flash),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flash {
    NoteCreated,
    NoteSaved,
    FreshNote,
    NoteDeleted,
}

impl Flash {
    pub fn message(&self) -> &'static str {
        match self {
            Flash::NoteCreated => "Your new note has been saved.",
            Flash::NoteSaved => "Your note has been saved.",
            Flash::FreshNote => "A fresh note has been created.",
            Flash::NoteDeleted => "Your note has been deleted.",
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditorSession {
    pub fn empty() -> Self {
        Self {
            state: EditorState::Empty,
            title: String::new(),
            body: String::new(),
            persisted: None,
        }
    }

    /// Blank fields, ready to become a new note.
    pub fn fresh() -> Self {
        Self {
            state: EditorState::Draft,
            ..Self::empty()
        }
    }

    pub fn bound(note: &Note) -> Self {
        Self {
            state: EditorState::Bound(note.id),
            title: note.title.clone(),
            body: note.body.clone(),
            persisted: Some(Persisted {
                title: note.title.clone(),
                body: note.body.clone(),
            }),
        }
    }

    pub fn note_id(&self) -> Option<NoteId> {
        match self.state {
            EditorState::Bound(note_id) => Some(note_id),
            _ => None,
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.body)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match (&self.state, &self.persisted) {
            (EditorState::Empty, _) => false,
            (EditorState::Draft, _) => !self.title.is_empty() || !self.body.is_empty(),
            (EditorState::Bound(_), Some(persisted)) => persisted.title != self.title || persisted.body != self.body,
            (EditorState::Bound(_), None) => true,
        }
    }

    /// Replaces the text fields.
    pub fn edit(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();

        if self.state == EditorState::Empty && (!self.title.is_empty() || !self.body.is_empty()) {
            self.state = EditorState::Draft;
        }

        self
    }

    /// The save that brings the store up to date with this buffer, if any.
    pub fn reconcile(&self) -> Option<SaveNote> {
        self.has_unsaved_changes().then(|| self.save_request())
    }

    fn save_request(&self) -> SaveNote {
        SaveNote {
            note_id: self.note_id(),
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }

    pub fn transition(self, action: Action) -> (EditorSession, Vec<Effect>) {
        match action {
            Action::Edit { title, body } => (self.edit(title, body), vec![]),

            Action::Save => {
                let effects = match self.state {
                    EditorState::Empty => vec![],
                    EditorState::Draft | EditorState::Bound(_) => vec![Effect::Save {
                        note: self.save_request(),
                        confirm: true,
                    }],
                };
                (self, effects)
            }

            Action::Open(note_id) => {
                let mut effects = self.implicit_save();
                effects.push(Effect::Open(note_id));
                (self, effects)
            }

            Action::New => {
                let mut effects = self.implicit_save();
                effects.push(Effect::Flash(Flash::FreshNote));
                (EditorSession::fresh(), effects)
            }

            Action::Delete(note_id) => {
                let effects = vec![Effect::Delete(note_id), Effect::Flash(Flash::NoteDeleted)];
                if self.note_id() == Some(note_id) {
                    (EditorSession::empty(), effects)
                } else {
                    (self, effects)
                }
            }
        }
    }

    fn implicit_save(&self) -> Vec<Effect> {
        self.reconcile()
            .map(|note| Effect::Save { note, confirm: false })
            .into_iter()
            .collect()
    }
}
