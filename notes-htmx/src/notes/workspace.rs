//! Runs editor transitions against the store and gathers what the notes page
//! renders: the resulting editor, the flashes and the user's notes.

use serde::Serialize;

use crate::{db::DB, users::UserId, Error, Result};

use super::{
    editor::{Action, EditorSession, Effect, Flash},
    store, NoteId, NoteSummary, SaveOutcome,
};

#[derive(Debug, Serialize)]
pub struct Workspace {
    pub editor: EditorSession,
    pub word_count: usize,
    pub flashes: Vec<&'static str>,
    pub notes: Vec<NoteSummary>,
}

/// Rebuilds the session a client posted back: the note it was bound to, with
/// the submitted text on top. A bound note that no longer exists (deleted from
/// another tab) comes back as a draft so its text is not lost. Notes of other
/// users are [`Error::Forbidden`].
pub async fn restore(
    db: &DB,
    user_id: UserId,
    note_id: Option<NoteId>,
    title: String,
    body: String,
) -> Result<EditorSession> {
    let session = match note_id {
        Some(note_id) => match store::get_note(db, user_id, note_id).await {
            Ok(note) => EditorSession::bound(&note),
            Err(Error::NotFound(_)) => {
                if store::note_owner(db, note_id).await?.is_some() {
                    return Err(Error::Forbidden);
                }
                tracing::debug!(%note_id, "bound note is gone, editing as a draft");
                EditorSession::empty()
            }
            Err(err) => return Err(err),
        },
        None => EditorSession::empty(),
    };

    Ok(session.edit(title, body))
}

pub async fn apply(db: &DB, user_id: UserId, session: EditorSession, action: Action) -> Result<Workspace> {
    let (mut editor, effects) = session.transition(action);
    let mut flashes = vec![];

    // A missing target must fail before the implicit save writes anything.
    if let Some(note_id) = effects.iter().find_map(|effect| match effect {
        Effect::Open(note_id) => Some(*note_id),
        _ => None,
    }) {
        store::get_note(db, user_id, note_id).await?;
    }

    for effect in effects {
        match effect {
            Effect::Save { note, confirm: true } => match store::save_note(db, user_id, note).await? {
                SaveOutcome::Created(note) => {
                    editor = EditorSession::bound(&note);
                    flashes.push(Flash::NoteCreated);
                }
                SaveOutcome::Updated(note) => {
                    editor = EditorSession::bound(&note);
                    flashes.push(Flash::NoteSaved);
                }
                SaveOutcome::NoOp => {}
            },
            // Leaving the note goes ahead whatever the save did: an untitled
            // draft is dropped, a note deleted elsewhere stays deleted.
            Effect::Save { note, confirm: false } => match store::save_note(db, user_id, note).await {
                Ok(_) | Err(Error::NotFound(_)) => {}
                Err(err) => return Err(err),
            },
            Effect::Open(note_id) => {
                let note = store::get_note(db, user_id, note_id).await?;
                editor = EditorSession::bound(&note);
            }
            Effect::Delete(note_id) => {
                store::delete_note(db, user_id, note_id).await?;
            }
            Effect::Flash(flash) => flashes.push(flash),
        }
    }

    load(db, user_id, editor, flashes).await
}

pub async fn load(db: &DB, user_id: UserId, editor: EditorSession, flashes: Vec<Flash>) -> Result<Workspace> {
    let notes = store::list_notes(db, user_id).await?;

    Ok(Workspace {
        word_count: editor.word_count(),
        editor,
        flashes: flashes.iter().map(Flash::message).collect(),
        notes,
    })
}
