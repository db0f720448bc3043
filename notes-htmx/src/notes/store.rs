//! Persistence for notes.
//!
//! Every function runs as a single closure on the connection thread, so a
//! listing never observes half of a save or a delete. Ownership is checked
//! here, in the queries themselves, for every operation.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

use crate::{
    db::{self, DB},
    users::UserId,
    Error, Result,
};

use super::{Note, NoteId, NoteSummary, SaveNote, SaveOutcome, NOTE_COLUMNS};

/// Most recently updated first, ties in insertion order.
pub async fn list_notes(db: &DB, user_id: UserId) -> Result<Vec<NoteSummary>> {
    db.call(move |conn| {
        let notes = conn
            .prepare(
                "SELECT id, title, updated_at FROM notes WHERE created_by = ? ORDER BY updated_at DESC, rowid ASC",
            )?
            .query_map(params![user_id], |row| NoteSummary::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn count_notes(db: &DB, user_id: UserId) -> Result<u32> {
    db.call(move |conn| {
        conn.query_row("SELECT count(*) FROM notes WHERE created_by = ?", params![user_id], |r| r.get(0))
            .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

/// Notes of other users are reported as not found.
pub async fn get_note(db: &DB, user_id: UserId, note_id: NoteId) -> Result<Note> {
    db.call(move |conn| {
        let note = conn.query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ? AND created_by = ?"),
            params![note_id, user_id],
            |row| Note::try_from(row),
        )?;
        Ok(note)
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| db::Error::not_found_message(e, "Note not found"))
    .map_err(Error::from)
}

/// Owner of `note_id`, whoever that is. `None` when the note does not exist.
pub async fn note_owner(db: &DB, note_id: NoteId) -> Result<Option<UserId>> {
    db.call(move |conn| {
        conn.query_row("SELECT created_by FROM notes WHERE id = ?", params![note_id], |r| r.get(0))
            .optional()
            .map_err(|e| e.into())
    })
    .await
    .map_err(Error::from)
}

/// Creates or updates a note.
///
/// A note without a title is never written: the call returns
/// [`SaveOutcome::NoOp`] and leaves the store as it was. Updating a note of
/// another user fails with [`Error::Forbidden`], even when the title is empty.
pub async fn save_note(db: &DB, user_id: UserId, save: SaveNote) -> Result<SaveOutcome> {
    let note_id = save.note_id;

    let outcome = db
        .call(move |conn| {
            let tx = conn.transaction()?;

            if let Some(note_id) = save.note_id {
                let owner: Option<UserId> = tx
                    .query_row("SELECT created_by FROM notes WHERE id = ?", params![note_id], |r| r.get(0))
                    .optional()?;

                match owner {
                    None => return Err(Error::NotFound("Note not found".into()).into()),
                    Some(owner) if owner != user_id => return Err(Error::Forbidden.into()),
                    Some(_) => {}
                }
            }

            if !save.has_title() {
                return Ok(SaveOutcome::NoOp);
            }

            let updated_at = next_updated_at(&tx, user_id)?;
            let SaveNote { note_id, title, body } = save;

            let outcome = match note_id {
                Some(note_id) => SaveOutcome::Updated(tx.query_row(
                    &format!(
                        "UPDATE notes SET title = ?, body = ?, updated_at = ? WHERE id = ? AND created_by = ?
                        RETURNING {NOTE_COLUMNS}"
                    ),
                    params![title, body, updated_at, note_id, user_id],
                    |row| Note::try_from(row),
                )?),
                None => SaveOutcome::Created(tx.query_row(
                    &format!(
                        "INSERT INTO notes (title, body, created_at, created_by, updated_at) VALUES (?, ?, ?, ?, ?)
                        RETURNING {NOTE_COLUMNS}"
                    ),
                    params![title, body, updated_at, user_id, updated_at],
                    |row| Note::try_from(row),
                )?),
            };

            tx.commit()?;

            Ok(outcome)
        })
        .await
        .map_err(Error::from)?;

    match &outcome {
        SaveOutcome::Created(note) => tracing::info!(note_id = %note.id, "note created"),
        SaveOutcome::Updated(note) => tracing::debug!(note_id = %note.id, "note updated"),
        SaveOutcome::NoOp => tracing::debug!(?note_id, "note without a title was not saved"),
    }

    Ok(outcome)
}

/// Notes of other users are reported as not found and left alone.
pub async fn delete_note(db: &DB, user_id: UserId, note_id: NoteId) -> Result<Note> {
    let note = db
        .call(move |conn| {
            conn.query_row(
                &format!("DELETE FROM notes WHERE id = ? AND created_by = ? RETURNING {NOTE_COLUMNS}"),
                params![note_id, user_id],
                |row| Note::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await
        .map_err(db::Error::from)
        .map_err(|e| db::Error::not_found_message(e, "Note not found"))
        .map_err(Error::from)?;

    tracing::info!(note_id = %note.id, "note deleted");

    Ok(note)
}

/// Timestamp for the next save of `user_id`: now, unless the clock has not
/// moved past their latest save, then one microsecond after it.
fn next_updated_at(conn: &rusqlite::Connection, user_id: UserId) -> rusqlite::Result<DateTime<Utc>> {
    let latest: Option<DateTime<Utc>> = conn.query_row(
        "SELECT max(updated_at) FROM notes WHERE created_by = ?",
        params![user_id],
        |r| r.get(0),
    )?;

    let now = Utc::now();

    Ok(match latest {
        Some(latest) if latest >= now => latest + Duration::microseconds(1),
        _ => now,
    })
}
