use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{auth, ctx::BaseParams, state::AppState, Result};

use super::{store, Note, NoteId, NoteSummary, SaveNote, SaveOutcome};

#[derive(Debug, Deserialize)]
struct NoteIdPath {
    note_id: NoteId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindNotesResponse {
    pub results: Vec<NoteSummary>,
    pub count: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/notes", get(find_notes).post(save_note))
        .route("/api/notes/:note_id", get(get_note).delete(delete_note))
        .with_state(state)
        .layer(middleware::from_fn(auth::middleware::protected))
}

async fn find_notes(base: BaseParams) -> Result<Json<FindNotesResponse>> {
    let user_id = base.ctx.require_user_id()?;

    let results = store::list_notes(&base.db, user_id).await?;
    let count = store::count_notes(&base.db, user_id).await?;

    Ok(Json(FindNotesResponse { results, count }))
}

/// 201 for a new note, 200 for an update, 204 when nothing was written.
async fn save_note(base: BaseParams, Json(args): Json<SaveNote>) -> Result<Response> {
    let user_id = base.ctx.require_user_id()?;

    let response = match store::save_note(&base.db, user_id, args).await? {
        SaveOutcome::Created(note) => (StatusCode::CREATED, Json(note)).into_response(),
        SaveOutcome::Updated(note) => Json(note).into_response(),
        SaveOutcome::NoOp => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

async fn get_note(Path(NoteIdPath { note_id }): Path<NoteIdPath>, base: BaseParams) -> Result<Json<Note>> {
    let user_id = base.ctx.require_user_id()?;

    store::get_note(&base.db, user_id, note_id).await.map(Json)
}

async fn delete_note(Path(NoteIdPath { note_id }): Path<NoteIdPath>, base: BaseParams) -> Result<Json<Note>> {
    let user_id = base.ctx.require_user_id()?;

    store::delete_note(&base.db, user_id, note_id).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        db::{init_test_db, DB},
        tests::test_server,
        users::auth::create_test_user,
    };

    use super::*;

    async fn signed_in(db: &DB, email: &str) -> Result<TestServer> {
        let server = test_server(db.clone()).await?;
        server
            .post("/register")
            .form(&json!({
                "name": "Api User",
                "email": email,
                "password": "password",
                "password_confirmation": "password",
            }))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        Ok(server)
    }

    #[tokio::test]
    async fn requires_a_signed_in_user() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        server.get("/api/notes").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/notes")
            .json(&json!({ "title": "One" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn create_list_get_and_delete() -> Result<()> {
        let db = init_test_db().await?;
        let server = signed_in(&db, "user@mail.com").await?;

        let response = server
            .post("/api/notes")
            .json(&json!({ "title": "One", "body": "Some body" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let note = response.json::<Note>();
        assert_eq!(note.title, "One");
        assert_eq!(note.word_count, 2);

        let list = server.get("/api/notes").await.json::<FindNotesResponse>();
        assert_eq!(list.count, 1);
        assert_eq!(list.results[0].id, note.id);

        let fetched = server.get(&format!("/api/notes/{}", note.id)).await.json::<Note>();
        assert_eq!(fetched, note);

        server
            .delete(&format!("/api/notes/{}", note.id))
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/notes/{}", note.id))
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn update_and_no_op() -> Result<()> {
        let db = init_test_db().await?;
        let server = signed_in(&db, "user@mail.com").await?;
        let note = server
            .post("/api/notes")
            .json(&json!({ "title": "One", "body": "First" }))
            .await
            .json::<Note>();

        let response = server
            .post("/api/notes")
            .json(&json!({ "note_id": note.id, "title": "One updated", "body": "First updated" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Note>().title, "One updated");

        server
            .post("/api/notes")
            .json(&json!({ "title": "", "body": "no title" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let list = server.get("/api/notes").await.json::<FindNotesResponse>();
        assert_eq!(list.count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn notes_of_other_users() -> Result<()> {
        let db = init_test_db().await?;
        let owner = create_test_user(db.clone(), "owner@mail.com").await;
        let outcome = store::save_note(
            &db,
            owner.id,
            SaveNote {
                note_id: None,
                title: "Private".into(),
                body: "".into(),
            },
        )
        .await?;
        let note_id = outcome.note().unwrap().id;

        let server = signed_in(&db, "intruder@mail.com").await?;

        server
            .get(&format!("/api/notes/{note_id}"))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/notes/{note_id}"))
            .await
            .assert_status_not_found();
        server
            .post("/api/notes")
            .json(&json!({ "note_id": note_id, "title": "Mine" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let list = server.get("/api/notes").await.json::<FindNotesResponse>();
        assert!(list.results.is_empty());
        Ok(())
    }
}
