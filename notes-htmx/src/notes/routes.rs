use axum::{
    extract::{Path, Query},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use axum_htmx::HxRequest;
use minijinja::context;
use serde::{Deserialize, Deserializer};

use crate::{auth, ctx::BaseParams, state::AppState, views::Views, Result};

use super::{
    editor::{Action, EditorSession},
    word_count,
    workspace::{self, Workspace},
    NoteId,
};

#[derive(Debug, Deserialize)]
struct HomeQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    note_id: Option<NoteId>,
}

/// The editor as the browser holds it.
#[derive(Debug, Deserialize)]
struct EditorForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    note_id: Option<NoteId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct WordCountForm {
    #[serde(default)]
    body: String,
}

/// A blank hidden input posts `note_id=`.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NoteId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/home", get(home_view))
        .route("/notes/save", post(save_note))
        .route("/notes/new", post(new_note))
        .route("/notes/:note_id/open", post(open_note))
        .route("/notes/:note_id/delete", post(delete_note))
        .route("/notes/word-count", post(count_words))
        .with_state(state)
        .layer(middleware::from_fn(auth::middleware::protected_view))
}

async fn home_view(
    view: Views,
    HxRequest(hx): HxRequest,
    base: BaseParams,
    Query(query): Query<HomeQuery>,
) -> Result<Response> {
    let user_id = base.ctx.require_user_id()?;

    let workspace = match query.note_id {
        Some(note_id) => workspace::apply(&base.db, user_id, EditorSession::empty(), Action::Open(note_id)).await?,
        None => workspace::load(&base.db, user_id, EditorSession::empty(), vec![]).await?,
    };

    Ok(render(&view, hx, &base, workspace))
}

async fn save_note(view: Views, HxRequest(hx): HxRequest, base: BaseParams, Form(form): Form<EditorForm>) -> Result<Response> {
    run(view, hx, base, form, Action::Save).await
}

async fn new_note(view: Views, HxRequest(hx): HxRequest, base: BaseParams, Form(form): Form<EditorForm>) -> Result<Response> {
    run(view, hx, base, form, Action::New).await
}

async fn open_note(
    view: Views,
    HxRequest(hx): HxRequest,
    base: BaseParams,
    Path(note_id): Path<NoteId>,
    Form(form): Form<EditorForm>,
) -> Result<Response> {
    run(view, hx, base, form, Action::Open(note_id)).await
}

async fn delete_note(
    view: Views,
    HxRequest(hx): HxRequest,
    base: BaseParams,
    Path(note_id): Path<NoteId>,
    Form(form): Form<EditorForm>,
) -> Result<Response> {
    run(view, hx, base, form, Action::Delete(note_id)).await
}

async fn count_words(view: Views, Form(form): Form<WordCountForm>) -> impl IntoResponse {
    view.response("home.html#word_count", context! { word_count => word_count(&form.body) })
}

async fn run(view: Views, hx: bool, base: BaseParams, form: EditorForm, action: Action) -> Result<Response> {
    let user_id = base.ctx.require_user_id()?;

    let session = workspace::restore(&base.db, user_id, form.note_id, form.title, form.body).await?;
    let workspace = workspace::apply(&base.db, user_id, session, action).await?;

    Ok(render(&view, hx, &base, workspace))
}

/// htmx swaps the workspace in place, everything else gets the whole page.
fn render(view: &Views, hx: bool, base: &BaseParams, workspace: Workspace) -> Response {
    let key = if hx { "home.html#workspace" } else { "home.html" };

    view.response(
        key,
        context! {
            user => base.ctx.user,
            note_count => workspace.notes.len(),
            word_count => workspace.word_count,
            workspace => workspace,
        },
    )
}
