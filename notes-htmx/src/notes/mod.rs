mod api;
mod editor;
mod model;
mod routes;
mod store;
mod workspace;

pub use model::*;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::router(state.clone()))
        .merge(api::router(state))
}
