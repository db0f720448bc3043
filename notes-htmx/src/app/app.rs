use axum::{
    middleware,
    response::{IntoResponse, Redirect},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::{auth, db::DB, notes, views::Views};

use super::{
    config::config,
    errors::{self, on_error},
    state::AppState,
};

pub async fn create_app(db: DB) -> errors::Result<Router> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config().session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    let views = Views::load().map_err(|err| errors::Error::Unexpected(format!("templates: {err:#}")))?;
    let state = AppState {
        conn: db.clone(),
        views,
    };

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/home") }))
        .route("/__version__", get(version))
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .merge(auth::router(state.clone()))
        .merge(notes::router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(db))
                .layer(middleware::from_fn(on_error)),
        );

    let app = auth::add_auth_layer(app, session_layer, state.conn.clone());

    Ok(app)
}

async fn version() -> impl IntoResponse {
    let config = config();
    Json(json!({
        "source" : config.source,
        "version": config.version,
        "commit" : config.git_commit,
        "build"  : config.pipeline_id
    }))
}

async fn heartbeat(Extension(db): Extension<DB>) -> impl IntoResponse {
    let database = db
        .call(|conn| conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0)).map_err(|e| e.into()))
        .await
        .is_ok();

    Json(json!({
        "status": if database { "ok" } else { "error" },
        "database": database,
    }))
}

async fn lbheartbeat() -> impl IntoResponse {
    ""
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::{db::init_test_db, tests::test_server, Result};

    #[tokio::test]
    async fn root_redirects_home() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server.get("/").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/home");
        Ok(())
    }

    #[tokio::test]
    async fn service_endpoints() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let version = server.get("/__version__").await.json::<Value>();
        assert_eq!(version["source"], "local");

        let heartbeat = server.get("/__heartbeat__").await.json::<Value>();
        assert_eq!(heartbeat["status"], "ok");

        server.get("/__lbheartbeat__").await.assert_status_ok();
        Ok(())
    }
}
