mod app;
mod auth;
mod db;
mod notes;
mod shared;
mod users;

use db::init_db;
use tokio::net::TcpListener;

pub use app::{
    config::{self, config},
    create_app, ctx,
    errors::{self, Error, Result},
    state,
};
pub use shared::views;

#[tokio::main]
async fn main() -> errors::Result<()> {
    let config = config();

    shared::tracing::setup_tracing(config.log_json);

    let conn = init_db().await?;

    let app = create_app(conn).await?;

    let app = shared::tracing::add_tracing_layer(app);

    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))
        .await
        .map_err(|err| Error::Unexpected(format!("failed to bind port {}: {err}", config.port)))?;

    tracing::info!(
        version = %config.version,
        "listening on http://{}",
        listener.local_addr().map_err(|err| Error::Unexpected(err.to_string()))?
    );

    axum::serve(listener, app)
        .await
        .map_err(|err| Error::Unexpected(err.to_string()))?;

    Ok(())
}

#[cfg(test)]
pub mod tests {
    use axum_test::{TestServer, TestServerConfig};

    use crate::{config::config_override, create_app, db::DB, errors::Result};

    pub async fn test_server(db: DB) -> Result<TestServer> {
        config_override(|mut config| {
            config.session_secure = false;
            config
        });

        let app = create_app(db).await?;

        let config = TestServerConfig::builder().save_cookies().mock_transport().build();

        Ok(TestServer::new_with_config(app, config).unwrap())
    }
}
