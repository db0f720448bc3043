mod backend;
mod errors;
mod password;
mod routes;

use axum::Router;
use axum_login::AuthManagerLayerBuilder;

use tower_sessions::SessionStore;

pub use backend::{AuthBackend, AuthSession};
pub use errors::{Error, Result};
pub use routes::router;

use crate::db::DB;

pub fn add_auth_layer(
    app: Router,
    session_layer: tower_sessions::SessionManagerLayer<impl SessionStore + Clone>,
    db: DB,
) -> Router {
    let auth_backend = AuthBackend::new(db);
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_layer).build();

    app.layer(auth_layer)
}

pub mod middleware {
    use axum::{
        extract::Request,
        http::Uri,
        middleware::Next,
        response::{IntoResponse, Redirect, Response},
    };

    use super::*;

    /// Guard for JSON routes: 401 without a signed-in user.
    pub async fn protected(auth_session: AuthSession, request: Request, next: Next) -> Result<Response> {
        auth_session.user.ok_or(Error::Unauthorized)?;
        Ok(next.run(request).await)
    }

    /// Guard for pages: sends anonymous visitors to the login page.
    pub async fn protected_view(auth_session: AuthSession, url: Uri, request: Request, next: Next) -> impl IntoResponse {
        if auth_session.user.is_some() {
            return next.run(request).await;
        }

        let path = url
            .path_and_query()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| url.path().to_owned());
        Redirect::to(&login_url(&path)).into_response()
    }

    fn login_url(next: &str) -> String {
        format!("/login?next={}", urlencoding::encode(next))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn next_is_query_encoded() {
            assert_eq!(login_url("/home"), "/login?next=%2Fhome");
            assert_eq!(
                login_url("/home?note_id=1&x=y"),
                "/login?next=%2Fhome%3Fnote_id%3D1%26x%3Dy"
            );
        }
    }
}
