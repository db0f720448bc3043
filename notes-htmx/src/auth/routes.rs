use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use minijinja::context;
use serde::Deserialize;

use crate::{
    db,
    state::AppState,
    users::auth::{create_user, CreateUserParameters},
    views::Views,
};

use super::{
    backend::{AuthSession, Credentials},
    password::hash_password_blocking,
    Error, Result,
};

const HOME: &str = "/home";

#[derive(Deserialize)]
pub struct Next {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterForm {
    /// Messages for every rule the form breaks, in field order.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut errors = vec![];

        if self.name.trim().is_empty() {
            errors.push("The name field is required.");
        } else if self.name.chars().count() > 255 {
            errors.push("The name may not be greater than 255 characters.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("The email field is required.");
        } else if !is_email(email) {
            errors.push("The email must be a valid email address.");
        }

        if self.password.chars().count() < 6 {
            errors.push("The password must be at least 6 characters.");
        } else if self.password != self.password_confirmation {
            errors.push("The password confirmation does not match.");
        }

        errors
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Only same-site paths are followed after login. Browsers read `\` as `/`,
/// so `/\host` is as off-site as `//host`.
fn safe_next(next: Option<String>) -> String {
    next.filter(|next| {
        next.starts_with('/')
            && !next.starts_with("//")
            && !next.contains('\\')
            && !next.chars().any(char::is_control)
    })
    .unwrap_or_else(|| HOME.into())
}

pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .route("/login", get(login_view).post(login))
        .route("/register", get(register_view).post(register))
        .route("/logout", post(logout))
        .with_state(state)
}

pub async fn login_view(view: Views, Query(Next { next }): Query<Next>) -> impl IntoResponse {
    view.response("login.html", context! { next => next })
}

pub async fn login(view: Views, mut auth_session: AuthSession, Form(creds): Form<Credentials>) -> Result<Response> {
    let email = creds.email.clone();
    let next = creds.next.clone();

    let Some(user) = auth_session.authenticate(creds).await? else {
        let page = view.response(
            "login.html",
            context! {
                email => email,
                next => next,
                errors => ["These credentials do not match our records."],
            },
        );
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    };

    auth_session.login(&user).await?;

    Ok(Redirect::to(&safe_next(next)).into_response())
}

pub async fn register_view(view: Views) -> impl IntoResponse {
    view.response("register.html", context! {})
}

pub async fn register(view: Views, mut auth_session: AuthSession, Form(form): Form<RegisterForm>) -> Result<Response> {
    let rejected = |errors: Vec<&str>| {
        let page = view.response(
            "register.html",
            context! { name => form.name, email => form.email, errors => errors },
        );
        (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(rejected(errors));
    }

    let password_hash = hash_password_blocking(form.password.clone()).await?;
    let created = create_user(
        auth_session.backend.db(),
        CreateUserParameters {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash,
        },
    )
    .await;

    let user = match created {
        Ok(user) => user,
        Err(db::Error::Conflict(_)) => return Ok(rejected(vec!["The email has already been taken."])),
        Err(err) => return Err(Error::from(err)),
    };

    tracing::info!("{} signed up", user.email);

    auth_session.login(&user).await?;

    Ok(Redirect::to(HOME).into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Redirect> {
    auth_session.logout().await?;
    Ok(Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{db::init_test_db, tests::test_server};

    use super::*;

    async fn register_as(server: &TestServer, name: &str, email: &str, password: &str, confirmation: &str) -> axum_test::TestResponse {
        server
            .post("/register")
            .form(&json!({
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": confirmation,
            }))
            .await
    }

    #[tokio::test]
    async fn sign_up_signs_the_user_in() -> crate::Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = register_as(&server, "Tabby Garett", "tabby@codecourse.com", "password", "password").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/home");

        let home = server.get("/home").await;
        home.assert_status_ok();
        assert!(home.text().contains("Tabby Garett"));
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_is_rejected_with_reasons() -> crate::Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = register_as(&server, "Tabby", "tabby@codecourse.com", "password", "passw0rd").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("The password confirmation does not match."));
        assert!(response.text().contains("tabby@codecourse.com"));

        register_as(&server, "Tabby", "tabby@codecourse.com", "password", "password")
            .await
            .assert_status(StatusCode::SEE_OTHER);
        server.post("/logout").await.assert_status(StatusCode::SEE_OTHER);

        let response = register_as(&server, "Other", "TABBY@codecourse.com", "password", "password").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("The email has already been taken."));
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_and_out() -> crate::Result<()> {
        let server = test_server(init_test_db().await?).await?;
        register_as(&server, "Tabby", "tabby@codecourse.com", "password", "password").await;
        server.post("/logout").await;

        server.get("/home").await.assert_status(StatusCode::SEE_OTHER);

        let response = server
            .post("/login")
            .form(&json!({ "email": "tabby@codecourse.com", "password": "wrong-password" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("These credentials do not match our records."));

        let response = server
            .post("/login")
            .form(&json!({ "email": "tabby@codecourse.com", "password": "password", "next": "/home?note_id=x" }))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/home?note_id=x");

        server.get("/home").await.assert_status_ok();
        Ok(())
    }

    fn form(name: &str, email: &str, password: &str, confirmation: &str) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
        }
    }

    #[test]
    fn valid_registration() {
        let errors = form("Tabby Garett", "tabby@codecourse.com", "password", "password").validate();

        assert!(errors.is_empty());
    }

    #[test]
    fn registration_rules() {
        assert_eq!(
            form("", "tabby", "pass", "pass").validate(),
            vec![
                "The name field is required.",
                "The email must be a valid email address.",
                "The password must be at least 6 characters.",
            ]
        );
        assert_eq!(
            form("Tabby", "tabby@codecourse.com", "password", "passw0rd").validate(),
            vec!["The password confirmation does not match."]
        );
    }

    #[test]
    fn next_stays_on_site() {
        assert_eq!(safe_next(None), "/home");
        assert_eq!(safe_next(Some("/home?note_id=1".into())), "/home?note_id=1");
        assert_eq!(safe_next(Some("https://evil.example".into())), "/home");
        assert_eq!(safe_next(Some("//evil.example".into())), "/home");
        assert_eq!(safe_next(Some("/\\evil.example".into())), "/home");
        assert_eq!(safe_next(Some("/\\/evil.example".into())), "/home");
        assert_eq!(safe_next(Some("/\t/evil.example".into())), "/home");
        assert_eq!(safe_next(Some("/home\r\nSet-Cookie: x=1".into())), "/home");
    }
}
