use axum::async_trait;
use axum_login::AuthUser;
use serde::Deserialize;

use crate::{
    db::{self, DB},
    users::{
        auth::{find_one_by_email, find_one_by_id, GetUserByEmailParameters, GetUserByIdParameters, User},
        UserId,
    },
};

use super::{password::verify_password_blocking, Error};

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

impl AuthUser for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing the password invalidates existing sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.password.as_bytes()
    }
}

#[derive(Clone)]
pub struct AuthBackend {
    db: DB,
}

impl AuthBackend {
    pub fn new(db: DB) -> Self {
        Self { db }
    }

    pub fn db(&self) -> DB {
        self.db.clone()
    }
}

#[async_trait]
impl axum_login::AuthnBackend for AuthBackend {
    type User = User;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(&self, creds: Self::Credentials) -> Result<Option<Self::User>, Self::Error> {
        let user = match find_one_by_email(
            self.db.clone(),
            GetUserByEmailParameters {
                user_email: creds.email.clone(),
            },
        )
        .await
        {
            Ok(user) => user,
            Err(db::Error::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if !verify_password_blocking(creds.password, user.password.clone()).await? {
            tracing::debug!("wrong password for {}", creds.email);
            return Ok(None);
        }

        tracing::info!("{} logged in", user.email);

        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &axum_login::UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let user = find_one_by_id(
            self.db.clone(),
            GetUserByIdParameters {
                user_id: user_id.to_owned(),
            },
        )
        .await;

        match user {
            Ok(user) => Ok(Some(user)),
            Err(db::Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl<AuthBackend> From<axum_login::Error<AuthBackend>> for Error
where
    AuthBackend: axum_login::AuthnBackend<Error = Error>,
{
    fn from(error: axum_login::Error<AuthBackend>) -> Self {
        match error {
            axum_login::Error::Session(err) => Error::Session(err),
            axum_login::Error::Backend(err) => err,
        }
    }
}

pub type AuthSession = axum_login::AuthSession<AuthBackend>;
