use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::{Environment, Error};

#[derive(Debug, Clone)]
pub struct Views {
    pub env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new(env: Environment<'static>) -> Self {
        Self { env: Arc::new(env) }
    }

    /// Environment with every template of the app registered.
    pub fn load() -> Result<Self, Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);

        env.add_template("base.html", include_str!("../views/base.html"))?;
        env.add_template("login.html", include_str!("../views/login.html"))?;
        env.add_template("register.html", include_str!("../views/register.html"))?;
        env.add_template("home.html", include_str!("../views/home.html"))?;

        Ok(Self::new(env))
    }
}

impl Views {
    /// Renders `key`, which is either `template` or `template#block`.
    pub fn response<D: serde::Serialize>(&self, key: &str, data: D) -> Response {
        match self.render(key, data) {
            Ok(x) => Html(x).into_response(),
            Err(err) => {
                tracing::error!("failed to render {key}: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }

    pub fn render<D: serde::Serialize>(&self, key: &str, data: D) -> Result<String, Error> {
        if let Some((template_name, block_name)) = key.split_once('#') {
            let template = self.env.get_template(template_name)?;
            let rendered = template.eval_to_state(&data)?.render_block(block_name)?;

            return Ok(rendered);
        }

        let template = self.env.get_template(key)?;
        let rendered = template.render(&data)?;

        Ok(rendered)
    }
}

#[async_trait]
impl<ApplicationState> FromRequestParts<ApplicationState> for Views
where
    Self: FromRef<ApplicationState>,
    ApplicationState: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_: &mut Parts, state: &ApplicationState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}
