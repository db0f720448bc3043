use std::sync::OnceLock;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub log_json: bool,
    /// Marks the session cookie `Secure`. Keep off when serving plain http.
    #[serde(default)]
    pub session_secure: bool,

    // build
    #[serde(default = "default_local")]
    pub source: String,
    #[serde(default = "default_local")]
    pub git_commit: String,
    #[serde(default = "default_local")]
    pub pipeline_id: String,
    #[serde(default = "default_local")]
    pub version: String,
}

fn default_port() -> u16 {
    4000
}

fn default_database_url() -> String {
    "sqlite.db".into()
}

fn default_local() -> String {
    "local".into()
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(err) => panic!("invalid configuration: {err}"),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
pub fn config_override<F>(override_config: F) -> &'static Config
where
    F: FnOnce(Config) -> Config,
{
    CONFIG.get_or_init(|| override_config(Config::from_env()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_variables() {
        let config = envy::from_iter::<_, Config>(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.database_url, "sqlite.db");
        assert!(!config.log_json);
        assert_eq!(config.version, "local");
    }

    #[test]
    fn variables_override_defaults() {
        let config = envy::from_iter::<_, Config>(vec![
            ("PORT".to_string(), "8080".to_string()),
            ("DATABASE_URL".to_string(), "notes.db".to_string()),
            ("LOG_JSON".to_string(), "true".to_string()),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "notes.db");
        assert!(config.log_json);
    }
}
