use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::{ExposeSecret, SecretString};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Config {
    pub application: Application,
    pub database: Database,
    pub jwt: Jwt,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub catalog: Catalog,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Application {
    pub name: String,
    pub log_level: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Jwt {
    pub secret: SecretString,
    pub iss: String,
    pub aud: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Database {
    pub username: String,
    pub password: SecretString,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl Database {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct History {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub play_suppression_ms: u64,
}

impl History {
    pub fn play_suppression_window(&self) -> Duration {
        Duration::from_millis(self.play_suppression_ms)
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            play_suppression_ms: 3_000,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Catalog {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub preview_size: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self { preview_size: 4 }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        let base_path = std::env::current_dir()
            .map_err(|e| figment::Error::from(format!("Failed to determine the current directory: {e}")))?;
        let config_directory = base_path.join("configuration");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(figment::Error::from)?;

        let environment_filename = format!("{}.yaml", environment.as_str());

        Self::from_figment(
            Figment::new()
                .merge(Yaml::file(config_directory.join("base.yaml")))
                .merge(Yaml::file(config_directory.join(environment_filename)))
                .merge(Env::prefixed("APP__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}
