use std::env;

use crate::error::AppError;
use crate::search::Matcher;

/// Which `Store` implementation the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

pub struct Config {
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub storage: StorageBackend,
    pub matcher: Matcher,
    /// Marks the session cookie `Secure`; enable behind TLS.
    pub cookie_secure: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `DATABASE_URL` wins over the individual `DB_*` parts. `SERVER_*` wins
    /// over `APP_*`.
    pub fn from_env() -> Result<Self, AppError> {
        let storage = match var("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(invalid("STORAGE_BACKEND", other));
            }
        };

        let database_url = var("DATABASE_URL").or_else(database_url_from_parts);
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(AppError::InternalServerError(
                "DATABASE_URL (or DB_LOGIN, DB_PASSWORD, DB_HOST, DB_NAME) must be set".into(),
            ));
        }

        let server_port = match var("SERVER_PORT").or_else(|| var("APP_PORT")) {
            Some(port) => port.parse().map_err(|_| invalid("SERVER_PORT", &port))?,
            None => 8080,
        };
        let server_host = var("SERVER_HOST")
            .or_else(|| var("APP_HOST"))
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let matcher = match var("SEARCH_ALGORITHM").as_deref() {
            None | Some("levenshtein") => Matcher::edit_distance(),
            Some("jaccard") => Matcher::token_jaccard(),
            Some(other) => return Err(invalid("SEARCH_ALGORITHM", other)),
        };
        let matcher = match var("SEARCH_THRESHOLD") {
            Some(raw) => {
                let threshold: f64 = raw
                    .parse()
                    .map_err(|_| invalid("SEARCH_THRESHOLD", &raw))?;
                matcher.with_threshold(threshold)?
            }
            None => matcher,
        };

        let cookie_secure = match var("COOKIE_SECURE").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => return Err(invalid("COOKIE_SECURE", other)),
        };

        Ok(Self {
            database_url,
            server_port,
            server_host,
            storage,
            matcher,
            cookie_secure,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn invalid(key: &str, value: &str) -> AppError {
    AppError::InternalServerError(format!("{} has an invalid value: {:?}", key, value))
}

fn database_url_from_parts() -> Option<String> {
    let login = var("DB_LOGIN")?;
    let password = var("DB_PASSWORD")?;
    let host = var("DB_HOST")?;
    let name = var("DB_NAME")?;
    let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());
    Some(format!(
        "postgres://{}:{}@{}:{}/{}",
        login, password, host, port, name
    ))
}
