use std::{env, fmt::Display, str::FromStr, time::Duration};

use derive_more::{Display, Error};
use log::{info, warn};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Display, Error)]
#[display(fmt = "invalid value for {}: {}", key, reason)]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

/// Runtime settings, read once at startup and handed to whoever needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub admin_password: String,
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub public_base_url: String,
    pub catalog_host: String,
    pub catalog_timeout: Duration,
    pub catalog_user_agent: String,
    pub session_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: "dev-secret-key".to_string(),
            admin_password: "movienight".to_string(),
            database_url: "sqlite://movie_night.db".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            public_base_url: "http://127.0.0.1:8080".to_string(),
            catalog_host: "letterboxd.com".to_string(),
            catalog_timeout: Duration::from_secs(8),
            catalog_user_agent: DEFAULT_USER_AGENT.to_string(),
            session_ttl_hours: 12,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let timeout_secs: f64 = try_load("CATALOG_TIMEOUT", 8.0)?;
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return Err(ConfigError {
                key: "CATALOG_TIMEOUT",
                reason: "must be a positive number of seconds".to_string(),
            });
        }
        let public_base_url: String = try_load("PUBLIC_BASE_URL", defaults.public_base_url)?;

        Ok(Self {
            secret_key: load_secret("SECRET_KEY", defaults.secret_key),
            admin_password: load_secret("ADMIN_PASSWORD", defaults.admin_password),
            database_url: try_load("DATABASE_URL", defaults.database_url)?,
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            port: try_load("PORT", defaults.port)?,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            catalog_host: try_load("CATALOG_HOST", defaults.catalog_host)?,
            catalog_timeout: Duration::from_secs_f64(timeout_secs),
            catalog_user_agent: try_load("CATALOG_USER_AGENT", defaults.catalog_user_agent)?,
            session_ttl_hours: try_load("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
        })
    }

    pub fn invite_link(&self, token: &str) -> String {
        format!("{}/invite/{}", self.public_base_url, token)
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError { key, reason: e.to_string() }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

// Same as `try_load` but never echoes the value into the log.
fn load_secret(key: &'static str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            warn!("{key} not set, using the development default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_link_joins_base_and_token() {
        let config = Config {
            public_base_url: "https://movies.example".to_string(),
            ..Config::default()
        };
        assert_eq!(config.invite_link("abc123"), "https://movies.example/invite/abc123");
    }

    #[test]
    fn unparseable_value_is_reported_with_its_key() {
        env::set_var("MOVIE_NIGHT_TEST_PORT", "not-a-port");
        let err = try_load::<u16>("MOVIE_NIGHT_TEST_PORT", 8080).unwrap_err();
        assert_eq!(err.key, "MOVIE_NIGHT_TEST_PORT");
        env::remove_var("MOVIE_NIGHT_TEST_PORT");
    }

    #[test]
    fn missing_value_falls_back_to_default() {
        let port = try_load::<u16>("MOVIE_NIGHT_TEST_UNSET_PORT", 9090).unwrap();
        assert_eq!(port, 9090);
    }
}
