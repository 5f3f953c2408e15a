use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::allocation::model::{BookingPolicy, DEFAULT_DURATION_MINUTES, SEARCH_WINDOW_MINUTES, SLOT_STEP_MINUTES};
use crate::types::BookingError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingSettings {
    pub default_duration_minutes: i64,
    pub slot_step_minutes: i64,
    pub search_window_minutes: i64,
    /// Length probed at each grid step. Unset means the full booking duration.
    pub probe_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
    pub booking: BookingSettings,
}

impl Settings {
    /// Defaults, then `config/default.toml` if present, then `APP__SECTION__KEY`
    /// variables. `PG_DATABASE_URL` wins over everything for the database url.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(env::var("PG_DATABASE_URL").ok())
    }

    fn build(pg_database_url: Option<String>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "")?
            .set_default("database.pool_size", 5)?
            .set_default("log.level", "info")?
            .set_default("booking.default_duration_minutes", DEFAULT_DURATION_MINUTES)?
            .set_default("booking.slot_step_minutes", SLOT_STEP_MINUTES)?
            .set_default("booking.search_window_minutes", SEARCH_WINDOW_MINUTES)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("APP").separator("__").try_parsing(true))
            .set_override_option("database.url", pg_database_url)?
            .build()?
            .try_deserialize()
    }

    pub fn booking_policy(&self) -> Result<BookingPolicy, BookingError> {
        BookingPolicy::new(
            self.booking.default_duration_minutes,
            self.booking.slot_step_minutes,
            self.booking.search_window_minutes,
            self.booking.probe_minutes,
        )
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_section() {
        let settings = Settings::build(Some("postgres://localhost/bean".into())).unwrap();

        assert_eq!(settings.bind_address(), ("127.0.0.1".to_owned(), 8080));
        assert_eq!(settings.database.url, "postgres://localhost/bean");
        assert_eq!(settings.database.pool_size, 5);
        assert_eq!(settings.booking_policy().unwrap(), BookingPolicy::default());
    }

    #[test]
    fn legacy_probe_is_opt_in() {
        let mut settings = Settings::build(None).unwrap();
        settings.booking.probe_minutes = Some(15);

        let policy = settings.booking_policy().unwrap();

        assert_eq!(policy.probe.num_minutes(), 15);
        assert_eq!(policy.duration.num_minutes(), 120);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let mut settings = Settings::build(None).unwrap();
        settings.booking.slot_step_minutes = 0;

        assert!(matches!(settings.booking_policy(), Err(BookingError::Validation(_))));
    }
}
