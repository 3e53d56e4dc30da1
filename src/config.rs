use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use time::{Duration, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scheduling: SchedulingConfig,
    pub smtp: Option<SmtpConfig>,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// When unset the service runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    pub verification_ttl_minutes: i64,
    /// Slot spacing used when no service is named in a slots query.
    pub default_slot_minutes: i64,
    /// The business runs its agenda in this fixed offset (GMT+1 for the
    /// Luanda office); "today" filtering needs the matching wall clock.
    pub utc_offset_hours: i8,
}

impl SchedulingConfig {
    pub fn verification_ttl(&self) -> Duration {
        Duration::minutes(self.verification_ttl_minutes)
    }

    /// Current wall-clock time in the business timezone.
    pub fn business_now(&self) -> OffsetDateTime {
        let offset = UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
        OffsetDateTime::now_utc().to_offset(offset)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration (optional: the service falls back to the
        // in-memory store without it)
        let db_url = env::var("DATABASE_URL").ok();
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        // Scheduling configuration
        let verification_ttl_minutes = match env::var("VERIFICATION_TTL_MINUTES") {
            Ok(val) => val.parse().context("Failed to parse VERIFICATION_TTL_MINUTES")?,
            Err(_) => 10,
        };
        let default_slot_minutes = match env::var("DEFAULT_SLOT_MINUTES") {
            Ok(val) => val.parse().context("Failed to parse DEFAULT_SLOT_MINUTES")?,
            Err(_) => 60,
        };
        let utc_offset_hours = match env::var("SCHEDULING_UTC_OFFSET_HOURS") {
            Ok(val) => val.parse().context("Failed to parse SCHEDULING_UTC_OFFSET_HOURS")?,
            Err(_) => 1,
        };

        // SMTP configuration (optional)
        let smtp_config = if let Ok(host) = env::var("SMTP_HOST") {
            let username = env::var("SMTP_USERNAME")
                .context("SMTP_USERNAME must be set when SMTP_HOST is provided")?;
            let password = env::var("SMTP_PASSWORD")
                .context("SMTP_PASSWORD must be set when SMTP_HOST is provided")?;
            let from = env::var("SMTP_FROM")
                .context("SMTP_FROM must be set when SMTP_HOST is provided")?;

            Some(SmtpConfig {
                host,
                username,
                password,
                from,
            })
        } else {
            None
        };

        // App configuration
        let environment_str =
            env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let environment = match environment_str.to_lowercase().as_str() {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "Scheduling Backend".to_string());

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            scheduling: SchedulingConfig {
                verification_ttl_minutes,
                default_slot_minutes,
                utc_offset_hours,
            },
            smtp: smtp_config,
            app: AppConfig {
                name: app_name,
                environment,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

pub fn get() -> &'static Config {
    CONFIG.get().expect("Config is not initialized")
}
