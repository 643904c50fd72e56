use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};

use crate::queue::{QueueCounter, DEFAULT_PREFIX};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_response_headers_layer;

const DEFAULT_RESET_TIME: &str = "00:00";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub queue_prefix: String,
    /// Local time of day at which the daily reset fires.
    pub reset_time: NaiveTime,
    /// Timezone that defines the calendar day.
    pub reset_offset: FixedOffset,
    pub store_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub include_hsts: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let reset_time = match env::var("QUEUE_RESET_TIME") {
            Ok(raw) => parse_reset_time(&raw).unwrap_or_else(|| {
                tracing::warn!("Config: invalid QUEUE_RESET_TIME '{}', using {}", raw, defaults.reset_time);
                defaults.reset_time
            }),
            Err(_) => defaults.reset_time,
        };

        let offset_minutes: i32 = parse_var("QUEUE_RESET_UTC_OFFSET_MINUTES", 0);
        let reset_offset = offset_from_minutes(offset_minutes).unwrap_or_else(|| {
            tracing::warn!("Config: UTC offset of {} minutes is out of range, using UTC", offset_minutes);
            defaults.reset_offset
        });

        let include_hsts = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr),
            queue_prefix: env::var("QUEUE_PREFIX")
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.queue_prefix),
            reset_time,
            reset_offset,
            store_timeout: Duration::from_secs(parse_var(
                "STORE_TIMEOUT_SECS",
                DEFAULT_STORE_TIMEOUT_SECS,
            )),
            cors_origins: split_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            include_hsts,
        }
    }

    pub fn counter(&self) -> QueueCounter {
        QueueCounter::new(self.queue_prefix.clone(), self.reset_offset)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            queue_prefix: DEFAULT_PREFIX.to_string(),
            reset_time: parse_reset_time(DEFAULT_RESET_TIME).unwrap_or_default(),
            reset_offset: Utc.fix(),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            cors_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            include_hsts: false,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid {} '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// `HH:MM`, 24-hour.
pub fn parse_reset_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
