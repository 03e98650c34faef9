use chrono_tz::Tz;
use common::models::{City, ThemePreference};
use common::time_fmt::{FALLBACK_TIMEZONE, resolve_timezone};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Lower bound for the suggestion quiet period
pub const MIN_SEARCH_DEBOUNCE_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sunrise_api_url: String,
    pub geocoding_api_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub fetch_concurrency: usize,
    pub search_debounce_ms: u64,
    pub country_code: String,
    pub geo_language: String,
    pub default_timezone: Tz,
    pub default_theme: ThemePreference,
    pub asset_dir: PathBuf,
    pub asset_version: String,
    pub start_online: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let default_timezone = env::var("DEFAULT_TIMEZONE")
            .map(|tz| resolve_timezone(&tz, FALLBACK_TIMEZONE))
            .unwrap_or(FALLBACK_TIMEZONE);

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3004),
            sunrise_api_url: env::var("SUNRISE_API_URL")
                .unwrap_or_else(|_| "https://api.sunrise-sunset.org/json".to_string()),
            geocoding_api_url: env::var("GEOCODING_API_URL").unwrap_or_else(|_| {
                "https://geocoding-api.open-meteo.com/v1/search".to_string()
            }),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://sun_window.db?mode=rwc".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(0),
            fetch_concurrency: env::var("FETCH_CONCURRENCY")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(4),
            search_debounce_ms: env::var("SEARCH_DEBOUNCE_MS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(300),
            country_code: env::var("COUNTRY_CODE").unwrap_or_else(|_| "BR".to_string()),
            geo_language: env::var("GEO_LANGUAGE").unwrap_or_else(|_| "pt".to_string()),
            default_timezone,
            default_theme: env::var("DEFAULT_THEME")
                .ok()
                .and_then(|t| ThemePreference::parse(&t))
                .unwrap_or_default(),
            asset_dir: env::var("ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            asset_version: env::var("ASSET_VERSION").unwrap_or_else(|_| "sun-app-v3".to_string()),
            start_online: env::var("START_ONLINE")
                .ok()
                .and_then(|o| o.parse().ok())
                .unwrap_or(true),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms.max(MIN_SEARCH_DEBOUNCE_MS))
    }

    /// City shown on startup
    pub fn default_city(&self) -> City {
        City::new("São Paulo", -23.55052, -46.633308, "America/Sao_Paulo")
    }
}
