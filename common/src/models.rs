use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named point with the IANA timezone used for local labels.
///
/// Identity is `name`, compared exactly. Two places sharing a display name
/// share a cache slot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tz: String,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, tz: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            tz: tz.into(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub fn same_identity(&self, other: &City) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One calendar day of sunrise/sunset data, instants in UTC
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub day_length_seconds: f64,
}

/// Result of a multi-day fetch: the days that succeeded plus the gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct DayWindow {
    pub days: Vec<DayRecord>,
    pub missing_dates: Vec<NaiveDate>,
}

/// Persisted snapshot of the latest successful refresh for a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CacheEntry {
    pub coords: Coordinates,
    pub tz: String,
    pub days: Vec<DayRecord>,
    #[serde(default)]
    pub missing_dates: Vec<NaiveDate>,
    /// Epoch milliseconds of the fetch
    pub ts: i64,
}

impl CacheEntry {
    pub fn new(city: &City, window: DayWindow, fetched_at: DateTime<Utc>) -> Self {
        Self {
            coords: city.coordinates(),
            tz: city.tz.clone(),
            days: window.days,
            missing_dates: window.missing_dates,
            ts: fetched_at.timestamp_millis(),
        }
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.ts).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            _ => None,
        }
    }
}

/// Where rendered days came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Updated,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            DataSource::Cache => "📦 Cache local",
            DataSource::Updated => "✅ Dados atualizados",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    Online,
    Offline,
}
