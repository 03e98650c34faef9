use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use common::models::{City, DataSource, DayRecord, NetworkState, ThemePreference};
use common::time_fmt::{
    clock_label, date_label, day_length_hours, day_length_label, elapsed_label, minutes_before,
    resolve_timezone,
};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use utoipa::ToSchema;

use crate::presenter::Presenter;

/// One table row, localized to the city's timezone
#[derive(Debug, Serialize, Clone, PartialEq, ToSchema)]
pub struct DayRow {
    pub date: NaiveDate,
    pub date_label: String,
    pub sunrise: String,
    pub five_min_before_sunset: String,
    pub one_min_before_sunset: String,
    pub sunset: String,
    pub day_length: String,
}

/// Day length line chart data
#[derive(Debug, Serialize, Clone, Default, PartialEq, ToSchema)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub hours: Vec<f64>,
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
}

#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct ViewSnapshot {
    pub location: Option<City>,
    pub location_label: Option<String>,
    pub rows: Vec<DayRow>,
    pub chart: ChartSeries,
    pub source: Option<DataSource>,
    pub info_label: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub updated_label: Option<String>,
    pub network: NetworkState,
    pub status_label: String,
    pub refreshing: bool,
    pub last_error: Option<String>,
    pub recent: Vec<City>,
    pub theme: ThemePreference,
}

pub fn build_rows(days: &[DayRecord], tz: Tz) -> Vec<DayRow> {
    days.iter()
        .map(|day| DayRow {
            date: day.date,
            date_label: date_label(day.date),
            sunrise: clock_label(day.sunrise, tz),
            five_min_before_sunset: clock_label(minutes_before(day.sunset, 5), tz),
            one_min_before_sunset: clock_label(minutes_before(day.sunset, 1), tz),
            sunset: clock_label(day.sunset, tz),
            day_length: day_length_label(day.day_length_seconds),
        })
        .collect()
}

pub fn build_chart(days: &[DayRecord]) -> ChartSeries {
    let hours: Vec<f64> = days
        .iter()
        .map(|day| day_length_hours(day.day_length_seconds))
        .collect();

    ChartSeries {
        labels: days.iter().map(|day| date_label(day.date)).collect(),
        min_hours: hours.iter().copied().reduce(f64::min),
        max_hours: hours.iter().copied().reduce(f64::max),
        hours,
    }
}

fn status_label(state: NetworkState) -> &'static str {
    match state {
        NetworkState::Online => "🟢 Online + cache ativo",
        NetworkState::Offline => "🔴 Offline (usando cache)",
    }
}

struct ViewInner {
    location: Option<City>,
    days: Vec<DayRecord>,
    timezone: String,
    source: Option<DataSource>,
    fetched_at: Option<DateTime<Utc>>,
    network: NetworkState,
    refreshing: bool,
    last_error: Option<String>,
    recent: Vec<City>,
    theme: ThemePreference,
}

/// [`Presenter`] that keeps the latest state for the HTTP surface to read.
pub struct ViewState {
    inner: Mutex<ViewInner>,
    fallback_timezone: Tz,
}

impl ViewState {
    pub fn new(network: NetworkState, theme: ThemePreference, fallback_timezone: Tz) -> Self {
        Self {
            inner: Mutex::new(ViewInner {
                location: None,
                days: Vec::new(),
                timezone: fallback_timezone.name().to_string(),
                source: None,
                fetched_at: None,
                network,
                refreshing: false,
                last_error: None,
                recent: Vec::new(),
                theme,
            }),
            fallback_timezone,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> ViewSnapshot {
        let inner = self.lock();
        let tz = resolve_timezone(&inner.timezone, self.fallback_timezone);

        let info_label = if inner.refreshing {
            Some("🔄 Atualizando online…".to_string())
        } else {
            inner.source.map(|source| source.label().to_string())
        };

        ViewSnapshot {
            location_label: inner.location.as_ref().map(|city| {
                format!("Local: {} (lat {:.3}, lon {:.3})", city.name, city.lat, city.lon)
            }),
            location: inner.location.clone(),
            rows: build_rows(&inner.days, tz),
            chart: build_chart(&inner.days),
            source: inner.source,
            info_label,
            fetched_at: inner.fetched_at,
            updated_label: inner
                .fetched_at
                .map(|ts| format!("🕒 Última atualização {}", elapsed_label(ts, now))),
            network: inner.network,
            status_label: status_label(inner.network).to_string(),
            refreshing: inner.refreshing,
            last_error: inner.last_error.clone(),
            recent: inner.recent.clone(),
            theme: inner.theme,
        }
    }
}

impl Presenter for ViewState {
    fn render(
        &self,
        days: &[DayRecord],
        source: DataSource,
        fetched_at: DateTime<Utc>,
        timezone: &str,
    ) {
        let mut inner = self.lock();
        inner.days = days.to_vec();
        inner.timezone = timezone.to_string();
        inner.source = Some(source);
        inner.fetched_at = Some(fetched_at);
        inner.refreshing = false;
        inner.last_error = None;
    }

    fn show_status(&self, state: NetworkState) {
        self.lock().network = state;
    }

    fn show_error(&self, message: &str) {
        let mut inner = self.lock();
        inner.refreshing = false;
        inner.last_error = Some(message.to_string());
    }

    fn show_recent(&self, cities: &[City]) {
        self.lock().recent = cities.to_vec();
    }

    fn show_location(&self, city: &City) {
        let mut inner = self.lock();
        let changed = inner
            .location
            .as_ref()
            .is_none_or(|current| !current.same_identity(city));
        if changed {
            inner.days.clear();
            inner.source = None;
            inner.fetched_at = None;
        }
        inner.timezone = city.tz.clone();
        inner.location = Some(city.clone());
        inner.last_error = None;
    }

    fn show_refreshing(&self, _city: &City) {
        self.lock().refreshing = true;
    }

    fn show_theme(&self, theme: ThemePreference) {
        self.lock().theme = theme;
    }
}
