//! Pure conversions from UTC instants and calendar dates to the pt-BR labels
//! shown by the widget.

use crate::errors::AppError;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use tracing::warn;

pub const FALLBACK_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::validation(format!("Unknown timezone: {}", name)))
}

/// Parse an IANA name, falling back when it is empty or unknown.
pub fn resolve_timezone(name: &str, fallback: Tz) -> Tz {
    if name.trim().is_empty() {
        return fallback;
    }
    parse_timezone(name).unwrap_or_else(|_| {
        warn!(timezone = %name, fallback = %fallback, "Unknown timezone, using fallback");
        fallback
    })
}

/// 24-hour `HH:MM` in the given zone
pub fn clock_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "dom.",
        Weekday::Mon => "seg.",
        Weekday::Tue => "ter.",
        Weekday::Wed => "qua.",
        Weekday::Thu => "qui.",
        Weekday::Fri => "sex.",
        Weekday::Sat => "sáb.",
    }
}

/// `qua., 16/10`
pub fn date_label(date: NaiveDate) -> String {
    format!(
        "{}, {:02}/{:02}",
        weekday_short(date.weekday()),
        date.day(),
        date.month()
    )
}

pub fn day_length_hours(seconds: f64) -> f64 {
    (seconds / 36.0).round() / 100.0
}

/// `12.34 h`
pub fn day_length_label(seconds: f64) -> String {
    format!("{:.2} h", seconds / 3600.0)
}

pub fn minutes_before(instant: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    instant - Duration::minutes(minutes)
}

/// Relative age of a fetch timestamp, e.g. `há 5 min`.
pub fn elapsed_label(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - since).num_minutes().max(0);
    if minutes < 1 {
        "há segundos".to_string()
    } else if minutes < 60 {
        format!("há {} min", minutes)
    } else if minutes < 1440 {
        format!("há {:.1} h", minutes as f64 / 60.0)
    } else {
        format!("há {:.1} dias", minutes as f64 / 1440.0)
    }
}

/// The caller's local calendar day. The fetch window is anchored here, not
/// in the target city's zone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn window_dates(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    start.iter_days().take(days as usize).collect()
}
