use chrono::{DateTime, NaiveDate, Utc};
use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::{DayRecord, DayWindow};
use common::time_fmt::{local_today, window_dates};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

pub const WINDOW_DAYS: u32 = 14;

#[derive(Debug, Deserialize)]
struct SunriseSunsetResponse {
    status: String,
    // A string on error responses, an object on success.
    #[serde(default)]
    results: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SunTimes {
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
    day_length: f64,
}

/// Retrieves consecutive daily sunrise/sunset records from sunrise-sunset.org
pub struct SunDataFetcher {
    http_client: Arc<HttpClient>,
    base_url: String,
    semaphore: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl SunDataFetcher {
    pub fn new(
        http_client: Arc<HttpClient>,
        base_url: String,
        concurrency: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            http_client,
            base_url,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            cancellation_token,
        }
    }

    /// Today and the next 13 days, starting from the local calendar day
    pub async fn fetch_fourteen_days(&self, lat: f64, lon: f64) -> Result<DayWindow, AppError> {
        self.fetch_window(lat, lon, local_today()).await
    }

    /// Fetches every day of the window independently. Failed days are left
    /// out and reported in `missing_dates`; only a window with no usable day
    /// is an error. Cancelling the token, or dropping the returned future,
    /// stops every day still pending.
    #[instrument(skip(self))]
    pub async fn fetch_window(
        &self,
        lat: f64,
        lon: f64,
        start: NaiveDate,
    ) -> Result<DayWindow, AppError> {
        let dates = window_dates(start, WINDOW_DAYS);
        // Dropping the set aborts every day still queued or in flight.
        let mut tasks = JoinSet::new();

        for &date in &dates {
            let semaphore = self.semaphore.clone();
            let http_client = self.http_client.clone();
            let base_url = self.base_url.clone();
            let cancel = self.cancellation_token.clone();

            tasks.spawn(
                async move {
                    if cancel.is_cancelled() {
                        return (date, Err(AppError::internal("Fetch cancelled")));
                    }

                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            let e = AppError::internal(format!("Fetch limiter error: {}", e));
                            return (date, Err(e));
                        }
                    };

                    let result = tokio::select! {
                        result = fetch_day(&http_client, &base_url, lat, lon, date) => result,
                        _ = cancel.cancelled() => Err(AppError::internal("Fetch cancelled")),
                    };
                    (date, result)
                }
                .in_current_span(),
            );
        }

        let mut days = Vec::with_capacity(dates.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(day))) => days.push(day),
                Ok((date, Err(e))) => warn!(
                    %date,
                    error = %e,
                    network = e.is_network_failure(),
                    "Dropping day from window"
                ),
                Err(e) => error!(error = %e, "Day fetch task failed"),
            }
        }

        if self.cancellation_token.is_cancelled() {
            return Err(AppError::internal("Sun window fetch cancelled"));
        }

        days.sort_by_key(|day| day.date);
        let missing_dates: Vec<NaiveDate> = dates
            .into_iter()
            .filter(|date| days.binary_search_by_key(date, |day| day.date).is_err())
            .collect();

        if days.is_empty() {
            return Err(AppError::empty(format!(
                "No usable sunrise/sunset data for {} days from {}",
                WINDOW_DAYS, start
            )));
        }

        info!(
            fetched = days.len(),
            missing = missing_dates.len(),
            "Sun window fetched"
        );

        Ok(DayWindow {
            days,
            missing_dates,
        })
    }
}

async fn fetch_day(
    http_client: &HttpClient,
    base_url: &str,
    lat: f64,
    lon: f64,
    date: NaiveDate,
) -> Result<DayRecord, AppError> {
    let url = format!(
        "{}?lat={}&lng={}&date={}&formatted=0",
        base_url, lat, lon, date
    );

    let response: SunriseSunsetResponse = http_client.get_json(&url).await?;
    if response.status != "OK" {
        return Err(AppError::rejected(response.status));
    }

    let times: SunTimes = serde_json::from_value(response.results)?;

    Ok(DayRecord {
        date,
        sunrise: times.sunrise,
        sunset: times.sunset,
        day_length_seconds: times.day_length,
    })
}
