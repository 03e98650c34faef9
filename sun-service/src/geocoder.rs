use chrono_tz::Tz;
use common::http_client::HttpClient;
use common::models::City;
use common::time_fmt::resolve_timezone;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

pub const MAX_CANDIDATES: usize = 5;

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    admin1: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    timezone: Option<String>,
}

/// A candidate city for the suggestion list
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Suggestion {
    pub city: City,
    pub admin1: Option<String>,
    pub country: Option<String>,
    pub label: String,
}

fn suggestion_label(name: &str, admin1: Option<&str>, country: Option<&str>) -> String {
    let mut label = name.to_string();
    if let Some(admin1) = admin1.filter(|a| !a.is_empty()) {
        label.push_str(", ");
        label.push_str(admin1);
    }
    if let Some(country) = country.filter(|c| !c.is_empty()) {
        label.push_str(" — ");
        label.push_str(country);
    }
    label
}

/// Open-Meteo geocoding restricted to one country
pub struct GeocodingClient {
    http_client: Arc<HttpClient>,
    base_url: String,
    language: String,
    country_code: String,
    default_timezone: Tz,
}

impl GeocodingClient {
    pub fn new(
        http_client: Arc<HttpClient>,
        base_url: String,
        language: String,
        country_code: String,
        default_timezone: Tz,
    ) -> Self {
        Self {
            http_client,
            base_url,
            language,
            country_code,
            default_timezone,
        }
    }

    /// Resolves a free-text query. Failures are logged and yield no
    /// candidates.
    #[instrument(skip(self))]
    pub async fn resolve_candidates(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let url = format!(
            "{}?name={}&count={}&language={}&format=json",
            self.base_url,
            urlencoding::encode(query),
            MAX_CANDIDATES,
            urlencoding::encode(&self.language)
        );

        let response: GeocodingResponse = match self.http_client.get_json(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(query = %query, error = %e, "Geocoding failed, hiding suggestions");
                return Vec::new();
            }
        };

        let suggestions: Vec<Suggestion> = response
            .results
            .into_iter()
            .filter(|r| {
                r.country_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(&self.country_code))
            })
            .take(MAX_CANDIDATES)
            .map(|r| {
                let tz = r
                    .timezone
                    .as_deref()
                    .map(|tz| resolve_timezone(tz, self.default_timezone))
                    .unwrap_or(self.default_timezone);
                Suggestion {
                    label: suggestion_label(&r.name, r.admin1.as_deref(), r.country.as_deref()),
                    city: City::new(r.name, r.latitude, r.longitude, tz.name()),
                    admin1: r.admin1,
                    country: r.country,
                }
            })
            .collect();

        info!(query = %query, count = suggestions.len(), "Suggestions resolved");
        suggestions
    }
}

/// Lets only the last of a burst of calls through.
pub struct Debouncer {
    quiet: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: AtomicU64::new(0),
        }
    }

    /// Waits out the quiet period. Returns false when a newer call arrived
    /// in the meantime.
    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.quiet).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }

    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Suggestions(Vec<Suggestion>),
    Superseded,
}

/// Debounced front of [`GeocodingClient`], fed by text input
pub struct CitySearch {
    geocoder: Arc<GeocodingClient>,
    debouncer: Debouncer,
}

impl CitySearch {
    pub fn new(geocoder: Arc<GeocodingClient>, quiet: Duration) -> Self {
        Self {
            geocoder,
            debouncer: Debouncer::new(quiet),
        }
    }

    pub async fn search(&self, input: &str) -> SearchOutcome {
        let query = input.trim();
        if query.is_empty() {
            self.debouncer.cancel_pending();
            return SearchOutcome::Suggestions(Vec::new());
        }

        if !self.debouncer.settle().await {
            debug!(query = %query, "Search superseded by newer input");
            return SearchOutcome::Superseded;
        }

        SearchOutcome::Suggestions(self.geocoder.resolve_candidates(query).await)
    }
}
