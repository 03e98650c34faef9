#![allow(dead_code)]

use chrono::{DateTime, Utc};
use common::http_client::HttpClient;
use common::models::{City, DataSource, DayRecord, NetworkState, ThemePreference};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sun_service::fetcher::SunDataFetcher;
use sun_service::network::NetworkStatus;
use sun_service::orchestrator::Orchestrator;
use sun_service::presenter::Presenter;
use sun_service::store::{CacheStore, MemoryKvStore};
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Render {
        source: DataSource,
        days: Vec<DayRecord>,
        timezone: String,
    },
    Status(NetworkState),
    Error(String),
    Recent(Vec<String>),
    Location(String),
    Refreshing(String),
    Theme(ThemePreference),
}

#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<Event>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<(DataSource, Vec<DayRecord>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Render { source, days, .. } => Some((source, days)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn render(
        &self,
        days: &[DayRecord],
        source: DataSource,
        _fetched_at: DateTime<Utc>,
        timezone: &str,
    ) {
        self.push(Event::Render {
            source,
            days: days.to_vec(),
            timezone: timezone.to_string(),
        });
    }

    fn show_status(&self, state: NetworkState) {
        self.push(Event::Status(state));
    }

    fn show_error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }

    fn show_recent(&self, cities: &[City]) {
        self.push(Event::Recent(cities.iter().map(|c| c.name.clone()).collect()));
    }

    fn show_location(&self, city: &City) {
        self.push(Event::Location(city.name.clone()));
    }

    fn show_refreshing(&self, city: &City) {
        self.push(Event::Refreshing(city.name.clone()));
    }

    fn show_theme(&self, theme: ThemePreference) {
        self.push(Event::Theme(theme));
    }
}

/// Successful sunrise-sunset.org body; `sunrise` identifies the upstream.
pub fn sun_body(sunrise: &str) -> serde_json::Value {
    json!({
        "status": "OK",
        "results": {
            "sunrise": sunrise,
            "sunset": "2026-10-16T21:10:00+00:00",
            "solar_noon": "2026-10-16T14:55:00+00:00",
            "day_length": 44940
        },
        "tzid": "UTC"
    })
}

pub fn rejected_body(status: &str) -> serde_json::Value {
    json!({ "status": status, "results": "" })
}

pub fn http_client(timeout: Duration) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(timeout, 0).unwrap())
}

pub fn fetcher(server: &MockServer) -> SunDataFetcher {
    fetcher_with(server, 14, CancellationToken::new())
}

pub fn fetcher_with(
    server: &MockServer,
    concurrency: usize,
    cancellation_token: CancellationToken,
) -> SunDataFetcher {
    SunDataFetcher::new(
        http_client(Duration::from_secs(2)),
        format!("{}/json", server.uri()),
        concurrency,
        cancellation_token,
    )
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator<MemoryKvStore>>,
    pub presenter: Arc<RecordingPresenter>,
    pub kv: MemoryKvStore,
    pub network: Arc<NetworkStatus>,
    pub cancellation_token: CancellationToken,
}

pub fn harness(server: &MockServer, kv: MemoryKvStore, online: bool) -> Harness {
    let presenter = Arc::new(RecordingPresenter::default());
    let network = Arc::new(NetworkStatus::new(online));
    let cancellation_token = CancellationToken::new();
    let orchestrator = Arc::new(Orchestrator::new(
        CacheStore::new(kv.clone(), ThemePreference::Light),
        fetcher_with(server, 14, cancellation_token.clone()),
        presenter.clone(),
        network.clone(),
        cancellation_token.clone(),
    ));

    Harness {
        orchestrator,
        presenter,
        kv,
        network,
        cancellation_token,
    }
}

pub fn city(name: &str, lat: f64) -> City {
    City::new(name, lat, -46.5, "America/Sao_Paulo")
}
