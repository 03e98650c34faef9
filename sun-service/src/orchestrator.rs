use chrono::Utc;
use common::errors::AppError;
use common::models::{CacheEntry, City, DataSource, ThemePreference};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::fetcher::SunDataFetcher;
use crate::network::NetworkStatus;
use crate::presenter::{NO_OFFLINE_DATA, Presenter};
use crate::store::{CacheStore, KvStore, push_recent};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    Refreshed(RefreshOutcome),
    RefreshFailed(String),
    /// Offline, showing the cached entry
    CachedOnly,
    NoOfflineData,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Cache written and the new days rendered
    Applied { days: usize, missing: usize },
    /// Cache written, but the user has since selected another city
    StoredInBackground { days: usize },
    /// A later refresh for the same city finished first
    Superseded,
}

/// Owns the selection state and drives select → cache → fetch → cache → render.
///
/// Every refresh takes a sequence number when it starts. Writes for one city
/// go through that city's guard, which remembers the last applied sequence:
/// a result older than what is already stored is dropped. A result is
/// rendered only while its city is still the current selection.
pub struct Orchestrator<S> {
    store: CacheStore<S>,
    fetcher: SunDataFetcher,
    presenter: Arc<dyn Presenter>,
    network: Arc<NetworkStatus>,
    current: Mutex<Option<City>>,
    writers: Mutex<HashMap<String, Arc<Mutex<Option<u64>>>>>,
    refresh_seq: AtomicU64,
    cancellation_token: CancellationToken,
}

impl<S: KvStore> Orchestrator<S> {
    pub fn new(
        store: CacheStore<S>,
        fetcher: SunDataFetcher,
        presenter: Arc<dyn Presenter>,
        network: Arc<NetworkStatus>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            fetcher,
            presenter,
            network,
            current: Mutex::new(None),
            writers: Mutex::new(HashMap::new()),
            refresh_seq: AtomicU64::new(0),
            cancellation_token,
        }
    }

    pub fn store(&self) -> &CacheStore<S> {
        &self.store
    }

    pub async fn current_city(&self) -> Option<City> {
        self.current.lock().await.clone()
    }

    /// Pushes persisted state to the presenter and selects the start city.
    pub async fn startup(&self, default_city: City) -> SelectOutcome {
        self.presenter.show_status(self.network.state());

        match self.store.get_theme().await {
            Ok(theme) => self.presenter.show_theme(theme),
            Err(e) => warn!(error = %e, "Could not read theme preference"),
        }

        match self.store.list_recent().await {
            Ok(recent) => self.presenter.show_recent(&recent),
            Err(e) => warn!(error = %e, "Could not read recent cities"),
        }

        self.select_city(default_city).await
    }

    #[instrument(skip(self, city), fields(city = %city.name))]
    pub async fn select_city(&self, city: City) -> SelectOutcome {
        *self.current.lock().await = Some(city.clone());
        self.presenter.show_location(&city);
        self.record_recent(&city).await;

        let cached = match self.store.get(&city.name).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as empty");
                None
            }
        };

        if let Some(entry) = &cached {
            debug!(days = entry.days.len(), "Rendering cached days");
            self.presenter.render(
                &entry.days,
                DataSource::Cache,
                entry.fetched_at(),
                &city.tz,
            );
        }

        if self.network.is_online() {
            return match self.refresh().await {
                Ok(outcome) => SelectOutcome::Refreshed(outcome),
                Err(e) => SelectOutcome::RefreshFailed(e.to_string()),
            };
        }

        if cached.is_some() {
            info!("Offline, showing cached days");
            SelectOutcome::CachedOnly
        } else {
            warn!("Offline with no cached data");
            self.presenter.show_error(NO_OFFLINE_DATA);
            SelectOutcome::NoOfflineData
        }
    }

    /// Refetches the current city's window. On total failure the stored
    /// entry is left as it was.
    pub async fn refresh(&self) -> Result<RefreshOutcome, AppError> {
        let city = self
            .current_city()
            .await
            .ok_or_else(|| AppError::validation("No city selected"))?;
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.refresh_city(city, seq).await
    }

    #[instrument(skip(self, city), fields(city = %city.name))]
    async fn refresh_city(&self, city: City, seq: u64) -> Result<RefreshOutcome, AppError> {
        self.presenter.show_refreshing(&city);

        let fetched = tokio::select! {
            result = self.fetcher.fetch_fourteen_days(city.lat, city.lon) => result,
            _ = self.cancellation_token.cancelled() => {
                Err(AppError::internal("Refresh cancelled by shutdown"))
            }
        };

        let window = match fetched {
            Ok(window) => window,
            Err(e) => {
                warn!(error = %e, "Refresh failed, keeping cached entry");
                if self.is_current(&city).await {
                    self.presenter
                        .show_error(&format!("Falha na atualização: {}", e));
                }
                return Err(e);
            }
        };

        // Held until the render below: the write and the render of one
        // refresh must not interleave with another refresh of this city.
        let writer = self.writer_for(&city.name).await;
        let mut last_applied = writer.lock().await;
        if last_applied.is_some_and(|applied| applied > seq) {
            info!(applied = ?*last_applied, "Discarding result of older refresh");
            return Ok(RefreshOutcome::Superseded);
        }

        let entry = CacheEntry::new(&city, window, Utc::now());
        if let Err(e) = self.store.put(&city.name, &entry).await {
            warn!(error = %e, "Cache write failed, continuing without durability");
        }
        *last_applied = Some(seq);

        let days = entry.days.len();
        if !self.is_current(&city).await {
            info!(days, "City no longer selected, result cached only");
            return Ok(RefreshOutcome::StoredInBackground { days });
        }

        self.presenter.render(
            &entry.days,
            DataSource::Updated,
            entry.fetched_at(),
            &city.tz,
        );

        Ok(RefreshOutcome::Applied {
            days,
            missing: entry.missing_dates.len(),
        })
    }

    pub fn set_online(&self, online: bool) {
        if self.network.set_online(online) {
            self.presenter.show_status(self.network.state());
        }
    }

    pub async fn toggle_theme(&self) -> Result<ThemePreference, AppError> {
        let theme = self.store.toggle_theme().await?;
        self.presenter.show_theme(theme);
        Ok(theme)
    }

    async fn record_recent(&self, city: &City) {
        let recent = match self.store.record_recent(city).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(error = %e, "Could not persist recent cities");
                push_recent(self.store.list_recent().await.unwrap_or_default(), city)
            }
        };
        self.presenter.show_recent(&recent);
    }

    async fn is_current(&self, city: &City) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|current| current.same_identity(city))
    }

    async fn writer_for(&self, city_name: &str) -> Arc<Mutex<Option<u64>>> {
        self.writers
            .lock()
            .await
            .entry(city_name.to_string())
            .or_default()
            .clone()
    }
}
