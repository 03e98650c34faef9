use common::errors::AppError;
use common::models::{CacheEntry, City, ThemePreference};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

const CACHE_KEY_PREFIX: &str = "sunCache:";
const RECENT_KEY: &str = "sunRecent";
const THEME_KEY: &str = "sunTheme";

pub const MAX_RECENT: usize = 5;

/// Key-value string storage, the local-storage analog.
pub trait KvStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), AppError>> + Send;
}

/// In-process store with an optional byte quota over all values.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        let mut values = self.values.write().await;
        if let Some(quota) = self.quota_bytes {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(AppError::persistence(format!(
                    "Quota of {} bytes exceeded writing {}",
                    quota, key
                )));
            }
        }
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Move `city` to the front, drop same-named entries, keep at most five.
pub fn push_recent(mut recent: Vec<City>, city: &City) -> Vec<City> {
    recent.retain(|c| !c.same_identity(city));
    recent.insert(0, city.clone());
    recent.truncate(MAX_RECENT);
    recent
}

/// Typed repository over a [`KvStore`].
///
/// Cache entries live under one key per city name, so writes for different
/// cities never overwrite each other. Processes sharing one backing store are
/// last-write-wins.
pub struct CacheStore<S> {
    kv: S,
    default_theme: ThemePreference,
}

impl<S: KvStore> CacheStore<S> {
    pub fn new(kv: S, default_theme: ThemePreference) -> Self {
        Self { kv, default_theme }
    }

    pub fn cache_key(city_name: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, city_name)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, city_name: &str) -> Result<Option<CacheEntry>, AppError> {
        let key = Self::cache_key(city_name);
        let raw = self.kv.get(&key).await?;
        Ok(raw.and_then(|raw| decode(&key, &raw)))
    }

    #[instrument(skip(self, entry), fields(days = entry.days.len()))]
    pub async fn put(&self, city_name: &str, entry: &CacheEntry) -> Result<(), AppError> {
        self.write(&Self::cache_key(city_name), entry).await?;
        debug!(city = %city_name, "Cache entry written");
        Ok(())
    }

    pub async fn list_recent(&self) -> Result<Vec<City>, AppError> {
        let raw = self.kv.get(RECENT_KEY).await?;
        let mut recent: Vec<City> = raw
            .and_then(|raw| decode(RECENT_KEY, &raw))
            .unwrap_or_default();
        recent.truncate(MAX_RECENT);
        Ok(recent)
    }

    /// Records a selection and returns the updated list
    pub async fn record_recent(&self, city: &City) -> Result<Vec<City>, AppError> {
        let recent = push_recent(self.list_recent().await?, city);
        self.write(RECENT_KEY, &recent).await?;
        Ok(recent)
    }

    pub async fn get_theme(&self) -> Result<ThemePreference, AppError> {
        let raw = self.kv.get(THEME_KEY).await?;
        Ok(raw
            .and_then(|raw| ThemePreference::parse(&raw))
            .unwrap_or(self.default_theme))
    }

    pub async fn set_theme(&self, theme: ThemePreference) -> Result<(), AppError> {
        self.kv.set(THEME_KEY, theme.as_str().to_string()).await
    }

    pub async fn toggle_theme(&self) -> Result<ThemePreference, AppError> {
        let theme = self.get_theme().await?.toggled();
        self.set_theme(theme).await?;
        Ok(theme)
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, raw).await
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding unreadable stored value");
            None
        }
    }
}
