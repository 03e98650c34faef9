use chrono::{DateTime, Utc};
use common::models::{City, DataSource, DayRecord, NetworkState, ThemePreference};

/// Message shown when offline with nothing cached for the selected city
pub const NO_OFFLINE_DATA: &str = "Sem internet: nenhum cache salvo para esta cidade.";

/// Capabilities the orchestrator needs from whatever draws the widget.
pub trait Presenter: Send + Sync {
    fn render(
        &self,
        days: &[DayRecord],
        source: DataSource,
        fetched_at: DateTime<Utc>,
        timezone: &str,
    );

    fn show_status(&self, state: NetworkState);

    fn show_error(&self, message: &str);

    fn show_recent(&self, cities: &[City]);

    fn show_location(&self, city: &City);

    fn show_refreshing(&self, city: &City);

    fn show_theme(&self, theme: ThemePreference);
}
