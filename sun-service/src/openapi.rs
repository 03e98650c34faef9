use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{CacheEntry, City, DataSource, DayRecord, NetworkState, ThemePreference};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::search_cities,
        handlers::select_city,
        handlers::refresh,
        handlers::get_view,
        handlers::get_recent,
        handlers::get_theme,
        handlers::toggle_theme,
        handlers::set_connectivity,
    ),
    components(schemas(
        City,
        DayRecord,
        CacheEntry,
        DataSource,
        NetworkState,
        ThemePreference,
        crate::geocoder::Suggestion,
        crate::view::ViewSnapshot,
        crate::view::DayRow,
        crate::view::ChartSeries,
        crate::orchestrator::SelectOutcome,
        crate::orchestrator::RefreshOutcome,
        handlers::SearchResponse,
        handlers::SelectResponse,
        handlers::RefreshResponse,
        handlers::ThemeResponse,
        handlers::ConnectivityRequest,
    )),
    tags(
        (name = "cities", description = "City search, selection and recent list"),
        (name = "sun", description = "Sunrise/sunset window and widget state"),
        (name = "preferences", description = "Theme preference"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
