use common::http_client::HttpClient;
use common::tracing::{init_tracing, init_tracing_pretty};
use std::net::SocketAddr;
use std::sync::Arc;
use sun_service::assets::OfflineAssetStore;
use sun_service::config::Config;
use sun_service::db::{self, SqliteKvStore};
use sun_service::fetcher::SunDataFetcher;
use sun_service::geocoder::{CitySearch, GeocodingClient};
use sun_service::handlers::AppState;
use sun_service::network::NetworkStatus;
use sun_service::orchestrator::Orchestrator;
use sun_service::store::CacheStore;
use sun_service::view::ViewState;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => init_tracing(),
        _ => init_tracing_pretty(),
    }

    let config = Config::from_env();
    let cancellation_token = CancellationToken::new();

    let pool = db::create_pool(&config.database_url).await?;
    let store = CacheStore::new(SqliteKvStore::new(pool), config.default_theme);

    let http_client = Arc::new(HttpClient::new(
        config.request_timeout(),
        config.max_retries,
    )?);
    info!(timeout = ?http_client.timeout(), retries = config.max_retries, "HTTP client ready");
    let fetcher = SunDataFetcher::new(
        http_client.clone(),
        config.sunrise_api_url.clone(),
        config.fetch_concurrency,
        cancellation_token.child_token(),
    );
    let geocoder = Arc::new(GeocodingClient::new(
        http_client,
        config.geocoding_api_url.clone(),
        config.geo_language.clone(),
        config.country_code.clone(),
        config.default_timezone,
    ));
    let search = Arc::new(CitySearch::new(geocoder, config.search_debounce()));

    let network = Arc::new(NetworkStatus::new(config.start_online));
    let view = Arc::new(ViewState::new(
        network.state(),
        config.default_theme,
        config.default_timezone,
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        store,
        fetcher,
        view.clone(),
        network,
        cancellation_token.clone(),
    ));

    let assets = Arc::new(OfflineAssetStore::new(
        config.asset_dir.clone(),
        config.asset_version.clone(),
    ));
    match assets.install().await {
        Ok(count) => {
            let removed = assets.activate().await;
            info!(count, removed = removed.len(), version = %assets.current_version(), "Offline assets ready");
        }
        Err(e) => warn!(error = %e, "Asset snapshot failed, serving from disk only"),
    }

    {
        let orchestrator = orchestrator.clone();
        let default_city = config.default_city();
        tokio::spawn(
            async move {
                let outcome = orchestrator.startup(default_city).await;
                info!(?outcome, "Startup selection finished");
            }
            .in_current_span(),
        );
    }

    let state = AppState {
        orchestrator,
        search,
        view,
        assets,
    };

    let app = sun_service::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Sun service starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation_token))
        .await?;

    info!("Sun service stopped");
    Ok(())
}

async fn shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Abort refreshes still waiting on the network
    cancellation_token.cancel();
    warn!("Cancelled in-flight refreshes, shutting down gracefully...");
}
