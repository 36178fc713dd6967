use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bus_server::config::{ServerConfig, StoreSource};
use bus_server::seatmap::{SeatMapSessions, SessionConfig};
use bus_server::stations::StationNames;
use bus_server::store::{BookingStore, CacheConfig, CachedStore, MockStore, RestStore, StoreConfig};
use bus_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bus_server=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let store: Arc<dyn BookingStore> = match &config.store {
        StoreSource::Mock { data_dir } => {
            info!(?data_dir, "using mock store");
            Arc::new(MockStore::from_dir(data_dir)?)
        }
        StoreSource::Remote { url, key } => {
            if key.is_empty() {
                warn!("BUS_STORE_KEY not set, data API calls will likely fail");
            }
            info!(%url, "using hosted data API");
            Arc::new(RestStore::new(StoreConfig::new(url, key))?)
        }
    };

    let cached = CachedStore::new(store.clone(), &CacheConfig::default());

    let station_names = StationNames::load(store).await;
    info!(stations = station_names.len().await, "loaded station names");

    // Refresh station names in the background
    let station_names_refresh = station_names.clone();
    let refresh_interval = config.station_refresh;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match station_names_refresh.refresh().await {
                Ok(count) => info!(stations = count, "refreshed station names"),
                Err(e) => warn!(error = %e, "failed to refresh station names"),
            }
        }
    });

    let sessions = SeatMapSessions::new(&SessionConfig::default());
    let state = AppState::new(cached, sessions, station_names);

    let static_dir = config.static_dir.to_string_lossy().into_owned();
    let app = create_router(state, &static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("bus storefront listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
