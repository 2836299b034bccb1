use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sign_server::board::SignBoard;
use sign_server::cache::CacheConfig;
use sign_server::config::SignConfig;
use sign_server::feed::{FeedBackend, FeedClientConfig, HttpFeedSource, MockFeedSource};
use sign_server::stations::StationIndex;
use sign_server::web::{AppState, create_router};

/// Default config file path.
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default GTFS stops table path.
const DEFAULT_STOPS_PATH: &str = "data/stops.txt";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sign_server=info,tower_http=info")),
        )
        .init();

    let config_path =
        std::env::var("SIGN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = SignConfig::load(&config_path)?;

    // Feed source: JSON fixtures if asked for, otherwise the live feeds
    let backend = match std::env::var("SIGN_MOCK_FEEDS") {
        Ok(dir) => {
            warn!(dir = %dir, "Serving feeds from mock fixtures");
            FeedBackend::Mock(MockFeedSource::new(dir))
        }
        Err(_) => {
            let mut client_config =
                FeedClientConfig::new().with_timeout(config.cache.fetch_timeout_secs);
            if let Ok(key) = std::env::var("SIGN_FEED_API_KEY") {
                client_config = client_config.with_api_key(key);
            }
            FeedBackend::Http(HttpFeedSource::new(client_config)?)
        }
    };

    // Station names load on first use; force it now so a missing table is
    // reported at startup
    let stops_path =
        std::env::var("SIGN_STOPS_FILE").unwrap_or_else(|_| DEFAULT_STOPS_PATH.to_string());
    let stations = StationIndex::new(stops_path);
    if stations.is_empty() {
        warn!(
            "Download stops.txt from http://web.mta.info/developers/data/nyct/subway/google_transit.zip"
        );
    }

    let cache_config = CacheConfig {
        ttl: config.cache.ttl(),
    };
    let board = SignBoard::new(config, backend, stations, &cache_config)?;

    let config = board.config();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("NYC Subway Sign API listening on http://{addr}");
    info!("Direction: {}", config.direction.describe());
    for (key, row) in &config.layout {
        info!(
            "{key}: {} from {}",
            row.lines.join(", "),
            board.station_name(&row.station)
        );
    }
    info!("API Endpoints:");
    for (path, description) in sign_server::web::ENDPOINTS {
        info!("  GET {path:<28} - {description}");
    }

    let app = create_router(AppState::new(board));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
