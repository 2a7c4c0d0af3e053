//! HTTP proxy in front of the OpenWeatherMap API.
//!
//! Two read-only routes, `/weather` and `/forecast`, forward a `city` query
//! parameter upstream with the secret API key attached and relay the answer.

pub mod error;
pub mod routes;

use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use weather_core::{ServerSettings, provider::source_from_settings};

use crate::routes::{AppState, create_router};

pub use error::ProxyError;

pub async fn serve(settings: ServerSettings) -> Result<()> {
    debug!(upstream = %settings.upstream_url, lang = %settings.lang, "resolved settings");

    let state = AppState { source: source_from_settings(&settings) };

    let static_dir = if settings.static_dir.is_dir() {
        info!("Serving static assets from {}", settings.static_dir.display());
        Some(settings.static_dir.as_path())
    } else {
        warn!("Static directory {} not found, serving API only", settings.static_dir.display());
        None
    };
    let app = create_router(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Server is running on http://localhost:{}", settings.port);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
