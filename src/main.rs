use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::{error, info};

use tessera::metrics::init_metrics;
use tessera::router::init_router;
use tessera::state::{Settings, init_app_state};
use tessera_observability::{LoggingConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _log_guard = init_logging(&LoggingConfig::from_env())?;

    let settings = match Settings::from_env().and_then(|s| s.validate().map(|()| s)) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let metrics_handle = init_metrics(settings.server.metrics_enabled)?;
    let port = settings.server.port;

    let state = init_app_state(settings, metrics_handle).await?;
    let app = init_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server running");
    info!("Swagger UI available at http://localhost:{port}/swagger-ui");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
