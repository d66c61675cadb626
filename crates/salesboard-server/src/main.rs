use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use salesboard_server::app::build_router;
use salesboard_server::config::Settings;
use salesboard_server::state::AppState;
use salesboard_server::utils::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logger()?;

    info!("🚀 Starting sales dashboard server...");

    let settings = Settings::load()?;
    info!("✅ Configuration loaded (CRM at {})", settings.crm.base_url);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let state = AppState::new(settings).await?;
    let app = build_router(state);

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
