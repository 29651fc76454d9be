use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use seo_auditor::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    info!(
        "Starting server on {} (allowlist enforced: {}, AI recommendations: {})",
        server_addr,
        config.enforce_domain_allowlist,
        config.gpt_enabled()
    );

    // Create application state
    let app_state = AppState::from_config(config)?;

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
