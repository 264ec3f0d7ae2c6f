use std::sync::Arc;

use clap::Parser;

use phrase_pulse::config::FrontendConfig;
use phrase_pulse::logging;
use phrase_pulse::server::{create_router, AppState};
use phrase_pulse::shutdown::wait_for_shutdown;

#[derive(Parser)]
#[command(name = "phrase-frontend", about = "Render random phrases from the phrase backend")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = FrontendConfig::load(cli.config.as_deref())?;

    let _log_guard = logging::init_frontend(&config.log_dir, config.frontend_debug);

    tracing::info!(
        host = %config.frontend_host,
        port = %config.frontend_port,
        api_url = %config.api_url(),
        debug = config.frontend_debug,
        "Starting phrase frontend"
    );

    let listen_addr = config.listen_addr();
    let state = Arc::new(AppState::new(config)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}
