use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use showcase_backend::{
    catalog::{default_shows, DEFAULT_MAX_VIDEOS},
    config::SurfaceConfig,
    router, AppState, BookingRelay, ChatResponder, Config, RelayConfig, ShowCatalog, SmtpMailer,
    StatsAggregator, StatsService, StatsSurface, YouTubeClient,
};

fn surface(youtube: &Arc<YouTubeClient>, config: &SurfaceConfig) -> StatsSurface {
    let aggregator = StatsAggregator::new(youtube.clone(), config.aggregator.clone());
    StatsSurface::new(
        StatsService::new(aggregator, config.channel_ids.clone()),
        config.number_format,
    )
}

fn build_state(config: &Config) -> Result<AppState> {
    let youtube = Arc::new(
        YouTubeClient::new(config.youtube.clone()).context("failed to build YouTube client")?,
    );

    let relay = match config.smtp() {
        Ok(smtp) => {
            let mailer = SmtpMailer::new(smtp).context("failed to build SMTP transport")?;
            Some(BookingRelay::new(
                Arc::new(mailer),
                RelayConfig {
                    from: smtp.username.clone(),
                    operator_address: smtp.operator_address.clone(),
                },
            ))
        }
        Err(e) => {
            warn!(error = %e, "booking relay disabled");
            None
        }
    };

    Ok(AppState {
        hero: surface(&youtube, &config.hero),
        highlights: surface(&youtube, &config.highlights),
        highlight_figures: config.highlight_figures,
        relay,
        chat: ChatResponder::default(),
        catalog: ShowCatalog::new(youtube, default_shows(), DEFAULT_MAX_VIDEOS),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading configuration...");
    let config = Config::from_env()?;
    let state = Arc::new(build_state(&config)?);

    let app = router(state);

    info!("Binding to {}", config.bind_addr);
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Server running on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
