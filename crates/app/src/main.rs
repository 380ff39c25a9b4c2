//! Transfer service entry point.

use app::Config;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?config, "starting transfer service");

    let mut context = app::wire(&config);

    // Surface fatally-failed deliveries; nothing consumes them further.
    let failures = async {
        while let Some(envelope) = context.failed_deliveries.recv().await {
            tracing::error!(
                event_type = %envelope.event_type,
                aggregate_id = %envelope.aggregate_id,
                "entry delivery failed fatally"
            );
        }
    };

    tokio::select! {
        () = shutdown_signal() => {}
        () = failures => {}
    }

    context.shutdown().await;
    tracing::info!("transfer service shut down gracefully");
}
