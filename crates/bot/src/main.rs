//! Subbot binary entrypoint.

use tower_http::trace::TraceLayer;

use subbot_bot::bridge::BridgeClient;
use subbot_bot::reconnect::Backoff;
use subbot_bot::runner::run_event_loop;
use subbot_bot::webhook::{WebhookState, create_router};
use subbot_common::config::AppConfig;
use subbot_ledger::{JsonFileStore, NotificationLedger};
use subbot_notifier::MembershipNotifier;

/// Bridge events buffered while the notifier is busy sending.
const EVENT_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "subbot=info,subbot_bot=info,subbot_notifier=info,subbot_ledger=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Subbot starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    let ledger = NotificationLedger::load(JsonFileStore::new(&config.ledger_path));
    let bridge = BridgeClient::from_config(&config)?;
    let backoff = Backoff::from_config(&config);

    let mut notifier = MembershipNotifier::new(bridge.clone(), ledger, config.group_id.clone());

    // Webhook ingress feeding the single notifier task
    let (tx, rx) = tokio::sync::mpsc::channel(EVENT_QUEUE_CAPACITY);
    let app = create_router(WebhookState::new(tx, config.webhook_secret.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.webhook_addr).await?;
    tracing::info!(addr = %config.webhook_addr, "Webhook listening");

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tracing::info!(group_id = %config.group_id, "Notifier started");

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = run_event_loop(&mut notifier, &bridge, &backoff, rx) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Notifier exited with error");
                return Err(e.into());
            }
        }
        result = server => {
            match result {
                Ok(Ok(())) => tracing::warn!("Webhook server stopped"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Webhook server failed");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!(welcomed = notifier.ledger().len(), "Subbot stopped.");
    Ok(())
}
