pub mod api;
pub mod config;
pub mod error;
pub mod inbox;
pub mod logging;
pub mod notifications;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::api::client::AlertsClient;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::inbox::{AlertInbox, AlertsBus};
use crate::notifications::{DesktopNotifier, Notifier};

/// Wire the agent and run until Ctrl-C.
///
/// One fetch happens immediately on startup; afterwards the inbox
/// refreshes whenever something publishes on the change bus. There is no
/// timer-driven polling.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        api = %config.api_base_url,
        "Starting bankwatch v{}",
        env!("CARGO_PKG_VERSION")
    );

    let api = Arc::new(AlertsClient::from_config(&config));
    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier::new(&config));
    let bus = AlertsBus::new();
    let inbox = Arc::new(AlertInbox::new(api, notifier, bus.clone()));

    let mut changes = bus.subscribe();
    inbox.refresh().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            signal = changes.recv() => match signal {
                Ok(_) => inbox.refresh().await,
                Err(RecvError::Lagged(missed)) => {
                    // Signals are redundant refresh hints; one catch-up
                    // fetch covers everything that was missed.
                    tracing::warn!(missed, "Change bus lagged, refreshing once");
                    inbox.refresh().await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}
