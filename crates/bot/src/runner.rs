//! Event loop that owns the notifier.

use tokio::sync::mpsc;

use subbot_common::error::AppError;
use subbot_common::types::GroupEvent;
use subbot_notifier::{GroupClient, MembershipNotifier};

use crate::reconnect::{Backoff, SessionProbe, await_session};

/// Drive `notifier` from the event queue until it closes.
///
/// Waits for the session and runs a full roster pass on start and after
/// every `ConnectionClosed`. Fails only when a reconnect gives up.
pub async fn run_event_loop<C, P>(
    notifier: &mut MembershipNotifier<C>,
    probe: &P,
    backoff: &Backoff,
    mut events: mpsc::Receiver<GroupEvent>,
) -> Result<(), AppError>
where
    C: GroupClient,
    P: SessionProbe + ?Sized,
{
    connect_and_sweep(notifier, probe, backoff).await?;

    while let Some(event) = events.recv().await {
        tracing::debug!(event = %event, "Handling event");
        match event {
            GroupEvent::ConnectionClosed { reason } => {
                tracing::warn!(reason = %reason, "Connection closed, reconnecting");
                connect_and_sweep(notifier, probe, backoff).await?;
            }
            other => {
                notifier.handle_event(other).await;
            }
        }
    }

    tracing::info!("Event queue closed, notifier stopping");
    Ok(())
}

async fn connect_and_sweep<C, P>(
    notifier: &mut MembershipNotifier<C>,
    probe: &P,
    backoff: &Backoff,
) -> Result<(), AppError>
where
    C: GroupClient,
    P: SessionProbe + ?Sized,
{
    await_session(probe, backoff).await?;
    let group_id = notifier.group_id().clone();
    notifier.notify_all_current_members(&group_id).await;
    Ok(())
}
