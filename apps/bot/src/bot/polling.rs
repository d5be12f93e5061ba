use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::bot::spawn_update;
use crate::state::AppState;
use crate::telegram::{TelegramClient, Update};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls `getUpdates` forever. Only returns if the webhook cannot be cleared.
pub async fn run_polling(client: TelegramClient, state: AppState) -> Result<()> {
    client
        .delete_webhook()
        .await
        .context("Failed to delete webhook before polling")?;
    info!("Polling for updates");

    let mut offset = 0;
    loop {
        match client.get_updates(offset).await {
            Ok(updates) => {
                offset = next_offset(offset, &updates);
                for update in updates {
                    spawn_update(state.clone(), update);
                }
            }
            Err(e) => {
                warn!("getUpdates failed, retrying in {}s: {e}", RETRY_DELAY.as_secs());
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

/// Acknowledges everything up to the newest update in the batch.
fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}
