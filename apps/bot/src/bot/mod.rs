//! Telegram update handling.
//!
//! Every update runs on its own task; errors are logged here and never cross
//! the update boundary.

pub mod handlers;
pub mod messages;
pub mod polling;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::state::AppState;
use crate::telegram::Update;

pub async fn handle_update(state: AppState, update: Update) {
    let update_id = update.update_id;
    let Some(message) = update.message else {
        debug!(update_id, "Ignoring update without a message");
        return;
    };

    if let Err(e) = handlers::handle_message(&state, message).await {
        error!(update_id, "Failed to handle update: {e}");
    }
}

pub fn spawn_update(state: AppState, update: Update) -> JoinHandle<()> {
    tokio::spawn(handle_update(state, update))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::telegram::types::{Chat, Message};
    use crate::test_support::{app_state, RecordingPlatform, StubCompletion};

    fn help_update(update_id: i64) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id: 1,
                chat: Chat { id: 5 },
                from: None,
                text: Some("/help".to_string()),
                document: None,
                photo: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_update_without_message_is_ignored() {
        let platform = Arc::new(RecordingPlatform::default());
        let (state, _alerts) = app_state(platform.clone(), Arc::new(StubCompletion::replying("")), 5);
        handle_update(
            state,
            Update {
                update_id: 1,
                message: None,
            },
        )
        .await;
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_update_is_answered() {
        let platform = Arc::new(RecordingPlatform::default());
        let (state, _alerts) = app_state(platform.clone(), Arc::new(StubCompletion::replying("")), 5);
        spawn_update(state, help_update(2)).await.unwrap();
        assert_eq!(platform.sent()[0].text, messages::HELP);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_escape() {
        let platform = Arc::new(RecordingPlatform::failing_sends());
        let (state, _alerts) = app_state(platform, Arc::new(StubCompletion::replying("")), 5);
        // A send failure is logged; the task still completes normally.
        assert!(spawn_update(state, help_update(3)).await.is_ok());
    }
}
