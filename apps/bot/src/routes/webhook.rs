use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use tracing::warn;

use crate::bot::spawn_update;
use crate::errors::BotError;
use crate::state::AppState;
use crate::telegram::Update;

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// POST /telegram/webhook
///
/// Acknowledges immediately; the update is handled on its own task.
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<StatusCode, BotError> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let presented = headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            warn!(update_id = update.update_id, "Rejected webhook call with a bad secret");
            return Err(BotError::Unauthorized);
        }
    }

    spawn_update(state, update);
    Ok(StatusCode::OK)
}
