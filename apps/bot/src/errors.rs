use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::telegram::TelegramError;

/// Errors that can escape an update handler or an HTTP route.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, BotError>`.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            BotError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid webhook secret".to_string(),
            ),
            BotError::Telegram(e) => {
                tracing::error!("Telegram error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TELEGRAM_ERROR",
                    "A chat platform error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
