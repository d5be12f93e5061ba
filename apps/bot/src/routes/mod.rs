pub mod health;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// `/health` only; used in polling mode.
pub fn build_router() -> Router {
    Router::new().route("/health", get(health::health_handler))
}

/// `/health` plus the Telegram webhook receiver.
pub fn build_webhook_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/telegram/webhook", post(webhook::webhook_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{app_state, RecordingPlatform, StubCompletion};

    const UPDATE: &str = r#"{"update_id":9,"message":{"message_id":3,"chat":{"id":5},"text":"/start"}}"#;

    fn webhook_state(secret: Option<&str>) -> (AppState, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::default());
        let (mut state, _alerts) =
            app_state(platform.clone(), Arc::new(StubCompletion::replying("")), 5);
        state.webhook_secret = secret.map(str::to_string);
        (state, platform)
    }

    fn post_update(secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/telegram/webhook")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(webhook::SECRET_HEADER, secret);
        }
        builder.body(Body::from(UPDATE)).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = build_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "coverbot");
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_secret() {
        let (state, platform) = webhook_state(Some("s3cret"));
        let app = build_webhook_router(state);

        let response = app.clone().oneshot(post_update(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = app.oneshot(post_update(Some("guess"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        tokio::task::yield_now().await;
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_accepts_and_dispatches() {
        let (state, platform) = webhook_state(Some("s3cret"));
        let response = build_webhook_router(state)
            .oneshot(post_update(Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The update is handled on a spawned task.
        for _ in 0..10 {
            if !platform.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(platform.sent()[0].chat_id, 5);
    }

    #[tokio::test]
    async fn test_webhook_without_configured_secret_accepts_all() {
        let (state, _) = webhook_state(None);
        let response = build_webhook_router(state)
            .oneshot(post_update(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
