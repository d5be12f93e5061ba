mod bot;
mod config;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod notify;
mod rate_limit;
mod routes;
mod state;
mod telegram;
#[cfg(test)]
mod test_support;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bot::polling::run_polling;
use crate::config::{BotMode, Config};
use crate::extraction::{ExtractionLimits, FileExtractor};
use crate::generation::prompts::load_system_prompt;
use crate::generation::CoverLetterGenerator;
use crate::llm_client::{CompletionSettings, LlmClient};
use crate::notify::{deliver_now, AlertCategory, Notification, NotificationWorker, Notifier, QUEUE_CAPACITY};
use crate::rate_limit::{RateLimiter, CLEANUP_INTERVAL};
use crate::routes::{build_router, build_webhook_router};
use crate::state::AppState;
use crate::telegram::{ChatPlatform, TelegramClient};
use crate::validation::ResumeLimits;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing BOT_TOKEN / CHATGPT_TOKEN / ADMIN_ID stop us here
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting coverbot v{}", env!("CARGO_PKG_VERSION"));

    let telegram = TelegramClient::new(&config.telegram_api_base, config.bot_token.clone())?;
    let platform: Arc<dyn ChatPlatform> = Arc::new(telegram.clone());

    if let Err(e) = run(&config, telegram, platform.clone()).await {
        error!("Bot stopped with an error: {e:#}");
        let alert = Notification::new(AlertCategory::StartupFailed, &format!("{e:#}"), None);
        deliver_now(platform.as_ref(), config.admin_id, &alert).await;
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn run(config: &Config, telegram: TelegramClient, platform: Arc<dyn ChatPlatform>) -> Result<()> {
    let system_prompt = load_system_prompt(Path::new(&config.prompt_path)).await;

    // Initialize LLM client
    let llm = LlmClient::new(CompletionSettings {
        api_base: config.openai_api_base.clone(),
        api_key: config.openai_api_key.clone(),
        model: config.openai_model.clone(),
        temperature: config.openai_temperature,
        max_tokens: config.openai_max_tokens,
        timeout: config.openai_timeout,
    })?;
    info!("LLM client initialized (model: {})", llm.model());

    // Operator alerts drain in the background
    let (notifier, alerts) = Notifier::channel(QUEUE_CAPACITY);
    tokio::spawn(NotificationWorker::new(alerts, platform.clone(), config.admin_id).run());

    let limits = ResumeLimits {
        min_length: config.min_resume_length,
        max_length: config.max_resume_length,
    };
    let extraction_limits = ExtractionLimits {
        max_file_size: config.max_file_size,
        max_pdf_pages: config.max_pdf_pages,
    };
    let generator = CoverLetterGenerator::new(Arc::new(llm), system_prompt, limits, notifier.clone());

    let webhook_secret = match &config.mode {
        BotMode::Webhook { secret, .. } => secret.clone(),
        BotMode::Polling => None,
    };

    let limiter = Arc::new(RateLimiter::per_minute(config.max_requests_per_minute));
    let sweeper = Arc::clone(&limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await; // first tick completes immediately
        loop {
            interval.tick().await;
            sweeper.cleanup_expired();
        }
    });

    let state = AppState {
        platform,
        generator: Arc::new(generator),
        extractor: FileExtractor::new(extraction_limits, notifier.clone()),
        limiter,
        notifier,
        limits,
        webhook_secret,
    };

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    match &config.mode {
        BotMode::Polling => {
            let app = build_router().layer(TraceLayer::new_for_http());
            let server = async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
            };
            // The health server owns the Ctrl-C handler; polling stops with it.
            tokio::select! {
                res = run_polling(telegram, state) => res?,
                res = server => res?,
            }
        }
        BotMode::Webhook { url, secret } => {
            telegram
                .set_webhook(url, secret.as_deref())
                .await
                .context("Failed to register webhook")?;
            info!("Webhook registered at {url}");

            let app = build_webhook_router(state).layer(TraceLayer::new_for_http());
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
