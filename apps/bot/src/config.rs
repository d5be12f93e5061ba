use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// How updates reach the bot.
#[derive(Debug, Clone, PartialEq)]
pub enum BotMode {
    /// Long-poll `getUpdates`.
    Polling,
    /// Telegram pushes updates to `POST /telegram/webhook`.
    Webhook {
        url: String,
        secret: Option<String>,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if the bot token, the OpenAI key or the operator id are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub openai_api_key: String,
    pub admin_id: i64,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,
    pub openai_timeout: Duration,
    pub openai_api_base: String,
    pub telegram_api_base: String,
    pub max_file_size: u64,
    pub max_resume_length: usize,
    pub min_resume_length: usize,
    pub max_pdf_pages: usize,
    pub max_requests_per_minute: usize,
    pub prompt_path: String,
    pub mode: BotMode,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: f64 = parse_or(&lookup, "OPENAI_TIMEOUT", 30.0)?;
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            bail!("OPENAI_TIMEOUT must be a positive number of seconds");
        }

        let mode = match lookup("BOT_MODE").as_deref().unwrap_or("polling") {
            "polling" => BotMode::Polling,
            "webhook" => BotMode::Webhook {
                url: require(&lookup, "WEBHOOK_URL")?,
                secret: lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            },
            other => bail!("BOT_MODE must be 'polling' or 'webhook', got '{other}'"),
        };

        Ok(Config {
            bot_token: require(&lookup, "BOT_TOKEN")?,
            openai_api_key: require(&lookup, "CHATGPT_TOKEN")?,
            admin_id: require(&lookup, "ADMIN_ID")?
                .parse()
                .context("ADMIN_ID must be a numeric chat id")?,
            openai_model: lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_temperature: parse_or(&lookup, "OPENAI_TEMPERATURE", 0.7)?,
            openai_max_tokens: parse_or(&lookup, "OPENAI_MAX_TOKENS", 1000)?,
            openai_timeout: Duration::from_secs_f64(timeout_secs),
            openai_api_base: lookup("OPENAI_API_BASE")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            telegram_api_base: lookup("TELEGRAM_API_BASE")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),
            max_file_size: parse_or(&lookup, "MAX_FILE_SIZE", 10 * 1024 * 1024)?,
            max_resume_length: parse_or(&lookup, "MAX_RESUME_LENGTH", 50_000)?,
            min_resume_length: parse_or(&lookup, "MIN_RESUME_LENGTH", 50)?,
            max_pdf_pages: parse_or(&lookup, "MAX_PDF_PAGES", 50)?,
            max_requests_per_minute: parse_or(&lookup, "MAX_REQUESTS_PER_MINUTE", 5)?,
            prompt_path: lookup("PROMPT_PATH").unwrap_or_else(|| "prompt.txt".to_string()),
            mode,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
