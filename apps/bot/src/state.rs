use std::sync::Arc;

use crate::extraction::FileExtractor;
use crate::generation::CoverLetterGenerator;
use crate::notify::Notifier;
use crate::rate_limit::RateLimiter;
use crate::telegram::ChatPlatform;
use crate::validation::ResumeLimits;

/// Shared application state handed to every update handler and HTTP route.
#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<dyn ChatPlatform>,
    pub generator: Arc<CoverLetterGenerator>,
    pub extractor: FileExtractor,
    /// The only mutable state shared across concurrent updates.
    pub limiter: Arc<RateLimiter>,
    pub notifier: Notifier,
    pub limits: ResumeLimits,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` in webhook mode.
    pub webhook_secret: Option<String>,
}
