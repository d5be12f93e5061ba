//! Operator alerts.
//!
//! Handlers call [`Notifier::notify`], which only enqueues. A single
//! [`NotificationWorker`] drains the queue and forwards each alert to the
//! operator chat. Nothing on this path can fail the request that raised it.
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

use crate::telegram::{ChatPlatform, ParseMode};

pub const QUEUE_CAPACITY: usize = 64;

/// Alert text is cut to this many characters before formatting.
pub const MAX_ALERT_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCategory {
    ProviderRateLimit,
    ProviderConnection,
    ProviderTimeout,
    RegionBlocked,
    PermissionDenied,
    ProviderApi,
    Authentication,
    UnexpectedError,
    MissingPrompt,
    FileSizeExceeded,
    PdfTooLarge,
    PdfProcessing,
    DocxProcessing,
    FileProcessing,
    MessageProcessing,
    StartupFailed,
}

impl AlertCategory {
    pub fn severity(self) -> Severity {
        use AlertCategory::*;
        match self {
            ProviderRateLimit | ProviderConnection | ProviderTimeout | RegionBlocked
            | PermissionDenied | ProviderApi | Authentication | MissingPrompt | StartupFailed => {
                Severity::Critical
            }
            UnexpectedError | PdfProcessing | DocxProcessing | FileProcessing
            | MessageProcessing => Severity::Error,
            FileSizeExceeded | PdfTooLarge => Severity::Warning,
        }
    }

    pub fn label(self) -> &'static str {
        use AlertCategory::*;
        match self {
            ProviderRateLimit => "OpenAI Rate Limit",
            ProviderConnection => "OpenAI Connection Error",
            ProviderTimeout => "OpenAI Timeout",
            RegionBlocked => "OpenAI API Region Blocked",
            PermissionDenied => "OpenAI API Permission Denied",
            ProviderApi => "OpenAI API Error",
            Authentication => "Authentication Error",
            UnexpectedError => "Unexpected Error",
            MissingPrompt => "Missing Prompt File",
            FileSizeExceeded => "File Size Exceeded",
            PdfTooLarge => "PDF Too Large",
            PdfProcessing => "PDF Processing Failed",
            DocxProcessing => "DOCX Processing Failed",
            FileProcessing => "File Processing Failed",
            MessageProcessing => "Message Processing Failed",
            StartupFailed => "Bot Startup Failed",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity().as_str(), self.label())
    }
}

/// One alert, ready to render.
#[derive(Debug, Clone)]
pub struct Notification {
    pub category: AlertCategory,
    pub message: String,
    pub user_context: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    pub fn new(category: AlertCategory, message: &str, user_context: Option<String>) -> Self {
        Self {
            category,
            message: truncate_chars(message, MAX_ALERT_MESSAGE_CHARS),
            user_context: user_context.filter(|c| !c.is_empty()),
            timestamp: Local::now(),
        }
    }

    /// Telegram HTML body of the alert.
    pub fn render_html(&self) -> String {
        let mut text = format!(
            "🚨 <b>{}</b>\n\n<b>Error:</b>\n<code>{}</code>\n\n",
            self.category,
            escape_html(&self.message)
        );
        if let Some(context) = &self.user_context {
            text.push_str(&format!("<b>User:</b> {}\n\n", escape_html(context)));
        }
        text.push_str(&format!(
            "<b>Time:</b> {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
        text
    }
}

/// Cloneable handle that enqueues alerts without waiting.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Creates the handle plus the receiving end the worker drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn notify(&self, message: &str, user_context: Option<String>, category: AlertCategory) {
        let notification = Notification::new(category, message, user_context);
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(category = %dropped.category, "Notification queue full; alert dropped");
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(category = %dropped.category, "Notification worker stopped; alert dropped");
            }
        }
    }
}

/// Drains the alert queue into the operator chat.
pub struct NotificationWorker {
    rx: mpsc::Receiver<Notification>,
    platform: Arc<dyn ChatPlatform>,
    admin_chat_id: i64,
}

impl NotificationWorker {
    pub fn new(
        rx: mpsc::Receiver<Notification>,
        platform: Arc<dyn ChatPlatform>,
        admin_chat_id: i64,
    ) -> Self {
        Self {
            rx,
            platform,
            admin_chat_id,
        }
    }

    /// Runs until every `Notifier` handle has been dropped.
    pub async fn run(mut self) {
        while let Some(notification) = self.rx.recv().await {
            deliver_now(self.platform.as_ref(), self.admin_chat_id, &notification).await;
        }
        info!("Notification worker stopped");
    }
}

/// Sends one alert immediately. Failures are logged and swallowed.
pub async fn deliver_now(platform: &dyn ChatPlatform, admin_chat_id: i64, notification: &Notification) {
    let body = notification.render_html();
    if let Err(e) = platform
        .send_message(admin_chat_id, &body, Some(ParseMode::Html))
        .await
    {
        error!(
            category = %notification.category,
            "Failed to deliver operator notification: {e}"
        );
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
