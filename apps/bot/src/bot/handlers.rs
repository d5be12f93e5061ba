use tracing::{error, info, warn};

use crate::bot::messages::{self, split_for_telegram};
use crate::errors::BotError;
use crate::extraction::DocumentFormat;
use crate::generation::{GenerationOutcome, UserContext, MISSING_PROMPT_REPLY};
use crate::notify::AlertCategory;
use crate::state::AppState;
use crate::telegram::{Document, Message, SentMessage, TelegramError};

/// What an incoming message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Start,
    Help,
    UnknownCommand,
    Text(String),
    Document(Document),
    Photo,
    Other,
}

impl Route {
    pub fn of(message: &Message) -> Self {
        if let Some(text) = message.text.as_deref() {
            if text.starts_with('/') {
                return route_command(text);
            }
            return Route::Text(text.to_string());
        }
        if let Some(document) = &message.document {
            return Route::Document(document.clone());
        }
        if message.photo.as_ref().is_some_and(|p| !p.is_empty()) {
            return Route::Photo;
        }
        Route::Other
    }
}

fn route_command(text: &str) -> Route {
    let command = text.split_whitespace().next().unwrap_or_default();
    // "/help@some_bot" addresses this bot explicitly in group chats
    let command = command.split('@').next().unwrap_or(command);
    match command {
        "/start" => Route::Start,
        "/help" => Route::Help,
        _ => Route::UnknownCommand,
    }
}

/// Which fallback texts a resume-processing flow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Text,
    File,
}

impl Source {
    fn generation_failed(self) -> &'static str {
        match self {
            Source::Text => messages::GENERATION_FAILED_TEXT,
            Source::File => messages::GENERATION_FAILED_FILE,
        }
    }

    fn apology(self) -> &'static str {
        match self {
            Source::Text => messages::UNEXPECTED_TEXT,
            Source::File => messages::UNEXPECTED_FILE,
        }
    }

    fn alert_category(self) -> AlertCategory {
        match self {
            Source::Text => AlertCategory::MessageProcessing,
            Source::File => AlertCategory::FileProcessing,
        }
    }
}

pub async fn handle_message(state: &AppState, message: Message) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    match Route::of(&message) {
        Route::Start => reply(state, chat_id, messages::WELCOME).await,
        Route::Help => reply(state, chat_id, messages::HELP).await,
        Route::Text(text) => handle_text(state, &message, &text).await,
        Route::Document(document) => handle_document(state, &message, &document).await,
        Route::Photo => reply(state, chat_id, messages::PHOTO_UNSUPPORTED).await,
        Route::UnknownCommand | Route::Other => {
            reply(state, chat_id, messages::UNKNOWN_MESSAGE).await
        }
    }
}

async fn reply(state: &AppState, chat_id: i64, text: &str) -> Result<(), BotError> {
    state.platform.send_message(chat_id, text, None).await?;
    Ok(())
}

fn user_context(message: &Message) -> UserContext {
    match &message.from {
        Some(user) => UserContext {
            id: user.id,
            username: user.username.clone(),
        },
        None => UserContext {
            id: message.chat.id,
            username: None,
        },
    }
}

/// Replies and returns false when the user is over the rate limit.
async fn admit(state: &AppState, chat_id: i64, user: &UserContext) -> Result<bool, BotError> {
    if state.limiter.allow(user.id) {
        return Ok(true);
    }
    info!("Rate limit exceeded for user {user}");
    reply(state, chat_id, messages::RATE_LIMITED).await?;
    Ok(false)
}

async fn handle_text(state: &AppState, message: &Message, text: &str) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let user = user_context(message);
    if !admit(state, chat_id, &user).await? {
        return Ok(());
    }

    if state.limits.check_min_length(text.trim()).is_err() {
        let reply_text = messages::text_too_short(state.limits.min_length);
        return reply(state, chat_id, &reply_text).await;
    }

    let placeholder = state
        .platform
        .send_message(chat_id, messages::PROCESSING_TEXT, None)
        .await?;

    if let Err(e) = process_resume(state, placeholder, text, &user, Source::Text).await {
        recover(state, placeholder, &user, Source::Text, e).await;
    }
    Ok(())
}

async fn handle_document(
    state: &AppState,
    message: &Message,
    document: &Document,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let user = user_context(message);
    if !admit(state, chat_id, &user).await? {
        return Ok(());
    }

    // Unnamed documents go straight to extraction.
    if let Some(name) = document.file_name.as_deref() {
        match DocumentFormat::from_file_name(name) {
            DocumentFormat::Doc => return reply(state, chat_id, messages::DOC_UNSUPPORTED).await,
            DocumentFormat::Unsupported => {
                return reply(state, chat_id, messages::FORMAT_UNSUPPORTED).await
            }
            DocumentFormat::Txt | DocumentFormat::Pdf | DocumentFormat::Docx => {}
        }
    }

    let placeholder = state
        .platform
        .send_message(chat_id, messages::PROCESSING_FILE, None)
        .await?;

    if let Err(e) = process_document(state, placeholder, document, &user).await {
        recover(state, placeholder, &user, Source::File, e).await;
    }
    Ok(())
}

async fn process_document(
    state: &AppState,
    placeholder: SentMessage,
    document: &Document,
    user: &UserContext,
) -> Result<(), TelegramError> {
    let Some(text) = state
        .extractor
        .extract(state.platform.as_ref(), document)
        .await
    else {
        return state
            .platform
            .edit_message_text(placeholder, messages::EXTRACTION_FAILED)
            .await;
    };

    if state.limits.check_min_length(&text).is_err() {
        let reply_text = messages::file_too_short(state.limits.min_length);
        return state.platform.edit_message_text(placeholder, &reply_text).await;
    }

    process_resume(state, placeholder, &text, user, Source::File).await
}

/// Sanitizes, generates and delivers, always resolving the placeholder.
async fn process_resume(
    state: &AppState,
    placeholder: SentMessage,
    text: &str,
    user: &UserContext,
    source: Source,
) -> Result<(), TelegramError> {
    let resume = match state.limits.sanitize(text) {
        Ok(resume) => resume,
        Err(e) => {
            let reply_text = messages::too_long(&e.to_string(), state.limits.max_length);
            return state.platform.edit_message_text(placeholder, &reply_text).await;
        }
    };

    let outcome = state.generator.generate(&resume, user).await;
    deliver(state, placeholder, outcome, source).await?;
    Ok(())
}

async fn deliver(
    state: &AppState,
    placeholder: SentMessage,
    outcome: GenerationOutcome,
    source: Source,
) -> Result<(), TelegramError> {
    let platform = state.platform.as_ref();
    match outcome {
        GenerationOutcome::Template(template) => {
            platform.delete_message(placeholder).await?;
            for part in split_for_telegram(&template) {
                platform.send_message(placeholder.chat_id, &part, None).await?;
            }
            info!(chat_id = placeholder.chat_id, ?source, "Cover letter delivered");
            Ok(())
        }
        GenerationOutcome::RegionBlocked => {
            platform
                .edit_message_text(placeholder, messages::REGION_BLOCKED)
                .await
        }
        GenerationOutcome::MissingPrompt => {
            platform
                .edit_message_text(placeholder, MISSING_PROMPT_REPLY)
                .await
        }
        GenerationOutcome::Failed => {
            platform
                .edit_message_text(placeholder, source.generation_failed())
                .await
        }
    }
}

/// Last line of defence once the placeholder is on screen.
async fn recover(
    state: &AppState,
    placeholder: SentMessage,
    user: &UserContext,
    source: Source,
    e: TelegramError,
) {
    error!("Failed to process {source:?} from user {user}: {e}");
    state
        .notifier
        .notify(&e.to_string(), Some(user.to_string()), source.alert_category());
    if let Err(edit_err) = state
        .platform
        .edit_message_text(placeholder, source.apology())
        .await
    {
        warn!("Could not send apology to chat {}: {edit_err}", placeholder.chat_id);
    }
}
