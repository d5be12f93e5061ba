// In-memory fakes for the external collaborators, shared by unit tests.
#![cfg(test)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::Receiver;

use crate::extraction::{ExtractionLimits, FileExtractor};
use crate::generation::CoverLetterGenerator;
use crate::llm_client::{CompletionBackend, CompletionError, CompletionRequest};
use crate::notify::{Notification, Notifier};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::telegram::{ChatPlatform, File, ParseMode, SentMessage, TelegramError};
use crate::validation::ResumeLimits;

#[derive(Debug, Clone, PartialEq)]
pub struct SentText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

/// Records every outbound call; serves downloads from an in-memory map.
#[derive(Default)]
pub struct RecordingPlatform {
    sent: Mutex<Vec<SentText>>,
    edits: Mutex<Vec<(SentMessage, String)>>,
    deletes: Mutex<Vec<SentMessage>>,
    files: Mutex<HashMap<String, (Option<u64>, Bytes)>>,
    fail_sends: bool,
}

impl RecordingPlatform {
    pub fn failing_sends() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Registers a downloadable file; `reported_size` is what `getFile` claims.
    pub fn with_file(self, file_id: &str, reported_size: Option<u64>, bytes: impl Into<Bytes>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), (reported_size, bytes.into()));
        self
    }

    pub fn sent(&self) -> Vec<SentText> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(SentMessage, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<SentMessage> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<SentMessage, TelegramError> {
        if self.fail_sends {
            return Err(TelegramError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        let message_id = sent.len() as i64 + 1;
        sent.push(SentText {
            chat_id,
            message_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(SentMessage {
            chat_id,
            message_id,
        })
    }

    async fn edit_message_text(
        &self,
        message: SentMessage,
        text: &str,
    ) -> Result<(), TelegramError> {
        self.edits.lock().unwrap().push((message, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: SentMessage) -> Result<(), TelegramError> {
        self.deletes.lock().unwrap().push(message);
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        let files = self.files.lock().unwrap();
        let (size, _) = files.get(file_id).ok_or_else(|| TelegramError::Api {
            code: 400,
            description: "Bad Request: invalid file_id".to_string(),
        })?;
        Ok(File {
            file_id: file_id.to_string(),
            file_size: *size,
            file_path: Some(format!("documents/{file_id}")),
        })
    }

    async fn download_file(&self, file: &File) -> Result<Bytes, TelegramError> {
        let files = self.files.lock().unwrap();
        files
            .get(&file.file_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| TelegramError::MissingFilePath(file.file_id.clone()))
    }
}

type ErrorFactory = Box<dyn Fn() -> CompletionError + Send + Sync>;

/// Completion backend that answers with a canned reply or error.
pub struct StubCompletion {
    reply: Result<String, ErrorFactory>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> CompletionError + Send + Sync + 'static,
    {
        Self {
            reply: Err(Box::new(make_error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

/// Wires an `AppState` around the fakes with default limits.
pub fn app_state(
    platform: Arc<RecordingPlatform>,
    backend: Arc<StubCompletion>,
    requests_per_minute: usize,
) -> (AppState, Receiver<Notification>) {
    let (notifier, alerts) = Notifier::channel(16);
    let limits = ResumeLimits::default();
    let generator = CoverLetterGenerator::new(
        backend,
        Some("You write cover letters.".to_string()),
        limits,
        notifier.clone(),
    );
    let state = AppState {
        platform,
        generator: Arc::new(generator),
        extractor: FileExtractor::new(ExtractionLimits::default(), notifier.clone()),
        limiter: Arc::new(RateLimiter::per_minute(requests_per_minute)),
        notifier,
        limits,
        webhook_secret: None,
    };
    (state, alerts)
}

pub fn drain(alerts: &mut Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = alerts.try_recv() {
        out.push(n);
    }
    out
}
