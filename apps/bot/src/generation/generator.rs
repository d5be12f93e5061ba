//! Cover-letter generation: sanitize, prompt, complete, clean.
//!
//! Never fails: every error is classified, alerted where the table says so,
//! and folded into a `GenerationOutcome` the handlers can render.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::generation::classify::{classify, FailureOutcome, FailureReport};
use crate::generation::cleanup::clean_template;
use crate::generation::prompts::build_request;
use crate::llm_client::CompletionBackend;
use crate::notify::{AlertCategory, Notifier};
use crate::validation::ResumeLimits;

/// Reply used when the prompt file never loaded.
pub const MISSING_PROMPT_REPLY: &str =
    "Error: Failed to load prompt. Please check the prompt file";

/// Who asked, for logs and operator alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub id: i64,
    pub username: Option<String>,
}

impl fmt::Display for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Username: @{}",
            self.id,
            self.username.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Template(String),
    RegionBlocked,
    MissingPrompt,
    Failed,
}

pub struct CoverLetterGenerator {
    backend: Arc<dyn CompletionBackend>,
    system_prompt: Option<String>,
    limits: ResumeLimits,
    notifier: Notifier,
}

impl CoverLetterGenerator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        system_prompt: Option<String>,
        limits: ResumeLimits,
        notifier: Notifier,
    ) -> Self {
        Self {
            backend,
            system_prompt,
            limits,
            notifier,
        }
    }

    pub async fn generate(&self, resume_text: &str, user: &UserContext) -> GenerationOutcome {
        let Some(system_prompt) = self.system_prompt.as_deref() else {
            error!("Generation requested but no system prompt is loaded");
            self.notifier.notify(
                "Failed to load prompt from the prompt file",
                Some(user.to_string()),
                AlertCategory::MissingPrompt,
            );
            return GenerationOutcome::MissingPrompt;
        };

        // Callers usually pass sanitized text already; this is the second barrier.
        let resume_text = match self.limits.sanitize(resume_text) {
            Ok(text) => text,
            Err(e) => {
                warn!("Resume validation failed: {e}");
                return self.fail(FailureReport::from(&e), user);
            }
        };

        let request = build_request(system_prompt, &resume_text);
        match self.backend.complete(&request).await {
            Ok(raw) => {
                info!("Cover letter generated for user {}", user.id);
                GenerationOutcome::Template(clean_template(&raw))
            }
            Err(e) => {
                error!("Completion failed for user {}: {e}", user.id);
                self.fail(FailureReport::from(&e), user)
            }
        }
    }

    fn fail(&self, report: FailureReport, user: &UserContext) -> GenerationOutcome {
        let verdict = classify(&report);
        if let Some(alert) = verdict.alert {
            self.notifier
                .notify(&alert.details, Some(user.to_string()), alert.category);
        }
        match verdict.outcome {
            FailureOutcome::RegionBlocked => GenerationOutcome::RegionBlocked,
            FailureOutcome::Failed => GenerationOutcome::Failed,
        }
    }
}
