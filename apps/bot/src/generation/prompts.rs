// Prompt fragments for cover-letter generation.
// The operator-supplied prompt file is the first half of the system message;
// the constants below are appended to it on every call.

use std::path::Path;

use tracing::{error, info};

use crate::llm_client::CompletionRequest;

/// Output-format rules appended to the operator's system prompt.
pub const FORMAT_INSTRUCTIONS: &str = "\
CRITICAL INSTRUCTIONS:
- You MUST return ONLY the cover letter template text
- DO NOT include any introductory text, explanations, or comments
- DO NOT say things like \"Here is your cover letter:\" or \"Based on your resume:\"
- DO NOT use markdown code blocks (```)
- DO NOT add any text before or after the template
- The template must be in English
- Include placeholders in square brackets [ ] as shown in the format
- Base the template on the resume information provided
- Start directly with the template format: [Your Name] [Your City, Country]...";

/// User message template. Replace `{resume_text}` before sending.
pub const USER_PROMPT_TEMPLATE: &str =
    "Generate a cover letter template based on this resume:\n\n{resume_text}";

pub fn build_request(system_prompt: &str, resume_text: &str) -> CompletionRequest {
    CompletionRequest {
        system: format!("{system_prompt}\n\n{FORMAT_INSTRUCTIONS}"),
        user: USER_PROMPT_TEMPLATE.replace("{resume_text}", resume_text),
    }
}

/// Reads the operator prompt once at startup. Missing or blank files yield
/// `None`; the bot keeps running and answers with a fixed error.
pub async fn load_system_prompt(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if !text.trim().is_empty() => {
            info!("Loaded system prompt from {}", path.display());
            Some(text.trim().to_string())
        }
        Ok(_) => {
            error!("Prompt file {} is empty", path.display());
            None
        }
        Err(e) => {
            error!("Failed to load prompt from {}: {e}", path.display());
            None
        }
    }
}
