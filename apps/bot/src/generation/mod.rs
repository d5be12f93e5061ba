// Cover-letter generation: prompt assembly, completion call, failure
// classification and output cleanup. All LLM calls go through llm_client.

pub mod classify;
pub mod cleanup;
pub mod generator;
pub mod prompts;

pub use generator::{CoverLetterGenerator, GenerationOutcome, UserContext, MISSING_PROMPT_REPLY};
