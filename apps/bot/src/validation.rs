//! Résumé text validation.
//!
//! Lengths are counted in characters, not bytes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Resume is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Resume is too short (minimum {min} characters)")]
    TooShort { min: usize },
}

/// Length bounds applied to every résumé, pasted or extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeLimits {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for ResumeLimits {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 50_000,
        }
    }
}

impl ResumeLimits {
    /// Rejects text over the hard cap, then strips NUL bytes, truncates to
    /// the cap and trims surrounding whitespace.
    pub fn sanitize(&self, text: &str) -> Result<String, ValidationError> {
        if text.chars().count() > self.max_length {
            return Err(ValidationError::TooLong {
                max: self.max_length,
            });
        }

        let cleaned: String = text
            .chars()
            .filter(|&c| c != '\0')
            .take(self.max_length)
            .collect();

        Ok(cleaned.trim().to_string())
    }

    /// The "too short" gate, checked before `sanitize` with its own reply.
    pub fn check_min_length(&self, text: &str) -> Result<(), ValidationError> {
        if text.chars().count() < self.min_length {
            return Err(ValidationError::TooShort {
                min: self.min_length,
            });
        }
        Ok(())
    }
}
