// User-facing texts.

use crate::telegram::MAX_MESSAGE_LENGTH;

pub const WELCOME: &str = "👋 Hi! I create cover letter templates.\n\n\
    📄 Just send me your resume (as text or as a file) \
    and I'll build a personalized template in English.\n\n\
    The template contains placeholders in square brackets [ ] \
    that you can replace with the details of a specific vacancy.";

pub const HELP: &str = "📋 How to use the bot:\n\n\
    1. Send your resume in one of these ways:\n\
    \u{20}  • Copy the resume text and send it as a message\n\
    \u{20}  • Send a resume file (PDF, DOCX, TXT)\n\n\
    2. The bot automatically creates a cover letter template\n\n\
    3. The template contains placeholders [ ] to replace with the vacancy details\n\n\
    💡 Tip: the more detailed the resume, the better the template!";

pub const RATE_LIMITED: &str = "⏳ Too many requests. Please wait a minute before your next request.";

pub const PROCESSING_TEXT: &str = "⏳ Processing your resume and creating a template...";

pub const PROCESSING_FILE: &str = "⏳ Processing the file and creating a template...";

pub const REGION_BLOCKED: &str = "❌ Unfortunately, the OpenAI API service is not available in your region.\n\n\
    This is a limitation from OpenAI. To resolve the issue:\n\
    • Use a VPN\n\
    • Contact the bot administrator\n\n\
    Sorry for the inconvenience.";

pub const GENERATION_FAILED_TEXT: &str = "❌ An error occurred while generating the template. \
    Please try again or send the resume in a different format.";

pub const GENERATION_FAILED_FILE: &str = "❌ An error occurred while generating the template. \
    Please try sending the resume as text.";

pub const UNEXPECTED_TEXT: &str = "❌ An error occurred. Please try again.";

pub const UNEXPECTED_FILE: &str = "❌ An error occurred while processing the file. \
    Please try sending the resume as text.";

pub const DOC_UNSUPPORTED: &str = "📄 DOC format files (old Word format) are not supported.\n\
    Please convert the file to DOCX or PDF, or send the resume as text.";

pub const FORMAT_UNSUPPORTED: &str = "📄 Please send the resume in TXT, PDF, or DOCX format.\n\
    Or simply copy the resume text and send it as a message.";

pub const EXTRACTION_FAILED: &str = "❌ Failed to extract text from the file. Possible reasons:\n\
    • File is corrupted or protected\n\
    • File is in an unsupported format\n\n\
    Please send the resume as text or try a different file.";

pub const PHOTO_UNSUPPORTED: &str = "📸 I see you sent a photo. \
    Unfortunately, I cannot process images yet.\n\n\
    Please send your resume in one of the following ways:\n\
    • Copy the resume text and send it as a message\n\
    • Send a resume file (PDF, DOCX, TXT)";

pub const UNKNOWN_MESSAGE: &str = "🤔 I cannot process this type of message.\n\n\
    Please send your resume in one of the following ways:\n\
    • Copy the resume text and send it as a message\n\
    • Send a resume file (PDF, DOCX, TXT)\n\n\
    Use /help for detailed information.";

const RESUME_CHECKLIST: &str = "📝 Resume should include:\n\
    • Personal information (name, contacts)\n\
    • Work experience\n\
    • Education\n\
    • Skills and competencies\n\n\
    The more detailed the resume, the better the template will be!";

pub fn text_too_short(min: usize) -> String {
    format!(
        "⚠️ Resume text is too short.\n\n\
         Please send a complete resume (minimum {min} characters) \
         to create a quality template.\n\n{RESUME_CHECKLIST}"
    )
}

pub fn file_too_short(min: usize) -> String {
    format!(
        "⚠️ Text in the file is too short.\n\n\
         Please make sure the file contains a complete resume (minimum {min} characters).\n\n\
         {RESUME_CHECKLIST}"
    )
}

pub fn too_long(reason: &str, max: usize) -> String {
    format!("❌ {reason}\n\nPlease send a resume shorter than {max} characters.")
}

/// Cuts `text` into consecutive chunks of at most `limit` characters.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }
    text.chars()
        .collect::<Vec<_>>()
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

pub fn split_for_telegram(text: &str) -> Vec<String> {
    split_message(text, MAX_MESSAGE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_for_telegram("hello"), vec!["hello".to_string()]);
        let exact = "a".repeat(4096);
        assert_eq!(split_for_telegram(&exact), vec![exact.clone()]);
    }

    #[test]
    fn test_9000_chars_split_into_three_ordered_chunks() {
        let text: String = (0..9000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let parts = split_for_telegram(&text);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 4096));
        assert_eq!(parts[0].chars().count(), 4096);
        assert_eq!(parts[2].chars().count(), 9000 - 2 * 4096);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_split_counts_characters() {
        let text = "я".repeat(5);
        let parts = split_message(&text, 2);
        assert_eq!(parts, vec!["яя", "яя", "я"]);
    }

    #[test]
    fn test_constraint_messages_mention_limits() {
        assert!(text_too_short(50).contains("minimum 50 characters"));
        assert!(file_too_short(50).contains("minimum 50 characters"));
        assert_eq!(
            too_long("Resume is too long (maximum 10 characters)", 10),
            "❌ Resume is too long (maximum 10 characters)\n\nPlease send a resume shorter than 10 characters."
        );
    }
}
