//! Post-processing of raw model output.

/// Lead-ins the model sometimes emits despite instructions, checked in order.
const INTRO_PHRASES: &[&str] = &[
    "here is your cover letter:",
    "based on your resume:",
    "here's your cover letter:",
    "cover letter template:",
    "template:",
];

/// Removes markdown fences and one known lead-in phrase.
///
/// Only the first matching phrase is removed; a chained lead-in such as
/// `"Template: Here is your cover letter: ..."` keeps its second phrase.
pub fn clean_template(raw: &str) -> String {
    let unfenced = raw.trim().replace("```markdown", "").replace("```", "");
    let mut text = unfenced.trim();

    for phrase in INTRO_PHRASES {
        let matches = text
            .get(..phrase.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(phrase));
        if matches {
            text = text[phrase.len()..].trim();
            if let Some(rest) = text.strip_prefix(':') {
                text = rest.trim();
            }
            break;
        }
    }

    text.trim_start().to_string()
}
