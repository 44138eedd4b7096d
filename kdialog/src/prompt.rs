//! Image prompt composition, including edit chaining.

use crate::{Intent, Transcript};

/// Base description used when an edit has no earlier prompt to build on.
pub const EDIT_FALLBACK_BASE: &str = "a fun kid-friendly illustration";

/// Builds the image prompt for `intent`. Plain text answers have no prompt.
pub fn compose_prompt(intent: Intent, user_text: &str, transcript: &Transcript) -> Option<String> {
    match intent {
        Intent::PlainText => None,
        Intent::NewImage => Some(user_text.to_string()),
        Intent::EditImage => Some(compose_edit_prompt(
            transcript.last_image_prompt(),
            user_text,
        )),
    }
}

pub fn compose_edit_prompt(previous: Option<&str>, user_text: &str) -> String {
    let base = previous.unwrap_or(EDIT_FALLBACK_BASE);
    format!("{base}, but now {}", user_text.to_lowercase())
}
