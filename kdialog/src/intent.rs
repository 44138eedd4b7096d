//! Keyword intent classification.
//!
//! ```rust
//! use kdialog::{Intent, Transcript, Turn, classify_intent};
//!
//! let mut transcript = Transcript::seeded("persona");
//! assert_eq!(classify_intent("show me a dragon", &transcript), Intent::NewImage);
//! assert_eq!(classify_intent("make it blue", &transcript), Intent::PlainText);
//!
//! transcript.push(Turn::assistant_image("Here you go", "https://img/1", "a dragon"));
//! assert_eq!(classify_intent("make it blue", &transcript), Intent::EditImage);
//! ```

use crate::{Intent, Transcript};

pub const IMAGE_KEYWORDS: [&str; 5] = ["draw", "show", "picture", "image", "illustrate"];

pub const EDIT_KEYWORDS: [&str; 11] = [
    "edit", "change", "alter", "modify", "replace", "add", "remove", "put", "make", "give", "wear",
];

/// Which keyword families appear in a message (case-insensitive substring match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordMatch {
    pub image: bool,
    pub edit: bool,
}

impl KeywordMatch {
    pub fn scan(text: &str) -> Self {
        let lowered = text.to_lowercase();
        Self {
            image: IMAGE_KEYWORDS.iter().any(|word| lowered.contains(word)),
            edit: EDIT_KEYWORDS.iter().any(|word| lowered.contains(word)),
        }
    }

    pub fn intent(self, has_prior_image: bool) -> Intent {
        if self.edit && has_prior_image {
            Intent::EditImage
        } else if self.image {
            Intent::NewImage
        } else {
            Intent::PlainText
        }
    }

    /// Edit was requested but there is no picture to change yet.
    pub fn nothing_to_edit(self, has_prior_image: bool) -> bool {
        self.edit && !self.image && !has_prior_image
    }
}

pub fn classify_intent(user_text: &str, transcript: &Transcript) -> Intent {
    KeywordMatch::scan(user_text).intent(transcript.has_image())
}
