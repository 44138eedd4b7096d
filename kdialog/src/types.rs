//! Transcript, turn, intent, and chat API types.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::DialogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Image metadata carried by an assistant turn that produced a picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnImage {
    pub url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TurnRecord", into = "TurnRecord")]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    image: Option<TurnImage>,
    summary: bool,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image: None,
            summary: false,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    /// System turn standing in for older turns folded away by compression.
    pub fn summary(content: impl Into<String>) -> Self {
        Self {
            summary: true,
            ..Self::system(content)
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    pub fn assistant_image(
        content: impl Into<String>,
        url: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            image: Some(TurnImage {
                url: url.into(),
                prompt: prompt.into(),
            }),
            summary: false,
        }
    }

    /// Rebuilds a turn from loose parts, as read back from storage.
    ///
    /// Image URL and prompt must be given together and only on assistant turns.
    pub fn from_parts(
        role: TurnRole,
        content: impl Into<String>,
        image_url: Option<String>,
        image_prompt: Option<String>,
    ) -> Result<Self, DialogError> {
        let image = match (image_url, image_prompt) {
            (None, None) => None,
            (Some(url), Some(prompt)) => Some(TurnImage { url, prompt }),
            _ => {
                return Err(DialogError::invalid_request(
                    "image_url and image_prompt must be set together",
                ));
            }
        };

        if image.is_some() && role != TurnRole::Assistant {
            return Err(DialogError::invalid_request(
                "only assistant turns may carry an image",
            ));
        }

        Ok(Self {
            role,
            content: content.into(),
            image,
            summary: false,
        })
    }

    /// Marks a restored system turn as a compression summary.
    pub fn into_summary(mut self) -> Result<Self, DialogError> {
        if self.role != TurnRole::System {
            return Err(DialogError::invalid_request(
                "only system turns may be summaries",
            ));
        }
        self.summary = true;
        Ok(self)
    }

    pub fn is_summary(&self) -> bool {
        self.summary
    }

    pub fn image(&self) -> Option<&TurnImage> {
        self.image.as_ref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.url.as_str())
    }

    pub fn image_prompt(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.prompt.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TurnRecord {
    role: TurnRole,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    summary: bool,
}

impl TryFrom<TurnRecord> for Turn {
    type Error = DialogError;

    fn try_from(value: TurnRecord) -> Result<Self, Self::Error> {
        let turn =
            Turn::from_parts(value.role, value.content, value.image_url, value.image_prompt)?;
        if value.summary {
            turn.into_summary()
        } else {
            Ok(turn)
        }
    }
}

impl From<Turn> for TurnRecord {
    fn from(value: Turn) -> Self {
        let (image_url, image_prompt) = match value.image {
            Some(image) => (Some(image.url), Some(image.prompt)),
            None => (None, None),
        };

        Self {
            role: value.role,
            content: value.content,
            image_url,
            image_prompt,
            summary: value.summary,
        }
    }
}

/// Chronological list of turns for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Fresh transcript holding only the persona turn.
    pub fn seeded(persona: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(persona)],
        }
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn first(&self) -> Option<&Turn> {
        self.turns.first()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent image prompt on an assistant turn, newest first.
    pub fn last_image_prompt(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .filter(|turn| turn.role == TurnRole::Assistant)
            .find_map(Turn::image_prompt)
    }

    pub fn has_image(&self) -> bool {
        self.last_image_prompt().is_some()
    }
}

impl From<Vec<Turn>> for Transcript {
    fn from(value: Vec<Turn>) -> Self {
        Self::from_turns(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    PlainText,
    NewImage,
    EditImage,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::NewImage => "new_image",
            Self::EditImage => "edit_image",
        }
    }
}

impl Display for Intent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub image_url: Option<String>,
    pub conversation: Transcript,
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: String,
}

impl ResetRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialogErrorKind;

    #[test]
    fn from_parts_enforces_image_invariants() {
        let err = Turn::from_parts(
            TurnRole::User,
            "draw a cat",
            Some("https://img/1".to_string()),
            Some("a cat".to_string()),
        )
        .expect_err("user turns cannot carry images");
        assert_eq!(err.kind, DialogErrorKind::InvalidRequest);

        let err = Turn::from_parts(
            TurnRole::Assistant,
            "Here you go",
            Some("https://img/1".to_string()),
            None,
        )
        .expect_err("url without prompt must fail");
        assert_eq!(err.kind, DialogErrorKind::InvalidRequest);

        let turn = Turn::from_parts(
            TurnRole::Assistant,
            "Here you go",
            Some("https://img/1".to_string()),
            Some("a cat".to_string()),
        )
        .expect("assistant image turn should build");
        assert_eq!(turn.image_prompt(), Some("a cat"));
    }

    #[test]
    fn turn_json_uses_flat_image_fields() {
        let turn = Turn::assistant_image("Here’s your image! 🎨", "https://img/2", "a dragon");
        let json = serde_json::to_value(&turn).expect("turn should serialize");
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["image_url"], "https://img/2");
        assert_eq!(json["image_prompt"], "a dragon");

        let plain = serde_json::to_value(Turn::user("hi")).expect("turn should serialize");
        assert!(plain.get("image_url").is_none());

        let bad = r#"{"role": "system", "content": "x", "image_url": "u", "image_prompt": "p"}"#;
        assert!(serde_json::from_str::<Turn>(bad).is_err());
    }

    #[test]
    fn summary_turns_keep_their_marker_through_json() {
        let summary = Turn::summary("We talked about bees.");
        assert_eq!(summary.role, TurnRole::System);
        let json = serde_json::to_value(&summary).expect("turn should serialize");
        assert_eq!(json["summary"], true);
        let restored: Turn = serde_json::from_value(json).expect("turn should deserialize");
        assert!(restored.is_summary());

        let persona = serde_json::to_value(Turn::system("persona")).expect("turn should serialize");
        assert!(persona.get("summary").is_none());

        let bad = r#"{"role": "user", "content": "x", "summary": true}"#;
        assert!(serde_json::from_str::<Turn>(bad).is_err());
    }

    #[test]
    fn last_image_prompt_scans_newest_first() {
        let transcript = Transcript::from_turns(vec![
            Turn::system("persona"),
            Turn::assistant_image("one", "https://img/1", "a cat"),
            Turn::user("make it purple"),
            Turn::assistant_image("two", "https://img/2", "a cat, but now make it purple"),
            Turn::assistant("Cats are great!"),
        ]);

        assert_eq!(
            transcript.last_image_prompt(),
            Some("a cat, but now make it purple")
        );
        assert!(!Transcript::seeded("persona").has_image());
    }

    #[test]
    fn chat_request_tolerates_missing_fields() {
        let request: ChatRequest = serde_json::from_str("{}").expect("request should parse");
        assert!(request.message.is_empty());
        assert!(request.session_id.is_none());
    }
}
