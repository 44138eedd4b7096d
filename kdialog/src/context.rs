//! Long-conversation compression.
//!
//! Once a transcript grows past `max_turns`, everything but the most recent
//! `keep_recent` turns is replaced by a single summary turn.

use std::future::Future;

use kprovider::{Message, ProviderError};

use crate::{Transcript, Turn};

pub const SUMMARY_INSTRUCTION: &str = "Summarize this conversation in a short, friendly way for kids:";
pub const FALLBACK_SUMMARY: &str = "Earlier we talked about some cool topics!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionPolicy {
    pub max_turns: usize,
    pub keep_recent: usize,
    pub fallback_summary: String,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_turns: 20,
            keep_recent: 10,
            fallback_summary: FALLBACK_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    Unchanged,
    Summarized { removed: usize },
    /// Summarization failed and the canned summary was used instead.
    Fallback { removed: usize, error: ProviderError },
}

#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    policy: CompressionPolicy,
}

impl ContextManager {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    pub fn needs_compression(&self, transcript: &Transcript) -> bool {
        transcript.len() > self.policy.max_turns
    }

    /// Splits an oversized transcript into `(older, recent)`.
    pub fn split<'a>(&self, transcript: &'a Transcript) -> Option<(&'a [Turn], &'a [Turn])> {
        if !self.needs_compression(transcript) {
            return None;
        }

        let cut = transcript.len().saturating_sub(self.policy.keep_recent);
        Some(transcript.turns().split_at(cut))
    }

    /// Messages asking the text provider to recap `rendered` older turns.
    pub fn summary_messages(persona: &str, rendered: String) -> Vec<Message> {
        vec![
            Message::system(persona),
            Message::user(SUMMARY_INSTRUCTION),
            Message::assistant(rendered),
        ]
    }

    pub fn render_turns(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compresses `transcript` when it is oversized. `summarize` receives the
    /// rendered older turns and returns the recap text.
    pub async fn compress<F, Fut>(
        &self,
        transcript: Transcript,
        summarize: F,
    ) -> (Transcript, CompressionOutcome)
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String, ProviderError>>,
    {
        let Some((older, _)) = self.split(&transcript) else {
            return (transcript, CompressionOutcome::Unchanged);
        };

        let removed = older.len();
        let rendered = Self::render_turns(older);

        let (summary, outcome) = match summarize(rendered).await {
            Ok(summary) if !summary.trim().is_empty() => (
                summary.trim().to_string(),
                CompressionOutcome::Summarized { removed },
            ),
            Ok(_) => (
                self.policy.fallback_summary.clone(),
                CompressionOutcome::Fallback {
                    removed,
                    error: ProviderError::empty_response("summary was empty"),
                },
            ),
            Err(error) => (
                self.policy.fallback_summary.clone(),
                CompressionOutcome::Fallback { removed, error },
            ),
        };

        let mut turns = transcript.into_turns();
        let recent = turns.split_off(removed);
        let mut compressed = Vec::with_capacity(recent.len() + 1);
        compressed.push(Turn::summary(summary));
        compressed.extend(recent);

        (Transcript::from_turns(compressed), outcome)
    }
}
