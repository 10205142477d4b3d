use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::PromptId;

/// Opaque metadata bag carried alongside a prompt. Never interpreted here.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Raw free-form strategy description as captured from a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPrompt {
    pub id: PromptId,
    pub raw_text: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl UserPrompt {
    /// Capture a prompt now, deriving its content-hash ID.
    pub fn capture(raw_text: impl Into<String>, user_id: Option<String>, metadata: Metadata) -> Self {
        Self::capture_at(raw_text, user_id, metadata, Utc::now())
    }

    pub fn capture_at(
        raw_text: impl Into<String>,
        user_id: Option<String>,
        metadata: Metadata,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let raw_text = raw_text.into();
        let id = PromptId::derive(&raw_text, user_id.as_deref(), captured_at);
        Self { id, raw_text, captured_at, user_id, metadata }
    }

    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }

    /// First `max_chars` characters, with an ellipsis when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.raw_text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn capture_at_is_reproducible() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let a = UserPrompt::capture_at("lend usdc", None, Metadata::new(), at);
        let b = UserPrompt::capture_at("lend usdc", None, Metadata::new(), at);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let p = UserPrompt::capture("stake NEAR for 30 días", None, Metadata::new());
        assert_eq!(p.preview(5), "stake...");
        assert_eq!(p.preview(100), "stake NEAR for 30 días");
        assert_eq!(p.word_count(), 5);
    }
}
