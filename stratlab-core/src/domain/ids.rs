use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters kept from the BLAKE3 digest.
const ID_HEX_LEN: usize = 16;

fn short_hash(canonical: &serde_json::Value) -> String {
    let digest = blake3::hash(canonical.to_string().as_bytes());
    digest.to_hex()[..ID_HEX_LEN].to_string()
}

/// Prompt ID (content hash of raw text + user + capture time)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(pub String);

impl PromptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a stable ID for a captured prompt.
    ///
    /// Two captures of the same text by the same user at different instants
    /// get different IDs; replaying the exact capture reproduces the ID.
    pub fn derive(raw_text: &str, user_id: Option<&str>, captured_at: DateTime<Utc>) -> Self {
        let canonical = serde_json::json!({
            "raw_text": raw_text,
            "user_id": user_id,
            "captured_at": captured_at.to_rfc3339(),
        });
        Self(short_hash(&canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured record ID (hash of source prompt + classification time)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn derive(source: &PromptId, created_at: DateTime<Utc>) -> Self {
        let canonical = serde_json::json!({
            "source": &source.0,
            "created_at": created_at.to_rfc3339(),
        });
        Self(short_hash(&canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prompt_id_deterministic() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = PromptId::derive("stake near", Some("alice"), at);
        let b = PromptId::derive("stake near", Some("alice"), at);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), ID_HEX_LEN);
    }

    #[test]
    fn prompt_id_changes_with_user() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = PromptId::derive("stake near", Some("alice"), at);
        let b = PromptId::derive("stake near", None, at);
        assert_ne!(a, b);
    }

    #[test]
    fn record_id_changes_with_time() {
        let source = PromptId::new("abc");
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        assert_ne!(RecordId::derive(&source, t1), RecordId::derive(&source, t2));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = PromptId::new("deadbeef");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"deadbeef\"");
    }
}
