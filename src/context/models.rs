//! Data models for conversation context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "USER")]
    User,
    #[serde(alias = "ASSISTANT")]
    Assistant,
    #[serde(alias = "SYSTEM")]
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single stored conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    /// Stamped on receipt when the client omits it
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Turn authored by the user, stamped now
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, Utc::now())
    }

    /// Turn authored by the assistant, stamped now
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, Utc::now())
    }

    /// `role: content` line used when rendering transcripts for helper services
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role.as_str(), self.content)
    }
}

/// Conversation history as handed to the model layer.
///
/// `messages` are ordered oldest to newest. `summary` only ever covers
/// turns that were dropped from `messages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub messages: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
}

impl ConversationContext {
    pub fn new(messages: Vec<ChatTurn>) -> Self {
        Self {
            messages,
            summary: None,
            key_points: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = Some(key_points);
        self
    }

    /// Summary text if present and non-empty
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Key points if present and non-empty
    pub fn key_points(&self) -> Option<&[String]> {
        self.key_points.as_deref().filter(|k| !k.is_empty())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Token accounting reported by a model invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Accumulate another usage record
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens = self.prompt_tokens + self.completion_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_uppercase_aliases() {
        let role: Role = serde_json::from_str("\"ASSISTANT\"").unwrap();
        assert_eq!(role, Role::Assistant);
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_context_serializes_camel_case() {
        let ctx = ConversationContext::new(vec![]).with_key_points(vec!["a".to_string()]);
        let json = serde_json::to_value(&ctx).unwrap();
        assert!(json.get("keyPoints").is_some());
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn test_empty_summary_is_treated_as_absent() {
        let ctx = ConversationContext::default().with_summary("");
        assert!(ctx.summary_text().is_none());
        let ctx = ConversationContext::default().with_summary(" \t");
        assert!(ctx.summary_text().is_none());
    }

    #[test]
    fn test_usage_accumulates_total() {
        let mut usage = TokenUsage::new(10, 5);
        usage.add(&TokenUsage::new(3, 2));
        assert_eq!(usage.prompt_tokens, 13);
        assert_eq!(usage.completion_tokens, 7);
        assert_eq!(usage.total_tokens, 20);
    }
}
