//! Prompt assembly
//!
//! Output layout, in order:
//! ```text
//! <summary heading>: <summary>
//!
//! <key points heading>: <point>, <point>
//!
//! <recent heading>:
//! <role>: <content>
//! ...
//!
//! <user>: <new message>
//! ```
//! Blocks without content are omitted.

use super::models::{ConversationContext, Role};
use serde::{Deserialize, Serialize};

/// Label language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLanguage {
    Arabic,
    English,
}

impl Default for LabelLanguage {
    fn default() -> Self {
        LabelLanguage::Arabic
    }
}

/// Prompt assembly settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub labels: LabelLanguage,

    /// Render at most this many of the newest turns; all when unset
    #[serde(default)]
    pub max_turns: Option<usize>,
}

/// Text fragments used to render a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLabels {
    pub user: &'static str,
    pub assistant: &'static str,
    pub system: &'static str,
    pub summary: &'static str,
    pub key_points: &'static str,
    pub recent: &'static str,
}

impl PromptLabels {
    pub const ARABIC: PromptLabels = PromptLabels {
        user: "المستخدم",
        assistant: "المساعد",
        system: "النظام",
        summary: "السياق السابق",
        key_points: "النقاط المهمة",
        recent: "المحادثة الحديثة",
    };

    pub const ENGLISH: PromptLabels = PromptLabels {
        user: "User",
        assistant: "Assistant",
        system: "System",
        summary: "Previous context",
        key_points: "Key points",
        recent: "Recent conversation",
    };

    pub fn for_language(language: LabelLanguage) -> &'static PromptLabels {
        match language {
            LabelLanguage::Arabic => &Self::ARABIC,
            LabelLanguage::English => &Self::ENGLISH,
        }
    }

    pub fn role(&self, role: Role) -> &'static str {
        match role {
            Role::User => self.user,
            Role::Assistant => self.assistant,
            Role::System => self.system,
        }
    }
}

/// Builds the single prompt string handed to the model layer
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    labels: &'static PromptLabels,
    max_turns: Option<usize>,
}

impl PromptAssembler {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            labels: PromptLabels::for_language(config.labels),
            max_turns: config.max_turns,
        }
    }

    pub fn labels(&self) -> &PromptLabels {
        self.labels
    }

    pub fn assemble(&self, context: &ConversationContext, new_message: &str) -> String {
        let labels = self.labels;
        let mut prompt = String::new();

        if let Some(summary) = context.summary_text() {
            prompt.push_str(&format!("{}: {}\n\n", labels.summary, summary));
        }

        if let Some(points) = context.key_points() {
            prompt.push_str(&format!("{}: {}\n\n", labels.key_points, points.join(", ")));
        }

        let skip = self
            .max_turns
            .map(|max| context.messages.len().saturating_sub(max))
            .unwrap_or(0);
        let turns = &context.messages[skip..];

        if !turns.is_empty() {
            prompt.push_str(labels.recent);
            prompt.push_str(":\n");
            for turn in turns {
                prompt.push_str(&format!("{}: {}\n", labels.role(turn.role), turn.content));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!("{}: {}", labels.user, new_message));
        prompt
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(&PromptConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::ChatTurn;

    #[test]
    fn test_only_new_message() {
        let prompt = PromptAssembler::default().assemble(&ConversationContext::default(), "مرحبا");
        assert_eq!(prompt, "المستخدم: مرحبا");
    }

    #[test]
    fn test_full_layout_in_order() {
        let ctx = ConversationContext::new(vec![
            ChatTurn::user("سؤال"),
            ChatTurn::assistant("جواب"),
        ])
        .with_summary("ملخص")
        .with_key_points(vec!["أ".to_string(), "ب".to_string()]);

        let prompt = PromptAssembler::default().assemble(&ctx, "جديد");

        assert_eq!(
            prompt,
            "السياق السابق: ملخص\n\n\
             النقاط المهمة: أ, ب\n\n\
             المحادثة الحديثة:\n\
             المستخدم: سؤال\n\
             المساعد: جواب\n\n\
             المستخدم: جديد"
        );
    }

    #[test]
    fn test_empty_key_points_are_omitted() {
        let ctx = ConversationContext::default().with_key_points(vec![]);
        let prompt = PromptAssembler::default().assemble(&ctx, "x");
        assert!(!prompt.contains("النقاط المهمة"));
    }

    #[test]
    fn test_english_labels_and_turn_cap() {
        let config = PromptConfig {
            labels: LabelLanguage::English,
            max_turns: Some(1),
        };
        let ctx = ConversationContext::new(vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
        ]);

        let prompt = PromptAssembler::new(&config).assemble(&ctx, "third");

        assert_eq!(prompt, "Recent conversation:\nAssistant: second\n\nUser: third");
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let ctx = ConversationContext::new(vec![ChatTurn::user("a")]).with_summary("s");
        let assembler = PromptAssembler::default();
        assert_eq!(assembler.assemble(&ctx, "b"), assembler.assemble(&ctx, "b"));
    }
}
