//! Text-analysis capability.
//!
//! Summarization talks to the language model through the [`TextAnalysis`]
//! trait; the production implementation is [`GroqChatClient`]. The model is
//! asked for a fixed JSON shape ([`MeetingAnalysis`]) covering summary,
//! decisions, participants, and action items.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::db::action_items::ItemPriority;

mod groq_chat;

pub use groq_chat::GroqChatClient;

/// Extraction instruction sent as the system message. The JSON shape here
/// must stay in sync with [`MeetingAnalysis`].
pub const EXTRACTION_PROMPT: &str = r#"You are an expert meeting analyst. Analyze the meeting transcript and provide:
1. A concise summary (2-3 paragraphs)
2. Key decisions made
3. Participants mentioned
4. Action items with assignees, priority, and due dates if mentioned

Return your response as a JSON object with this structure:
{
  "summary": "string",
  "key_decisions": ["string"],
  "participants": ["string"],
  "action_items": [
    {
      "task": "string",
      "assignee": "string or null",
      "priority": "low|medium|high",
      "due_date": "YYYY-MM-DD or null"
    }
  ]
}"#;

/// Structured analysis of a transcript, as returned by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingAnalysis {
    pub summary: String,
    #[serde(default)]
    pub key_decisions: Vec<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItemDraft>,
}

/// One extracted action item, not yet persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionItemDraft {
    pub task: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: ItemPriority,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Models occasionally invent priority labels; anything unrecognized (or
/// absent) becomes the default `medium` rather than failing the whole parse.
fn lenient_priority<'de, D>(deserializer: D) -> Result<ItemPriority, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| ItemPriority::parse(s).ok())
        .unwrap_or_default())
}

#[async_trait]
pub trait TextAnalysis: Send + Sync {
    /// Run the fixed extraction instruction over a transcript.
    async fn analyze(&self, transcript: &str) -> Result<MeetingAnalysis>;

    fn name(&self) -> &'static str;

    /// Whether the client has a credential to work with.
    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_analysis() {
        let json = r#"{
            "summary": "The team reviewed the release plan.",
            "key_decisions": ["Ship on Friday"],
            "participants": ["Alice", "Bob"],
            "action_items": [
                {"task": "Update the changelog", "assignee": "Alice", "priority": "high", "due_date": "2026-08-07"},
                {"task": "Book the retro", "assignee": null, "priority": "low", "due_date": null}
            ]
        }"#;

        let analysis: MeetingAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.summary, "The team reviewed the release plan.");
        assert_eq!(analysis.key_decisions, vec!["Ship on Friday"]);
        assert_eq!(analysis.participants, vec!["Alice", "Bob"]);
        assert_eq!(analysis.action_items.len(), 2);
        assert_eq!(analysis.action_items[0].priority, ItemPriority::High);
        assert_eq!(analysis.action_items[1].assignee, None);
    }

    #[test]
    fn test_parse_minimal_analysis() {
        let json = r#"{"summary": "Short sync, nothing decided."}"#;

        let analysis: MeetingAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.key_decisions.is_empty());
        assert!(analysis.participants.is_empty());
        assert!(analysis.action_items.is_empty());
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        let json = r#"{
            "summary": "s",
            "action_items": [
                {"task": "no priority given"},
                {"task": "made-up priority", "priority": "urgent"}
            ]
        }"#;

        let analysis: MeetingAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.action_items[0].priority, ItemPriority::Medium);
        assert_eq!(analysis.action_items[1].priority, ItemPriority::Medium);
    }

    #[test]
    fn test_missing_summary_is_an_error() {
        let json = r#"{"key_decisions": []}"#;
        assert!(serde_json::from_str::<MeetingAnalysis>(json).is_err());
    }

    #[test]
    fn test_prompt_names_the_expected_fields() {
        for field in ["summary", "key_decisions", "participants", "action_items"] {
            assert!(EXTRACTION_PROMPT.contains(field), "prompt missing {}", field);
        }
    }
}
