//! Transcript summarization with a generative backend and a deterministic fallback.
//!
//! Three tiers: strict JSON from the model, regex extraction from a malformed
//! model response, and a pure heuristic over the transcript itself. Whatever
//! happens upstream, callers always get a well-formed [`SummaryResult`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::language::Language;

mod heuristic;
mod ollama;

pub use heuristic::HeuristicSummarizer;
pub use ollama::OllamaClient;

use anyhow::Result;

/// Tasks text used when no task could be extracted.
pub const NO_TASKS_PLACEHOLDER: &str = "No explicit tasks detected.";

/// Summary and task list for one transcript. `tasks` is newline-delimited and
/// never absent; it may carry the placeholder text instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub tasks: String,
}

/// Which strategy produced the raw material for a result.
enum Strategy {
    /// The generative model answered; `raw` is its unparsed response.
    Generative { raw: String },
    /// Model disabled or invocation failed; work from the transcript alone.
    Heuristic,
}

/// Shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct ModelPayload {
    #[serde(default)]
    summary: String,
    tasks: Option<serde_json::Value>,
}

pub struct SummarizationEngine {
    client: Option<OllamaClient>,
    heuristic: HeuristicSummarizer,
}

impl SummarizationEngine {
    pub fn new(client: Option<OllamaClient>) -> Result<Self> {
        Ok(Self {
            client,
            heuristic: HeuristicSummarizer::new()?,
        })
    }

    /// Summarize a transcript. Never fails: a dead model, a garbage response,
    /// and an empty transcript all degrade to weaker strategies instead.
    pub async fn summarize(&self, transcript: &str, language: Language) -> SummaryResult {
        match self.select_strategy(transcript, language).await {
            Strategy::Generative { raw } => self.parse_generative(&raw),
            Strategy::Heuristic => self.heuristic.summarize(transcript, language),
        }
    }

    async fn select_strategy(&self, transcript: &str, language: Language) -> Strategy {
        let Some(client) = &self.client else {
            debug!("Generative model not configured, using heuristic summarizer");
            return Strategy::Heuristic;
        };

        let prompt = build_prompt(transcript, language);
        match client.generate(&prompt).await {
            Ok(raw) => Strategy::Generative { raw },
            Err(e) => {
                warn!("Generative summarization failed, falling back to heuristic: {:#}", e);
                Strategy::Heuristic
            }
        }
    }

    /// Parse the model response as the requested JSON object; on any shape
    /// mismatch, extract what we can from the raw text instead.
    fn parse_generative(&self, raw: &str) -> SummaryResult {
        match serde_json::from_str::<ModelPayload>(raw) {
            Ok(payload) => SummaryResult {
                summary: payload.summary.trim().to_string(),
                tasks: tasks_to_text(payload.tasks).trim().to_string(),
            },
            Err(e) => {
                debug!("Model response is not the requested JSON ({}), extracting by rule", e);
                self.extract_from_text(raw)
            }
        }
    }

    /// Regex-style extraction from a malformed model response: first three
    /// sentences as summary, bullet-ish lines as tasks.
    fn extract_from_text(&self, raw: &str) -> SummaryResult {
        let summary = self
            .heuristic
            .split_sentences(raw)
            .iter()
            .take(3)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let mut tasks: Vec<String> = Vec::new();
        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('-') || trimmed.starts_with('*') || trimmed.contains('-') {
                tasks.push(trimmed.trim_start_matches(['-', '*', ' ']).trim().to_string());
            }
        }

        let tasks = if tasks.is_empty() {
            NO_TASKS_PLACEHOLDER.to_string()
        } else {
            tasks.join("\n")
        };

        SummaryResult { summary, tasks }
    }
}

/// Normalize the model's `tasks` field: arrays become one task per line,
/// anything else is stringified.
fn tasks_to_text(tasks: Option<serde_json::Value>) -> String {
    match tasks {
        None => String::new(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) => s.to_string(),
                None => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn build_prompt(transcript: &str, language: Language) -> String {
    let language_name = match language {
        Language::En => "English",
        Language::Es => "Spanish",
    };
    format!(
        "You are an assistant that summarizes meeting transcripts in {language_name}.\n\
         Given the transcript below, produce a JSON object with fields:\n\
         - summary: a concise {language_name} summary (3-6 sentences).\n\
         - tasks: an array of task strings (short), include assignee/deadline if present.\n\
         \n\
         Transcript:\n\
         {transcript}\n\
         \n\
         Return ONLY valid JSON, nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SummarizationEngine {
        SummarizationEngine::new(None).unwrap()
    }

    #[tokio::test]
    async fn test_no_client_uses_heuristic() {
        let e = engine();
        let result = e
            .summarize(
                "We will finish the report by Friday. John will send the slides.",
                Language::En,
            )
            .await;

        assert_eq!(
            result.summary,
            "We will finish the report by Friday. John will send the slides."
        );
        assert_eq!(
            result.tasks,
            "We will finish the report by Friday.\nJohn will send the slides."
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_never_fails() {
        let e = engine();
        let result = e.summarize("", Language::Es).await;
        assert_eq!(result.summary, "");
        assert_eq!(result.tasks, NO_TASKS_PLACEHOLDER);
    }

    #[test]
    fn test_parse_valid_json() {
        let e = engine();
        let raw = r#"{"summary": "  Short recap.  ", "tasks": ["Ship it", "Call Ana"]}"#;
        let result = e.parse_generative(raw);
        assert_eq!(result.summary, "Short recap.");
        assert_eq!(result.tasks, "Ship it\nCall Ana");
    }

    #[test]
    fn test_parse_json_with_scalar_tasks() {
        let e = engine();
        let result = e.parse_generative(r#"{"summary": "Recap.", "tasks": "Just one"}"#);
        assert_eq!(result.tasks, "Just one");

        let result = e.parse_generative(r#"{"summary": "Recap.", "tasks": 3}"#);
        assert_eq!(result.tasks, "3");
    }

    #[test]
    fn test_parse_json_with_non_string_array_items() {
        let e = engine();
        let result = e.parse_generative(r#"{"summary": "Recap.", "tasks": ["a", 2]}"#);
        assert_eq!(result.tasks, "a\n2");
    }

    #[test]
    fn test_parse_json_missing_fields() {
        let e = engine();
        let result = e.parse_generative("{}");
        assert_eq!(result.summary, "");
        // Empty tasks from a well-formed response stays empty, no placeholder.
        assert_eq!(result.tasks, "");

        let result = e.parse_generative(r#"{"summary": "Recap.", "tasks": []}"#);
        assert_eq!(result.tasks, "");
    }

    #[test]
    fn test_parse_invalid_json_extracts_sentences_and_bullets() {
        let e = engine();
        let raw = "Here is the recap. Alice agreed. Bob disagreed. More detail.\n- fix the build\n* update docs";
        let result = e.parse_generative(raw);
        assert_eq!(result.summary, "Here is the recap. Alice agreed. Bob disagreed.");
        assert_eq!(result.tasks, "fix the build\nupdate docs");
    }

    #[test]
    fn test_parse_invalid_json_hyphen_line_counts_as_task() {
        let e = engine();
        let result = e.parse_generative("Plan review went fine. The follow-up is scheduled.");
        assert_eq!(result.tasks, "Plan review went fine. The follow-up is scheduled.");
    }

    #[test]
    fn test_parse_invalid_json_without_bullets_uses_placeholder() {
        let e = engine();
        let result = e.parse_generative("Nothing structured here. Just prose.");
        assert_eq!(result.summary, "Nothing structured here. Just prose.");
        assert_eq!(result.tasks, NO_TASKS_PLACEHOLDER);
    }

    #[test]
    fn test_non_object_json_falls_back_to_extraction() {
        let e = engine();
        let result = e.parse_generative(r#"["not", "an", "object"]"#);
        assert_eq!(result.tasks, NO_TASKS_PLACEHOLDER);
    }

    #[test]
    fn test_prompt_names_language_and_transcript() {
        let prompt = build_prompt("hola equipo", Language::Es);
        assert!(prompt.contains("in Spanish"));
        assert!(prompt.contains("hola equipo"));
        assert!(prompt.contains("Return ONLY valid JSON"));

        let prompt = build_prompt("hello team", Language::En);
        assert!(prompt.contains("in English"));
    }

    #[test]
    fn test_tasks_to_text_shapes() {
        assert_eq!(tasks_to_text(None), "");
        assert_eq!(
            tasks_to_text(Some(serde_json::json!(["a", "b"]))),
            "a\nb"
        );
        assert_eq!(tasks_to_text(Some(serde_json::json!("scalar"))), "scalar");
        assert_eq!(tasks_to_text(Some(serde_json::json!(7))), "7");
    }
}
