//! Deterministic summary and task extraction.
//!
//! Used whenever the generative backend is disabled or unreachable, so it must
//! accept any transcript (including empty) without failing.

use anyhow::Result;
use regex::Regex;

use super::{SummaryResult, NO_TASKS_PLACEHOLDER};
use crate::language::Language;

const KEYWORDS_EN: &[&str] = &[
    "todo",
    "action",
    "action item",
    "task",
    "follow up",
    "assign",
    "deadline",
];

const KEYWORDS_ES: &[&str] = &[
    "pendiente",
    "tarea",
    "accion",
    "acción",
    "seguir",
    "asignar",
    "fecha límite",
    "plazo",
];

const MODAL_PHRASES_EN: &[&str] = &["will", "we will", "need to", "assign", "deadline", "please"];
const MODAL_PHRASES_ES: &[&str] = &["hará", "haremos", "necesitamos", "asignar", "debería", "plazo"];

/// Most action sentences the modal scan will collect.
const MODAL_SENTENCE_CAP: usize = 6;

/// Characters of raw transcript used as the summary when no sentences exist.
const SUMMARY_CHAR_FALLBACK: usize = 500;

pub struct HeuristicSummarizer {
    sentence_end: Regex,
}

impl HeuristicSummarizer {
    pub fn new() -> Result<Self> {
        // Terminal punctuation followed by whitespace; the punctuation stays
        // with the sentence before it.
        let sentence_end = Regex::new(r"[.!?]\s+")?;
        Ok(Self { sentence_end })
    }

    /// Split text into sentences at terminal punctuation + whitespace.
    /// Text without any boundary is a single sentence; whitespace-only text
    /// yields none.
    pub fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in self.sentence_end.find_iter(text) {
            // The match begins at the single punctuation byte.
            sentences.push(&text[start..boundary.start() + 1]);
            start = boundary.end();
        }
        if start < text.len() {
            sentences.push(&text[start..]);
        }

        sentences
    }

    /// Summary: first four sentences, or the first 500 characters when the
    /// transcript has no sentences. Tasks: keyword-matched lines, then up to
    /// six modal-phrase sentences, then the placeholder.
    pub fn summarize(&self, transcript: &str, language: Language) -> SummaryResult {
        let sentences = self.split_sentences(transcript);

        let mut summary = sentences
            .iter()
            .take(4)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if summary.is_empty() {
            summary = transcript
                .chars()
                .take(SUMMARY_CHAR_FALLBACK)
                .collect::<String>()
                .trim()
                .to_string();
        }

        let keywords = match language {
            Language::En => KEYWORDS_EN,
            Language::Es => KEYWORDS_ES,
        };

        let mut tasks: Vec<String> = Vec::new();
        for line in transcript.lines() {
            let lower = line.to_lowercase();
            if keywords.iter().any(|kw| lower.contains(kw)) {
                tasks.push(line.trim().to_string());
            }
        }

        if tasks.is_empty() {
            let phrases = match language {
                Language::En => MODAL_PHRASES_EN,
                Language::Es => MODAL_PHRASES_ES,
            };
            for sentence in &sentences {
                let lower = sentence.to_lowercase();
                if phrases.iter().any(|phrase| lower.contains(phrase)) {
                    tasks.push(sentence.trim().to_string());
                }
                if tasks.len() >= MODAL_SENTENCE_CAP {
                    break;
                }
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
