//! Meeting audio to deliverables: transcript, summary, task list, archived PDF.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod document;
pub mod global;
pub mod language;
pub mod notify;
pub mod pipeline;
pub mod speech;
pub mod storage;
pub mod summarizer;
