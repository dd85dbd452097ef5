//! PDF composition for meeting deliverables.
//!
//! Fixed A4 layout with a descending cursor: title and metadata, then
//! Summary, Tasks / Action Items, and the (capped) transcript. Wrapping is
//! by character count, which is close enough for a body-text layout and
//! keeps composition deterministic.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::collections::BTreeMap;
use std::path::Path;

use crate::language::Language;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
/// Cursor positions closer to the bottom margin than this trigger a page break.
const PAGE_BREAK_GUARD_MM: f32 = 14.0;

const WRAP_COLUMNS: usize = 85;

const TITLE_SIZE: f32 = 16.0;
const META_SIZE: f32 = 9.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TRANSCRIPT_SIZE: f32 = 9.0;

const META_LEADING_MM: f32 = 6.0;
const BODY_LEADING_MM: f32 = 5.4;
const TRANSCRIPT_LEADING_MM: f32 = 4.5;

/// Transcript characters drawn before the document is cut off.
pub const TRANSCRIPT_CHAR_CAP: usize = 15_000;
const TRUNCATION_MARKER: &str = "\n\n[Transcript truncated]";

const DOCUMENT_TITLE: &str = "Meeting Summary";

/// A rendered meeting PDF. Written once; never mutated after composition.
pub struct MeetingDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub metadata: BTreeMap<String, String>,
    pub pages: usize,
}

/// Inputs for one composition. The timestamp comes from the caller so the
/// same inputs always produce the same document.
pub struct ComposeRequest<'a> {
    pub transcript: &'a str,
    pub summary: &'a str,
    pub tasks: &'a str,
    pub original_file: &'a str,
    pub language: Language,
    pub generated_at: DateTime<Utc>,
}

/// Tracks the active page and vertical cursor while drawing.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y_mm: f32,
    pages: usize,
}

impl<'a> Cursor<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        }
    }

    /// Draw one line at the cursor and advance. Breaks to a fresh page first
    /// when the cursor has entered the bottom guard band.
    fn draw_line(&mut self, text: &str, font: &IndirectFontRef, size: f32, leading_mm: f32) {
        if self.y_mm < MARGIN_MM + PAGE_BREAK_GUARD_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
            self.pages += 1;
        }

        if !text.is_empty() {
            self.layer
                .use_text(text, size, Mm(MARGIN_MM), Mm(self.y_mm), font);
        }
        self.y_mm -= leading_mm;
    }

    fn advance(&mut self, mm: f32) {
        self.y_mm -= mm;
    }
}

pub struct DocumentCompositor;

impl DocumentCompositor {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, request: &ComposeRequest<'_>) -> Result<MeetingDocument> {
        let (doc, page, layer) = PdfDocument::new(
            DOCUMENT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "content",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("Failed to load body font")?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("Failed to load heading font")?;

        let generated = request
            .generated_at
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string();

        let mut cursor = Cursor::new(&doc, doc.get_page(page).get_layer(layer));

        // Header
        cursor.draw_line(DOCUMENT_TITLE, &bold, TITLE_SIZE, 10.0);
        cursor.draw_line(&format!("Generated: {generated}"), &regular, META_SIZE, META_LEADING_MM);
        cursor.draw_line(
            &format!("Language: {}", request.language.as_str()),
            &regular,
            META_SIZE,
            META_LEADING_MM,
        );
        cursor.draw_line(
            &format!("Original file: {}", request.original_file),
            &regular,
            META_SIZE,
            META_LEADING_MM,
        );

        // Summary
        cursor.draw_line("Summary", &bold, HEADING_SIZE, 8.0);
        draw_paragraph(&mut cursor, request.summary, &regular, BODY_SIZE, BODY_LEADING_MM);
        cursor.advance(4.0);

        // Tasks
        cursor.draw_line("Tasks / Action Items", &bold, HEADING_SIZE, 8.0);
        draw_paragraph(&mut cursor, request.tasks, &regular, BODY_SIZE, BODY_LEADING_MM);
        cursor.advance(6.0);

        // Transcript, capped so one long meeting cannot balloon the archive
        cursor.draw_line("Full Transcript", &bold, HEADING_SIZE, 8.0);
        let transcript = truncate_transcript(request.transcript);
        draw_paragraph(
            &mut cursor,
            &transcript,
            &regular,
            TRANSCRIPT_SIZE,
            TRANSCRIPT_LEADING_MM,
        );

        let pages = cursor.pages;
        let bytes = doc.save_to_bytes().context("Failed to serialize PDF")?;

        let mut metadata = BTreeMap::new();
        metadata.insert("language".to_string(), request.language.as_str().to_string());
        metadata.insert("original_file".to_string(), request.original_file.to_string());
        metadata.insert("generated".to_string(), generated);

        Ok(MeetingDocument {
            bytes,
            file_name: output_file_name(request.original_file),
            metadata,
            pages,
        })
    }
}

impl Default for DocumentCompositor {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_paragraph(
    cursor: &mut Cursor<'_>,
    text: &str,
    font: &IndirectFontRef,
    size: f32,
    leading_mm: f32,
) {
    for line in wrap_text(text, WRAP_COLUMNS) {
        cursor.draw_line(&line, font, size, leading_mm);
    }
}

/// Split on explicit line breaks, then word-wrap each line to `width`
/// characters. Blank source lines survive as blank output lines.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in text.split('\n') {
        let wrapped = wrap_line(raw_line, width);
        if wrapped.is_empty() {
            out.push(String::new());
        } else {
            out.extend(wrapped);
        }
    }
    out
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();

        // A word that cannot fit on any line gets hard-split.
        if word_len > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(width) {
                lines.push(chunk.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Cap the transcript at [`TRANSCRIPT_CHAR_CAP`] characters, marking the cut.
fn truncate_transcript(transcript: &str) -> String {
    if transcript.chars().count() <= TRANSCRIPT_CHAR_CAP {
        return transcript.to_string();
    }
    let mut capped: String = transcript.chars().take(TRANSCRIPT_CHAR_CAP).collect();
    capped.push_str(TRUNCATION_MARKER);
    capped
}

/// `recording.wav` → `recording_summary.pdf`.
fn output_file_name(original_file: &str) -> String {
    let stem = Path::new(original_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_file);
    format!("{stem}_summary.pdf")
}
