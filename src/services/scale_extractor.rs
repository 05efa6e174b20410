use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        extraction::{ExtractedItem, ExtractedScale},
        study::ResponseType,
    },
};

const UNTITLED_SCALE: &str = "Extracted Scale";
const MAX_HEADING_CHARS: usize = 100;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("scale extraction patterns are valid regex patterns")
}

static HEADINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[A-Z\s]+$",
        r"(?i)scale\s*$",
        r"(?i)inventory",
        r"(?i)questionnaire",
        r"(?i)measure",
        r"(?i)^(the\s+)?[\w\s]+(scale|inventory|questionnaire|measure)",
    ]
    .into_iter()
    .map(regex)
    .collect()
});

static MARKED_ITEMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+[\.\)]\s+.+",
        r"(?i)^[a-z][\.\)]\s+.+",
        r"^[•‣◦⁃∙]\s+.+",
        r"^[-*]\s+.+",
    ]
    .into_iter()
    .map(regex)
    .collect()
});

static ITEM_MARKER: Lazy<Regex> = Lazy::new(|| {
    regex(r"^(?:\d+[\.\)]|[a-zA-Z][\.\)]|[•‣◦⁃∙\-*])\s*")
});

static FREQUENCY: Lazy<Regex> =
    Lazy::new(|| regex(r"(?i)how often|frequency|never.*always|times per"));
static LIKELIHOOD: Lazy<Regex> = Lazy::new(|| regex(r"(?i)how likely|likelihood|probable"));

/// Turns an uploaded document into plain text.
pub trait DocumentTextExtractor: Send + Sync {
    fn extract_text(&self, content_type: Option<&str>, bytes: &[u8]) -> AppResult<String>;
}

fn is_pdf(content_type: Option<&str>, bytes: &[u8]) -> bool {
    content_type.is_some_and(|ct| ct.contains("pdf")) || bytes.starts_with(b"%PDF")
}

/// Accepts UTF-8 text only.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextExtractor;

impl DocumentTextExtractor for PlainTextExtractor {
    fn extract_text(&self, content_type: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        if is_pdf(content_type, bytes) {
            return Err(AppError::ExtractionError(
                "PDF documents are not accepted as plain text".into(),
            ));
        }
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::ExtractionError("document is not valid UTF-8 text".into()))
    }
}

/// Reads PDF uploads through `pdf_extract`; anything else goes to [`PlainTextExtractor`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfTextExtractor {
    text: PlainTextExtractor,
}

impl DocumentTextExtractor for PdfTextExtractor {
    fn extract_text(&self, content_type: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        if !is_pdf(content_type, bytes) {
            return self.text.extract_text(content_type, bytes);
        }

        // pdf_extract panics on some malformed documents
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| AppError::ExtractionError("PDF document could not be read".into()))?;
        let text = extracted
            .map_err(|e| AppError::ExtractionError(format!("PDF text extraction failed: {}", e)))?;

        log::debug!("Extracted {} characters from PDF upload", text.len());
        Ok(text)
    }
}

fn is_marked_item(line: &str) -> bool {
    MARKED_ITEMS.iter().any(|re| re.is_match(line))
}

fn is_item(line: &str) -> bool {
    let len = line.chars().count();
    is_marked_item(line)
        || ((10..=200).contains(&len) && line.chars().next().is_some_and(char::is_uppercase))
}

fn is_heading(line: &str) -> bool {
    line.chars().count() < MAX_HEADING_CHARS
        && !is_marked_item(line)
        && HEADINGS.iter().any(|re| re.is_match(line))
}

fn clean_item(line: &str) -> String {
    ITEM_MARKER.replace(line, "").trim().to_string()
}

pub fn detect_response_type(text: &str) -> ResponseType {
    if FREQUENCY.is_match(text) {
        ResponseType::Frequency
    } else if text.ends_with('?') && text.chars().count() < 50 {
        ResponseType::YesNo
    } else if LIKELIHOOD.is_match(text) {
        ResponseType::Likelihood
    } else {
        ResponseType::Likert
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScaleExtractor;

impl ScaleExtractor {
    /// Groups item lines under the most recent scale heading.
    pub fn parse(&self, text: &str) -> Vec<ExtractedScale> {
        let mut scales: Vec<ExtractedScale> = Vec::new();
        let mut current: Option<ExtractedScale> = None;
        let mut loose_items: Vec<String> = Vec::new();
        let mut item_number = 0;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if is_heading(line) {
                if let Some(scale) = current.take().filter(|s| !s.items.is_empty()) {
                    scales.push(scale);
                }
                current = Some(ExtractedScale {
                    scale_name: line.to_string(),
                    items: Vec::new(),
                });
            } else if is_item(line) {
                let text = clean_item(line);
                match current.as_mut() {
                    Some(scale) => {
                        item_number += 1;
                        scale.items.push(ExtractedItem {
                            id: format!("item_{}", item_number),
                            response_type: detect_response_type(&text),
                            text,
                        });
                    }
                    None => loose_items.push(text),
                }
            }
        }

        if let Some(scale) = current.filter(|s| !s.items.is_empty()) {
            scales.push(scale);
        }

        if scales.is_empty() && !loose_items.is_empty() {
            scales.push(ExtractedScale {
                scale_name: UNTITLED_SCALE.to_string(),
                items: loose_items
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| ExtractedItem {
                        id: format!("item_{}", i + 1),
                        text,
                        response_type: ResponseType::Likert,
                    })
                    .collect(),
            });
        }

        log::debug!("Extracted {} scale(s) from document", scales.len());
        scales
    }

    pub fn item_count(scales: &[ExtractedScale]) -> usize {
        scales.iter().map(|s| s.items.len()).sum()
    }
}
