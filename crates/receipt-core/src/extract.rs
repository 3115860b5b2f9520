//! PDF text extraction
//!
//! Walks the page tree in ascending page order and, within each page, the
//! content stream's text-showing operators (`Tj`, `TJ`, `'`, `"`) in stream
//! order. Every operator is one text run. Runs are trimmed and each is
//! followed by a single space. Nothing is sorted, merged or deduplicated,
//! because the field rules depend on labels and values staying adjacent.
//!
//! String operands are decoded with the ToUnicode map or encoding of the
//! font selected by the last `Tf`. Strings shown while no known font is
//! selected are decoded as UTF-16BE when they carry a byte order mark,
//! otherwise as UTF-8 with a Latin-1 fallback.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::font::{decode_raw, FontDecoder};
use crate::types::{ExtractedText, RawDocument};

/// Text extraction settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// A `TJ` adjustment below minus this many thousandths of an em is read
    /// as a word gap and becomes a space inside the run
    pub word_gap_threshold: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            word_gap_threshold: 100.0,
        }
    }
}

/// Turns receipt PDFs into a single ordered text stream
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    config: ExtractorConfig,
}

impl TextExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract the text of every page, in page order
    ///
    /// # Errors
    /// - `ExtractError::Parse` - the bytes are not a readable PDF or it has no pages
    /// - `ExtractError::Render` - a page's content stream or text cannot be decoded
    pub fn extract_text(&self, document: RawDocument) -> Result<ExtractedText, ExtractError> {
        if document.is_empty() {
            return Err(ExtractError::Parse("empty document".to_string()));
        }

        let doc = Document::load_mem(document.as_bytes())
            .map_err(|e| ExtractError::Parse(e.to_string()))?;
        drop(document);

        // BTreeMap keyed by page number, so iteration is 1..N
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ExtractError::Parse("document has no pages".to_string()));
        }
        debug!(page_count = pages.len(), "Extracting receipt text");

        let mut text = ExtractedText::default();
        for (&page_number, &page_id) in pages.iter() {
            for run in self.page_runs(&doc, page_number, page_id)? {
                text.push_run(&run);
            }
        }

        Ok(text)
    }

    /// Text runs of one page in content stream order
    pub fn page_runs(
        &self,
        doc: &Document,
        page_number: u32,
        page_id: ObjectId,
    ) -> Result<Vec<String>, ExtractError> {
        let render_error = |message: String| ExtractError::Render {
            page: page_number,
            message,
        };

        let content = doc
            .get_page_content(page_id)
            .map_err(|e| render_error(e.to_string()))?;
        let operations = Content::decode(&content)
            .map_err(|e| render_error(e.to_string()))?
            .operations;

        let fonts: BTreeMap<Vec<u8>, FontDecoder> = doc
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, FontDecoder::from_font(doc, font)))
            .collect();

        let mut font = None;
        let mut runs = Vec::new();
        for op in &operations {
            match op.operator.as_str() {
                "Tf" => {
                    font = op
                        .operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| fonts.get(name));
                }
                // `'` and `"` carry spacing operands before the string
                "Tj" | "'" | "\"" => {
                    if let Some(operand) = op.operands.last() {
                        if let Some(run) = decode_operand(font, operand).map_err(render_error)? {
                            runs.push(run);
                        }
                    }
                }
                "TJ" => {
                    if let Some(operand) = op.operands.first() {
                        runs.push(self.decode_adjusted(font, operand).map_err(render_error)?);
                    }
                }
                _ => {}
            }
        }

        Ok(runs)
    }

    /// Decode a `TJ` array of strings and kerning adjustments
    fn decode_adjusted(
        &self,
        font: Option<&FontDecoder>,
        operand: &Object,
    ) -> Result<String, String> {
        let Object::Array(items) = operand else {
            return Ok(decode_operand(font, operand)?.unwrap_or_default());
        };

        let mut run = String::new();
        for item in items {
            match item {
                Object::String(..) => {
                    if let Some(s) = decode_operand(font, item)? {
                        run.push_str(&s);
                    }
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = item.as_float().unwrap_or(0.0);
                    if adjustment < -self.config.word_gap_threshold {
                        run.push(' ');
                    }
                }
                _ => {}
            }
        }
        Ok(run)
    }
}

fn decode_operand(font: Option<&FontDecoder>, operand: &Object) -> Result<Option<String>, String> {
    let Object::String(bytes, _) = operand else {
        return Ok(None);
    };

    match font {
        Some(font) => font.decode(bytes).map(Some),
        None => Ok(Some(decode_raw(bytes))),
    }
}
