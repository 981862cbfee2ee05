//! PDF-to-text collaborator and the joined document text it produces.

use crate::Result;
use lopdf::Document;
use std::fmt;
use tracing::debug;

// ── DocumentText ─────────────────────────────────────────────────────────────

/// Plain text of a whole document: page texts in page order, joined by `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText(String);

impl DocumentText {
    /// Join page texts, skipping pages that produced no text or only
    /// whitespace.
    ///
    /// ```
    /// use bp21rename::DocumentText;
    /// let text = DocumentText::from_pages([Some("one".into()), None, Some(" \n ".into()), Some("two".into())]);
    /// assert_eq!(text.as_str(), "one\ntwo");
    /// ```
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let pages: Vec<String> = pages
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        Self(pages.join("\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for empty or whitespace-only text (typically a scanned PDF
    /// without a text layer).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for DocumentText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for DocumentText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for DocumentText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── PageTextSource ───────────────────────────────────────────────────────────

/// Converts PDF bytes into one text entry per page.
///
/// `None` marks a page without extractable text. An `Err` means the document
/// as a whole could not be read.
pub trait PageTextSource {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<Option<String>>>;

    /// Read every page and join the results into a [`DocumentText`].
    fn document_text(&self, pdf: &[u8]) -> Result<DocumentText> {
        Ok(DocumentText::from_pages(self.page_texts(pdf)?))
    }
}

/// [`PageTextSource`] backed by lopdf's content-stream text extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextSource;

impl PageTextSource for LopdfTextSource {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<Option<String>>> {
        let document = Document::load_mem(pdf)?;
        let pages = document.get_pages();

        let texts = pages
            .keys()
            .map(|&page_number| match document.extract_text(&[page_number]) {
                Ok(text) => Some(text),
                Err(e) => {
                    debug!(page = page_number, error = %e, "page has no extractable text");
                    None
                }
            })
            .collect();

        Ok(texts)
    }
}
