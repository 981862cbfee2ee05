use crate::{
    DocumentText, FieldExtractor, FieldRecord, PageTextSource, RenameConfig, RenameError, Result,
};
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

// ── Extraction ───────────────────────────────────────────────────────────────

/// Per-document result of the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Text was found and the record reflects it.
    Extracted(FieldRecord),

    /// The PDF opened but no page had text (usually a scan). The record holds
    /// defaults only.
    Unreadable(FieldRecord),

    /// The PDF could not be read at all. The rest of the batch is unaffected.
    Failed { reason: String },
}

impl Extraction {
    /// Short label for status tables.
    pub fn label(&self) -> &'static str {
        match self {
            Extraction::Extracted(_) => "ok",
            Extraction::Unreadable(_) => "no text",
            Extraction::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed { .. })
    }
}

// ── BatchItem ────────────────────────────────────────────────────────────────

/// One uploaded document: its original name and bytes plus the extraction
/// outcome.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub original_name: String,
    pub bytes: Vec<u8>,
    pub outcome: Extraction,
}

impl BatchItem {
    /// The record used for naming. Failed documents are named from an
    /// all-default record so their bytes still reach the archive.
    pub fn record(&self) -> Cow<'_, FieldRecord> {
        match &self.outcome {
            Extraction::Extracted(record) | Extraction::Unreadable(record) => Cow::Borrowed(record),
            Extraction::Failed { .. } => Cow::Owned(FieldRecord::defaults()),
        }
    }

    /// Whether the document goes into the archive. An input that failed
    /// without any bytes (it could not be read from disk) has nothing to
    /// store.
    pub fn archivable(&self) -> bool {
        !(self.bytes.is_empty() && self.outcome.is_failed())
    }
}

// ── DocumentBatch ────────────────────────────────────────────────────────────

/// Counts of each [`Extraction`] outcome in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub extracted: usize,
    pub unreadable: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.extracted + self.unreadable + self.failed
    }
}

/// Uploaded documents in upload order, each with its extraction outcome.
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    items: Vec<BatchItem>,
}

impl DocumentBatch {
    /// Extract every `(original_name, bytes)` input, one after another.
    ///
    /// A document that cannot be read, is above
    /// [`RenameConfig::max_document_size`], or makes the text source panic
    /// is recorded as [`Extraction::Failed`]; processing continues with the
    /// next document. Only an empty input is an error.
    pub fn process<I, S>(
        inputs: I,
        source: &S,
        extractor: &FieldExtractor,
        config: &RenameConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
        S: PageTextSource + ?Sized,
    {
        Self::process_loaded(
            inputs.into_iter().map(|(name, bytes)| (name, Ok(bytes))),
            source,
            extractor,
            config,
        )
    }

    /// Like [`DocumentBatch::process`], for inputs whose bytes may have
    /// failed to load. A read error becomes an [`Extraction::Failed`] item
    /// with no bytes, which keeps it in the status table but out of the
    /// archive.
    pub fn process_loaded<I, S>(
        inputs: I,
        source: &S,
        extractor: &FieldExtractor,
        config: &RenameConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, std::io::Result<Vec<u8>>)>,
        S: PageTextSource + ?Sized,
    {
        let items: Vec<BatchItem> = inputs
            .into_iter()
            .map(|(original_name, loaded)| match loaded {
                Ok(bytes) => {
                    let outcome = extract_one(&original_name, &bytes, source, extractor, config);
                    BatchItem {
                        original_name,
                        bytes,
                        outcome,
                    }
                }
                Err(e) => {
                    let err = RenameError::from(e);
                    warn!(document = %original_name, error = %err, "cannot read input");
                    BatchItem {
                        original_name,
                        bytes: Vec::new(),
                        outcome: Extraction::Failed {
                            reason: err.to_string(),
                        },
                    }
                }
            })
            .collect();

        if items.is_empty() {
            return Err(RenameError::EmptyBatch);
        }

        let batch = Self { items };
        let summary = batch.summary();
        info!(
            total = summary.total(),
            extracted = summary.extracted,
            unreadable = summary.unreadable,
            failed = summary.failed,
            "batch processed"
        );
        Ok(batch)
    }

    /// Assemble a batch from already-processed items.
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for item in &self.items {
            match item.outcome {
                Extraction::Extracted(_) => summary.extracted += 1,
                Extraction::Unreadable(_) => summary.unreadable += 1,
                Extraction::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a DocumentBatch {
    type Item = &'a BatchItem;
    type IntoIter = std::slice::Iter<'a, BatchItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn extract_one<S>(
    name: &str,
    bytes: &[u8],
    source: &S,
    extractor: &FieldExtractor,
    config: &RenameConfig,
) -> Extraction
where
    S: PageTextSource + ?Sized,
{
    if let Some(max) = config.max_document_size {
        if bytes.len() > max {
            let err = RenameError::DocumentTooLarge {
                name: name.to_string(),
                size: bytes.len(),
                max,
            };
            warn!(document = name, "{err}");
            return Extraction::Failed {
                reason: err.to_string(),
            };
        }
    }

    let text: Result<DocumentText> =
        match panic::catch_unwind(AssertUnwindSafe(|| source.document_text(bytes))) {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(document = name, reason = %reason, "text extraction panicked");
                return Extraction::Failed { reason };
            }
        };

    match text {
        Err(e) => {
            warn!(document = name, error = %e, "skipping unreadable PDF");
            Extraction::Failed {
                reason: e.to_string(),
            }
        }
        Ok(text) if text.is_blank() => {
            warn!(document = name, "no extractable text; fields left at defaults");
            Extraction::Unreadable(extractor.extract(&text))
        }
        Ok(text) => Extraction::Extracted(extractor.extract(&text)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("text extraction panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("text extraction panicked: {s}")
    } else {
        "text extraction panicked".into()
    }
}
