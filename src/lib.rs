//! # bp21rename
//!
//! A Rust library for reading Indonesian *Bukti Potong PPh 21* withholding
//! slips, pulling their fields out of the rendered PDF text, and bundling
//! renamed copies of the originals into a zip archive.
//!
//! ## What this crate does
//!
//! 1. **Read text** — converts each page of a PDF to plain text and joins the
//!    pages into a [`DocumentText`].
//! 2. **Extract fields** — runs a table of regular-expression rules over the
//!    text and produces a [`FieldRecord`] that always covers every [`Field`]
//!    in the catalog.
//! 3. **Synthesize filenames** — turns a record and an ordered
//!    [`FieldSelection`] into a filesystem-safe name such as
//!    `BP21_2500ABC12_BUDI SANTOSO.pdf`.
//! 4. **Write the archive** — stores every original PDF, byte for byte, under
//!    its new name.
//!
//! ## Quick example
//!
//! ```no_run
//! use bp21rename::{
//!     build_archive, plan_entries, DocumentBatch, FieldExtractor, FieldSelection,
//!     LopdfTextSource, RenameConfig,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RenameConfig::default();
//! let inputs = vec![("slip.pdf".to_string(), std::fs::read("slip.pdf")?)];
//!
//! let batch = DocumentBatch::process(
//!     inputs,
//!     &LopdfTextSource,
//!     &FieldExtractor::new(),
//!     &config,
//! )?;
//!
//! let selection: FieldSelection = "nomor,nama-penerima".parse()?;
//! let entries = plan_entries(&batch, &selection, &config)?;
//! std::fs::write("bp21_renamed.zip", build_archive(&entries, &config)?)?;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod archive;
mod batch;
mod catalog;
mod extractor;
mod filename;
mod rules;
mod text;

pub use archive::{build_archive, plan_entries, write_archive, ArchiveEntry};
pub use batch::{BatchItem, BatchSummary, DocumentBatch, Extraction};
pub use catalog::{Field, FieldRecord, UNKNOWN_NAME};
pub use extractor::FieldExtractor;
pub use filename::{sanitize, synthesize, FieldSelection};
pub use rules::{FieldRule, GroupMember, GroupRule, PostProcess, Scope, Section, Template};
pub use text::{DocumentText, LopdfTextSource, PageTextSource};

/// Default archive name used by the command-line tool.
pub const DEFAULT_ARCHIVE_NAME: &str = "bp21_renamed.zip";

// ── Configuration ────────────────────────────────────────────────────────────

/// How [`plan_entries`] treats two documents that synthesize the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the first name as-is and append `_2`, `_3`, … before `.pdf` on
    /// later collisions.
    #[default]
    Number,

    /// Abort the batch with [`RenameError::DuplicateEntry`].
    Reject,
}

/// Compression applied to archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

/// Runtime configuration shared by the text reader, the filename synthesizer
/// and the archive writer.
#[derive(Debug, Clone)]
pub struct RenameConfig {
    /// Literal token placed at the start of every synthesized filename.
    pub prefix: String,

    /// Token substituted when a selected field is absent from a record.
    pub missing_placeholder: String,

    /// Collision handling for identical synthesized names.
    pub duplicates: DuplicatePolicy,

    /// Compression method for archive entries.
    pub compression: Compression,

    /// If set, PDFs larger than this many bytes are not parsed; the document
    /// is reported as failed and the batch continues.
    pub max_document_size: Option<usize>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix: "BP21".into(),
            missing_placeholder: "NA".into(),
            duplicates: DuplicatePolicy::default(),
            compression: Compression::default(),
            max_document_size: None,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum RenameError {
    /// A filesystem I/O error occurred (e.g. when reading an upload or
    /// writing the archive).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying lopdf parser could not load the document.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// The zip writer failed; the whole batch is aborted.
    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    /// No documents were supplied.
    #[error("No documents to process")]
    EmptyBatch,

    /// Two documents produced the same archive entry name and the
    /// configured policy is [`DuplicatePolicy::Reject`].
    #[error("Duplicate archive entry name '{0}'")]
    DuplicateEntry(String),

    /// A document exceeds the configured `max_document_size` limit.
    #[error("Document '{name}' is {size} bytes, above the limit of {max} bytes")]
    DocumentTooLarge { name: String, size: usize, max: usize },

    /// A custom rule was built from a pattern that does not compile.
    #[error("Invalid field pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A field name in a selection is not part of the catalog.
    #[error("Unknown field '{0}' (run `bp21rename fields` for the catalog)")]
    UnknownField(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RenameError>;
