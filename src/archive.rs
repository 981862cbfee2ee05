use crate::{
    synthesize, Compression, DocumentBatch, DuplicatePolicy, FieldSelection, RenameConfig,
    RenameError, Result,
};
use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── ArchiveEntry ─────────────────────────────────────────────────────────────

/// A document paired with the name it will have inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry<'a> {
    /// Entry name: the synthesized filename, numbered if it collided.
    pub name: String,
    pub original_name: &'a str,
    /// The uploaded bytes, stored unmodified.
    pub bytes: &'a [u8],
}

/// Name every archivable document in `batch`, in batch order. Inputs that
/// could not be read at all (see [`crate::BatchItem::archivable`]) get no entry.
///
/// Names are compared case-insensitively. On a collision,
/// [`DuplicatePolicy::Number`] keeps the first document's name and turns the
/// later ones into `…_2.pdf`, `…_3.pdf` (skipping any name already taken);
/// [`DuplicatePolicy::Reject`] fails with [`RenameError::DuplicateEntry`].
pub fn plan_entries<'a>(
    batch: &'a DocumentBatch,
    selection: &FieldSelection,
    config: &RenameConfig,
) -> Result<Vec<ArchiveEntry<'a>>> {
    let mut taken: HashSet<String> = HashSet::with_capacity(batch.len());
    let mut entries = Vec::with_capacity(batch.len());

    for item in batch.iter().filter(|item| item.archivable()) {
        let wanted = synthesize(&item.record(), selection, config);

        let name = if taken.contains(&wanted.to_lowercase()) {
            match config.duplicates {
                DuplicatePolicy::Reject => return Err(RenameError::DuplicateEntry(wanted)),
                DuplicatePolicy::Number => {
                    let numbered = next_free_name(&wanted, &taken);
                    debug!(
                        document = %item.original_name,
                        from = %wanted,
                        to = %numbered,
                        "renamed duplicate entry"
                    );
                    numbered
                }
            }
        } else {
            wanted
        };

        taken.insert(name.to_lowercase());
        entries.push(ArchiveEntry {
            name,
            original_name: &item.original_name,
            bytes: &item.bytes,
        });
    }

    Ok(entries)
}

/// Write `entries` as a zip archive into `writer` and hand the writer back.
///
/// Any failure aborts the whole archive.
pub fn write_archive<W: Write + Seek>(
    entries: &[ArchiveEntry<'_>],
    writer: W,
    config: &RenameConfig,
) -> Result<W> {
    let method = match config.compression {
        Compression::Deflated => CompressionMethod::Deflated,
        Compression::Stored => CompressionMethod::Stored,
    };
    let options = SimpleFileOptions::default().compression_method(method);

    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        zip.write_all(entry.bytes)?;
    }
    let writer = zip.finish()?;

    info!(entries = entries.len(), "archive written");
    Ok(writer)
}

/// [`write_archive`] into an in-memory buffer.
pub fn build_archive(entries: &[ArchiveEntry<'_>], config: &RenameConfig) -> Result<Vec<u8>> {
    let cursor = write_archive(entries, Cursor::new(Vec::new()), config)?;
    Ok(cursor.into_inner())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn next_free_name(name: &str, taken: &HashSet<String>) -> String {
    let stem = name.strip_suffix(".pdf").unwrap_or(name);
    (2..)
        .map(|n| format!("{stem}_{n}.pdf"))
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| name.to_string())
}
