use crate::{Field, FieldRecord, RenameConfig, RenameError};
use std::str::FromStr;

/// Characters that are unsafe in Windows or POSIX filenames.
const UNSAFE_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

// ── FieldSelection ───────────────────────────────────────────────────────────

/// The fields that make up a filename, in left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection(Vec<Field>);

impl FieldSelection {
    pub fn new(fields: Vec<Field>) -> Self {
        Self(fields)
    }

    /// No fields: every filename is just the prefix.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The whole catalog in catalog order.
    pub fn all() -> Self {
        Self(Field::ALL.to_vec())
    }

    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Field>> for FieldSelection {
    fn from(fields: Vec<Field>) -> Self {
        Self(fields)
    }
}

impl FromStr for FieldSelection {
    type Err = RenameError;

    /// Parse a comma-separated list of slugs or column labels.
    ///
    /// ```
    /// use bp21rename::{Field, FieldSelection};
    /// let sel: FieldSelection = "nomor, NAMA PENERIMA PENGHASILAN".parse().unwrap();
    /// assert_eq!(sel.fields(), [Field::SlipNumber, Field::RecipientName]);
    /// assert!("".parse::<FieldSelection>().unwrap().is_empty());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Field::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

// ── Synthesis ────────────────────────────────────────────────────────────────

/// Replace every filesystem-unsafe character with `_`.
///
/// ```
/// assert_eq!(bp21rename::sanitize("A/B:C"), "A_B_C");
/// ```
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Build `<prefix>_<value>_<value>….pdf` from the selected fields of `record`.
///
/// The prefix is sanitized like the values. Fields missing from the record
/// are written as
/// [`RenameConfig::missing_placeholder`]. Identical inputs always give the
/// same name, so two slips with equal selected values collide; see
/// [`crate::plan_entries`] for how the archive resolves that.
pub fn synthesize(record: &FieldRecord, selection: &FieldSelection, config: &RenameConfig) -> String {
    let mut parts = Vec::with_capacity(selection.fields().len() + 1);
    parts.push(sanitize(&config.prefix));
    for &field in selection.fields() {
        let value = record
            .get(field)
            .unwrap_or(config.missing_placeholder.as_str());
        parts.push(sanitize(value));
    }
    format!("{}.pdf", parts.join("_"))
}
