use crate::RenameError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel stored in [`Field::RecipientName`] when no name could be read.
pub const UNKNOWN_NAME: &str = "TANPA NAMA";

// ── Field ────────────────────────────────────────────────────────────────────

/// One entry of the field catalog.
///
/// Variants are declared in catalog order, which is also the column order of
/// a [`FieldRecord`] and the order used by `bp21rename fields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    SlipNumber,
    TaxPeriod,
    WithholdingNature,
    CorrectionStatus,
    RecipientId,
    RecipientName,
    RecipientNitku,
    FacilityType,
    TaxObjectCode,
    TaxObjectName,
    GrossIncome,
    TaxBasePercent,
    TaxRate,
    WithheldAmount,
    ReferenceDocumentType,
    ReferenceDocumentDate,
    ReferenceDocumentNumber,
    AgentId,
    AgentNitku,
    AgentName,
    AgentDate,
    SignatoryName,
}

impl Field {
    /// Every catalog entry, in catalog order.
    pub const ALL: [Field; 22] = [
        Field::SlipNumber,
        Field::TaxPeriod,
        Field::WithholdingNature,
        Field::CorrectionStatus,
        Field::RecipientId,
        Field::RecipientName,
        Field::RecipientNitku,
        Field::FacilityType,
        Field::TaxObjectCode,
        Field::TaxObjectName,
        Field::GrossIncome,
        Field::TaxBasePercent,
        Field::TaxRate,
        Field::WithheldAmount,
        Field::ReferenceDocumentType,
        Field::ReferenceDocumentDate,
        Field::ReferenceDocumentNumber,
        Field::AgentId,
        Field::AgentNitku,
        Field::AgentName,
        Field::AgentDate,
        Field::SignatoryName,
    ];

    /// Column label as printed on the slip.
    pub fn key(self) -> &'static str {
        match self {
            Field::SlipNumber => "NOMOR",
            Field::TaxPeriod => "MASA PAJAK",
            Field::WithholdingNature => "SIFAT PEMOTONGAN",
            Field::CorrectionStatus => "STATUS BUKTI PEMOTONGAN",
            Field::RecipientId => "NIK/NPWP PENERIMA PENGHASILAN",
            Field::RecipientName => "NAMA PENERIMA PENGHASILAN",
            Field::RecipientNitku => "NITKU PENERIMA PENGHASILAN",
            Field::FacilityType => "JENIS FASILITAS",
            Field::TaxObjectCode => "KODE OBJEK PAJAK",
            Field::TaxObjectName => "OBJEK PAJAK",
            Field::GrossIncome => "PENGHASILAN BRUTO",
            Field::TaxBasePercent => "DPP (%)",
            Field::TaxRate => "TARIF (%)",
            Field::WithheldAmount => "PPh DIPOTONG (Rp)",
            Field::ReferenceDocumentType => "JENIS DOKUMEN",
            Field::ReferenceDocumentDate => "TANGGAL DOKUMEN",
            Field::ReferenceDocumentNumber => "NOMOR DOKUMEN",
            Field::AgentId => "NPWP/NIK PEMOTONG",
            Field::AgentNitku => "NITKU PEMOTONG",
            Field::AgentName => "NAMA PEMOTONG",
            Field::AgentDate => "TANGGAL PEMOTONG",
            Field::SignatoryName => "NAMA PENANDATANGAN",
        }
    }

    /// Short token accepted on the command line (`--fields nomor,nama-penerima`).
    pub fn slug(self) -> &'static str {
        match self {
            Field::SlipNumber => "nomor",
            Field::TaxPeriod => "masa-pajak",
            Field::WithholdingNature => "sifat",
            Field::CorrectionStatus => "status",
            Field::RecipientId => "npwp-penerima",
            Field::RecipientName => "nama-penerima",
            Field::RecipientNitku => "nitku-penerima",
            Field::FacilityType => "fasilitas",
            Field::TaxObjectCode => "kode-objek",
            Field::TaxObjectName => "objek-pajak",
            Field::GrossIncome => "bruto",
            Field::TaxBasePercent => "dpp",
            Field::TaxRate => "tarif",
            Field::WithheldAmount => "pph",
            Field::ReferenceDocumentType => "jenis-dokumen",
            Field::ReferenceDocumentDate => "tanggal-dokumen",
            Field::ReferenceDocumentNumber => "nomor-dokumen",
            Field::AgentId => "npwp-pemotong",
            Field::AgentNitku => "nitku-pemotong",
            Field::AgentName => "nama-pemotong",
            Field::AgentDate => "tanggal-pemotong",
            Field::SignatoryName => "penandatangan",
        }
    }

    /// Value stored when no rule matched.
    pub fn default_value(self) -> &'static str {
        match self {
            Field::RecipientName => UNKNOWN_NAME,
            _ => "",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = RenameError;

    /// Accepts either the column label or the slug, ignoring ASCII case.
    ///
    /// ```
    /// use bp21rename::Field;
    /// assert_eq!("nama-penerima".parse::<Field>().unwrap(), Field::RecipientName);
    /// assert_eq!("Masa Pajak".parse::<Field>().unwrap(), Field::TaxPeriod);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.slug().eq_ignore_ascii_case(wanted) || f.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RenameError::UnknownField(wanted.to_string()))
    }
}

// ── FieldRecord ──────────────────────────────────────────────────────────────

/// Extracted values for one document, keyed by [`Field`] in catalog order.
///
/// Records produced by [`crate::FieldExtractor`] always hold every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    values: BTreeMap<Field, String>,
}

impl FieldRecord {
    /// An empty record with no keys at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A complete record where every field holds its default value.
    pub fn defaults() -> Self {
        let values = Field::ALL
            .into_iter()
            .map(|f| (f, f.default_value().to_string()))
            .collect();
        Self { values }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// `(field, value)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `true` when every field in the catalog is present.
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| self.values.contains_key(f))
    }

    /// `true` when every value equals its catalog default, i.e. nothing was
    /// read from the document.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|(f, v)| v == f.default_value())
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}
