//! Declarative extraction rules.
//!
//! Each slip layout is described by a [`Template`]: a list of single-field
//! [`FieldRule`]s plus [`GroupRule`]s for values that only make sense when
//! read together from one line. The extractor never branches on individual
//! fields; it just walks the table.

use crate::{Field, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// ── PostProcess ──────────────────────────────────────────────────────────────

/// Transformation applied to a captured value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostProcess {
    /// Store the capture exactly as matched.
    #[default]
    Verbatim,

    /// Strip surrounding whitespace.
    Trim,

    /// Remove `.` thousands separators, then trim. Only meant for rupiah
    /// amounts printed as `12.500.000`.
    StripThousands,
}

impl PostProcess {
    /// ```
    /// use bp21rename::PostProcess;
    /// assert_eq!(PostProcess::StripThousands.apply(" 12.500.000"), "12500000");
    /// assert_eq!(PostProcess::Trim.apply("  Budi  "), "Budi");
    /// ```
    pub fn apply(self, raw: &str) -> String {
        match self {
            PostProcess::Verbatim => raw.to_string(),
            PostProcess::Trim => raw.trim().to_string(),
            PostProcess::StripThousands => raw.replace('.', "").trim().to_string(),
        }
    }
}

// ── Section / Scope ──────────────────────────────────────────────────────────

/// The lettered sections of a slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// `A. IDENTITAS PENERIMA PENGHASILAN`
    Recipient,
    /// `B. PENGHASILAN YANG DIPOTONG`
    Income,
    /// `C. IDENTITAS PEMOTONG PPh`
    Agent,
}

impl Section {
    fn start_marker(self) -> &'static str {
        match self {
            Section::Recipient => "A. IDENTITAS PENERIMA PENGHASILAN",
            Section::Income => "B. PENGHASILAN YANG DIPOTONG",
            Section::Agent => "C. IDENTITAS PEMOTONG PPh",
        }
    }

    fn end_marker(self) -> &'static str {
        match self {
            Section::Recipient => "B.",
            Section::Income => "C.",
            Section::Agent => "D.",
        }
    }

    /// Text between the section heading and the first following end marker.
    ///
    /// Markers are matched case-sensitively. If either marker is missing the
    /// section is empty.
    pub fn slice(self, text: &str) -> &str {
        let Some(start) = text.find(self.start_marker()) else {
            return "";
        };
        let body = &text[start + self.start_marker().len()..];
        match body.find(self.end_marker()) {
            Some(end) => &body[..end],
            None => "",
        }
    }
}

/// The part of the document a [`FieldRule`] searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Document,
    Section(Section),
}

impl Scope {
    fn haystack(self, text: &str) -> &str {
        match self {
            Scope::Document => text,
            Scope::Section(section) => section.slice(text),
        }
    }
}

// ── FieldRule ────────────────────────────────────────────────────────────────

/// One row of the extraction table: where to look for a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub pattern: Regex,
    /// Capture group holding the value.
    pub group: usize,
    /// Stored when the pattern misses or the processed capture is empty.
    pub default: &'static str,
    pub post: PostProcess,
    pub scope: Scope,
}

impl FieldRule {
    /// A whole-document rule reading capture group 1 verbatim, defaulting to
    /// the field's catalog default.
    pub fn new(field: Field, pattern: &str) -> Result<Self> {
        Ok(Self {
            field,
            pattern: Regex::new(pattern)?,
            group: 1,
            default: field.default_value(),
            post: PostProcess::Verbatim,
            scope: Scope::Document,
        })
    }

    /// A rule in the labelled-line style: `LABEL : value`, trimmed, searched
    /// only inside `section`.
    pub fn labelled(field: Field, section: Section, label: &str) -> Result<Self> {
        let pattern = format!(r"(?i){}\s*:\s*(.+)", regex::escape(label));
        Ok(Self::new(field, &pattern)?
            .with_post(PostProcess::Trim)
            .with_scope(Scope::Section(section)))
    }

    pub fn with_post(mut self, post: PostProcess) -> Self {
        self.post = post;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }

    /// The processed capture, or `None` on a miss.
    pub fn capture(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(self.scope.haystack(text))?;
        let value = self.post.apply(caps.get(self.group)?.as_str());
        (!value.is_empty()).then_some(value)
    }

    /// The processed capture, falling back to [`FieldRule::default`].
    pub fn resolve(&self, text: &str) -> String {
        self.capture(text)
            .unwrap_or_else(|| self.default.to_string())
    }
}

// ── GroupRule ────────────────────────────────────────────────────────────────

/// A field filled from one capture group of a [`GroupRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMember {
    pub field: Field,
    pub post: PostProcess,
}

impl GroupMember {
    pub fn new(field: Field, post: PostProcess) -> Self {
        Self { field, post }
    }
}

/// Several fields captured by one pattern. Member `i` reads capture group
/// `i + 1`. Either every member is filled from the match or none is.
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub members: Vec<GroupMember>,
}

impl GroupRule {
    pub fn new(name: &'static str, pattern: &str, members: Vec<GroupMember>) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            members,
        })
    }

    /// Values for every member, or `None` when the pattern misses or any
    /// member's group did not participate in the match.
    pub fn capture(&self, text: &str) -> Option<Vec<(Field, String)>> {
        let caps = self.pattern.captures(text)?;
        self.members
            .iter()
            .enumerate()
            .map(|(i, m)| caps.get(i + 1).map(|c| (m.field, m.post.apply(c.as_str()))))
            .collect()
    }

    /// Like [`GroupRule::capture`], but a miss yields an empty string for
    /// every member.
    pub fn resolve(&self, text: &str) -> Vec<(Field, String)> {
        self.capture(text).unwrap_or_else(|| {
            debug!(group = self.name, "combined pattern missed");
            self.blank()
        })
    }

    /// An empty string for every member.
    pub fn blank(&self) -> Vec<(Field, String)> {
        self.members
            .iter()
            .map(|m| (m.field, String::new()))
            .collect()
    }
}

// ── Template ─────────────────────────────────────────────────────────────────

/// A complete rule table for one slip layout.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: &'static str,
    /// When set, the template is only used for text this pattern matches.
    /// A template without a marker accepts any text.
    pub marker: Option<Regex>,
    pub groups: Vec<GroupRule>,
    pub rules: Vec<FieldRule>,
}

impl Template {
    pub fn accepts(&self, text: &str) -> bool {
        self.marker.as_ref().map_or(true, |m| m.is_match(text))
    }

    /// The built-in templates in priority order.
    pub fn builtin() -> Vec<Template> {
        BUILTIN.clone()
    }

    /// Colon-labelled lines inside lettered sections, the layout of the
    /// first e-Bupot releases. Selected when `SIFAT PEMOTONGAN :` appears as
    /// a labelled line.
    pub fn sectioned() -> Result<Template> {
        use Field::*;
        use Section::*;

        let labelled = [
            (WithholdingNature, Recipient, "SIFAT PEMOTONGAN"),
            (CorrectionStatus, Recipient, "STATUS BUKTI PEMOTONGAN"),
            (RecipientId, Recipient, "NIK / NPWP"),
            (RecipientName, Recipient, "NAMA"),
            (RecipientNitku, Recipient, "NOMOR IDENTITAS"),
            (FacilityType, Income, "Jenis Fasilitas"),
            (TaxObjectCode, Income, "Kode Objek Pajak"),
            (TaxObjectName, Income, "Nama Objek Pajak"),
            (GrossIncome, Income, "Penghasilan Bruto"),
            (TaxBasePercent, Income, "DPP (%)"),
            (TaxRate, Income, "Tarif (%)"),
            (WithheldAmount, Income, "PPh Dipotong"),
            (ReferenceDocumentType, Income, "Jenis Dokumen"),
            (ReferenceDocumentDate, Income, "Tanggal"),
            (ReferenceDocumentNumber, Income, "Nomor Dokumen"),
            (AgentId, Agent, "C.1 NPWP / NIK"),
            (AgentNitku, Agent, "C.2 NOMOR IDENTITAS"),
            (AgentName, Agent, "C.3 NAMA PEMOTONG"),
            (AgentDate, Agent, "C.4 TANGGAL"),
            (SignatoryName, Agent, "C.5 NAMA PENANDATANGAN"),
        ];

        let rules = labelled
            .into_iter()
            .map(|(field, section, label)| FieldRule::labelled(field, section, label))
            .collect::<Result<Vec<_>>>()?;

        Ok(Template {
            name: "sectioned",
            marker: Some(Regex::new(r"(?im)^[ \t]*SIFAT PEMOTONGAN[ \t]*:")?),
            groups: Vec::new(),
            rules,
        })
    }

    /// Header values on one line, a tabular line-item row, and numbered
    /// `A.n` / `C.n` labels elsewhere. Accepts any text, so it is the last
    /// template tried.
    pub fn tabular() -> Result<Template> {
        use Field::*;
        use PostProcess::*;

        let header = GroupRule::new(
            "header",
            r"(?i)\b([A-Z0-9]{6,20})[ \t]+(\d{2}-\d{4})[ \t]+(TIDAK[ \t]+FINAL|FINAL)[ \t]+(NORMAL|PEMBETULAN(?:[ \t]+KE-?[ \t]*\d+)?)\b",
            vec![
                GroupMember::new(SlipNumber, Verbatim),
                GroupMember::new(TaxPeriod, Verbatim),
                GroupMember::new(WithholdingNature, Verbatim),
                GroupMember::new(CorrectionStatus, Verbatim),
            ],
        )?;

        let line_item = GroupRule::new(
            "line-item",
            r"(?im)^[ \t]*(?:B\.\d+[ \t]+)?(?:\d{2}-\d{3}-\d{2}[ \t]+)?((?:Imbalan|Honorarium|Gaji|Upah|Uang|Komisi|Hadiah|Bonus|Pesangon|Tunjangan)[^\d\n]*?)[ \t]+(\d[\d.]*)[ \t]+(\d+(?:,\d+)?)[ \t]+(\d+(?:,\d+)?)[ \t]+(\d[\d.]*)",
            vec![
                GroupMember::new(TaxObjectName, Trim),
                GroupMember::new(GrossIncome, StripThousands),
                GroupMember::new(TaxBasePercent, Verbatim),
                GroupMember::new(TaxRate, Verbatim),
                GroupMember::new(WithheldAmount, StripThousands),
            ],
        )?;

        let rules = vec![
            FieldRule::new(RecipientId, r"(?i)NIK\s*/\s*NPWP[^\d\n]*(\d{15,16})")?,
            FieldRule::new(RecipientName, r"(?im)A\.3[ \t]*NAMA[ \t]*:?(.*)$")?.with_post(Trim),
            FieldRule::new(RecipientNitku, r"(?im)A\.2[ \t]*NOMOR IDENTITAS[^:\n]*:(.*)$")?
                .with_post(Trim),
            FieldRule::new(FacilityType, r"(?im)Jenis Fasilitas[ \t]*:?(.*)$")?.with_post(Trim),
            FieldRule::new(TaxObjectCode, r"\b(\d{2}-\d{3}-\d{2})\b")?,
            FieldRule::new(
                ReferenceDocumentType,
                r"(?im)Jenis Dokumen[ \t]*:[ \t]*(.+?)[ \t]*(?:Tanggal[ \t]*:|Nomor Dokumen[ \t]*:|$)",
            )?
            .with_post(Trim),
            // First "Tanggal :" in the document; on slips without a reference
            // date this lands on C.4.
            FieldRule::new(
                ReferenceDocumentDate,
                r"(?im)Tanggal[ \t]*:[ \t]*(.+?)[ \t]*(?:Nomor Dokumen[ \t]*:|$)",
            )?
            .with_post(Trim),
            FieldRule::new(ReferenceDocumentNumber, r"(?im)Nomor Dokumen[ \t]*:[ \t]*(.+?)[ \t]*$")?
                .with_post(Trim),
            FieldRule::new(AgentId, r"(?i)C\.1[ \t]*NPWP\s*/\s*NIK[^\d\n]*(\d{15,16})")?,
            FieldRule::new(AgentNitku, r"(?im)C\.2[ \t]*NOMOR IDENTITAS[^:\n]*:(.*)$")?
                .with_post(Trim),
            FieldRule::new(AgentName, r"(?im)C\.3[ \t]*NAMA PEMOTONG[ \t]*:?(.*)$")?.with_post(Trim),
            FieldRule::new(AgentDate, r"(?im)C\.4[ \t]*TANGGAL[ \t]*:?(.*)$")?.with_post(Trim),
            FieldRule::new(SignatoryName, r"(?im)C\.5[ \t]*NAMA PENANDATANGAN[ \t]*:?(.*)$")?
                .with_post(Trim),
        ];

        Ok(Template {
            name: "tabular",
            marker: None,
            groups: vec![header, line_item],
            rules,
        })
    }
}

static BUILTIN: LazyLock<Vec<Template>> = LazyLock::new(|| {
    vec![
        Template::sectioned().expect("built-in sectioned patterns compile"),
        Template::tabular().expect("built-in tabular patterns compile"),
    ]
});
