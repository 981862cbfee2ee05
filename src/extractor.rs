use crate::rules::Template;
use crate::{DocumentText, FieldRecord};
use tracing::debug;

// ── FieldExtractor ───────────────────────────────────────────────────────────

/// Turns [`DocumentText`] into a complete [`FieldRecord`].
///
/// The extractor holds an ordered list of [`Template`]s. For each document
/// the first template whose marker matches is applied; the record starts
/// from [`FieldRecord::defaults`], so every field is present even when
/// nothing matches.
///
/// Each rule keeps the first match of its pattern. A label printed more than
/// once (the slip has several `Tanggal` lines) always resolves to its first
/// occurrence, which can be the wrong one on some layouts.
///
/// ```
/// use bp21rename::{DocumentText, Field, FieldExtractor};
///
/// let text = DocumentText::from("2500ABC12 01-2025 TIDAK FINAL NORMAL\n");
/// let record = FieldExtractor::new().extract(&text);
/// assert_eq!(record.get(Field::SlipNumber), Some("2500ABC12"));
/// assert_eq!(record.get(Field::AgentName), Some(""));
/// ```
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    templates: Vec<Template>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// An extractor over the built-in slip layouts.
    pub fn new() -> Self {
        Self {
            templates: Template::builtin(),
        }
    }

    /// An extractor over custom templates, tried in the given order.
    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// The template that [`FieldExtractor::extract`] would apply, or `None`
    /// when no template accepts the text.
    pub fn template_for(&self, text: &DocumentText) -> Option<&Template> {
        self.templates.iter().find(|t| t.accepts(text.as_str()))
    }

    pub fn extract(&self, text: &DocumentText) -> FieldRecord {
        let mut record = FieldRecord::defaults();

        let Some(template) = self.template_for(text) else {
            debug!("no template accepts the document text; using defaults");
            return record;
        };
        debug!(template = template.name, "applying extraction template");

        let raw = text.as_str();

        for group in &template.groups {
            for (field, value) in group.resolve(raw) {
                record.set(field, value);
            }
        }

        for rule in &template.rules {
            record.set(rule.field, rule.resolve(raw));
        }

        record
    }
}
