use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Monetary fields that participate in sign handling.
pub const SERVICE_VALUE_FIELD: &str = "serviceValue";
pub const COPAYMENT_VALUE_FIELD: &str = "copaymentValue";

/// Missing-fields marker for a line that does not exist in the target at all.
pub const ABSENT_LINE_SENTINEL: &str = "*";

/// One cell of a service line. The value set is closed; the key set of a
/// line is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Null, or text that is empty after trimming. Blank cells count as
    /// missing for projection and as no-ops for edits.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value: integers and floats pass through,
    /// numeric text is parsed (integer first, then float). Booleans do not
    /// count as numbers.
    pub fn to_numeric(&self) -> Option<Scalar> {
        match self {
            Scalar::Int(v) => Some(Scalar::Int(*v)),
            Scalar::Float(v) => Some(Scalar::Float(*v)),
            Scalar::Text(t) => {
                let trimmed = t.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Some(Scalar::Int(v));
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Some(Scalar::Float(v)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Text form used for identity keys, so a numeric `123` and the string
    /// `"123"` index the same beneficiary. Blank values yield no key.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Int(v) => Some(v.to_string()),
            Scalar::Float(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
            Scalar::Float(v) => Some(v.to_string()),
            Scalar::Text(t) => {
                let trimmed = t.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

/// Open field map of one service line.
pub type ServiceLine = BTreeMap<String, Scalar>;

/// Value under one category label. Well-formed data carries a list of
/// service lines; anything else is preserved verbatim and treated as
/// having no lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryLines {
    Lines(Vec<ServiceLine>),
    Other(serde_json::Value),
}

impl CategoryLines {
    pub fn as_lines(&self) -> Option<&Vec<ServiceLine>> {
        match self {
            CategoryLines::Lines(lines) => Some(lines),
            CategoryLines::Other(_) => None,
        }
    }

    pub fn as_lines_mut(&mut self) -> Option<&mut Vec<ServiceLine>> {
        match self {
            CategoryLines::Lines(lines) => Some(lines),
            CategoryLines::Other(_) => None,
        }
    }
}

/// Service block of one beneficiary: category label -> lines. A block that
/// is not a mapping at all is kept as `Other` so malformed input stays
/// representable and round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceBlock {
    Categories(BTreeMap<String, CategoryLines>),
    Other(serde_json::Value),
}

impl Default for ServiceBlock {
    fn default() -> Self {
        ServiceBlock::Categories(BTreeMap::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryEntry {
    #[serde(
        rename = "documentTypeCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_type_code: Option<Scalar>,

    #[serde(
        rename = "documentNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_number: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceBlock>,

    /// Whatever else the entry carries; preserved on round-trip.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl BeneficiaryEntry {
    /// Line at (category, index), when the block is a mapping, the category
    /// holds a line list and the index is in range.
    pub fn line_at(&self, category: &str, index: usize) -> Option<&ServiceLine> {
        match self.services.as_ref()? {
            ServiceBlock::Categories(categories) => {
                categories.get(category)?.as_lines()?.get(index)
            }
            ServiceBlock::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beneficiaries: Vec<BeneficiaryEntry>,

    /// Document-level metadata fields; preserved on round-trip.
    #[serde(flatten)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl Document {
    /// Copy-on-write replacement of one entry's service block. `None` when
    /// the index is out of range; the original document is never touched.
    pub fn with_entry_services(&self, index: usize, block: ServiceBlock) -> Option<Document> {
        if index >= self.beneficiaries.len() {
            return None;
        }
        let mut updated = self.clone();
        updated.beneficiaries[index].services = Some(block);
        Some(updated)
    }
}

/// Identity of a beneficiary entry as seen by the matcher, normalized to
/// text. `documentNumber` alone backs the fallback lookup tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryKey {
    pub type_code: Option<String>,
    pub number: Option<String>,
}

impl BeneficiaryKey {
    pub fn of(entry: &BeneficiaryEntry) -> Self {
        Self {
            type_code: entry.document_type_code.as_ref().and_then(Scalar::key_text),
            number: entry.document_number.as_ref().and_then(Scalar::key_text),
        }
    }

    pub fn composite(&self) -> Option<(String, String)> {
        match (&self.type_code, &self.number) {
            (Some(type_code), Some(number)) => Some((type_code.clone(), number.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for BeneficiaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.type_code.as_deref().unwrap_or("?"),
            self.number.as_deref().unwrap_or("?")
        )
    }
}

/// Sign handling for copied monetary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Leave values exactly as the source has them.
    #[default]
    Keep,
    Positive,
    Negative,
}

impl Polarity {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "keep" => Some(Polarity::Keep),
            "positive" => Some(Polarity::Positive),
            "negative" => Some(Polarity::Negative),
            _ => None,
        }
    }

    /// Multiplier applied to monetary fields; `None` means no-op.
    pub fn factor(self) -> Option<i64> {
        match self {
            Polarity::Keep => None,
            Polarity::Positive => Some(1),
            Polarity::Negative => Some(-1),
        }
    }
}

/// Outcome counters of one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub source_entries: usize,
    pub target_entries: usize,
    pub modified: usize,
    pub already_satisfied: usize,
    pub full_matches: usize,
    pub fallback_matches: usize,
    /// Keys of target entries no source entry answered for, in target order.
    pub unmatched: Vec<BeneficiaryKey>,
}

/// Flat projection of one service line, the row format of the bulk-edit
/// surface. `fields` always carries every field-union column (null when the
/// line lacks it).
#[derive(Debug, Clone, PartialEq)]
pub struct EditRow {
    pub beneficiary_index: usize,
    pub category: String,
    pub line_index: usize,
    pub desired_service_value: Scalar,
    pub reference_service_value: Scalar,
    pub fields: BTreeMap<String, Scalar>,
    pub missing_fields: Vec<String>,
}

/// Per-row problem found while applying edits. These are values carried in
/// the report, not failures of the whole batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PatchIssue {
    #[error("row {row}: beneficiary index {index} is out of range (document has {len} entries)")]
    IndexOutOfRange { row: usize, index: usize, len: usize },

    #[error("row {row}: desired value '{value}' for {category}[{line}] is not numeric")]
    DesiredValueNotNumeric {
        row: usize,
        category: String,
        line: usize,
        value: String,
    },

    #[error("row {row}: no base line to synthesize {category}[{line}] for beneficiary {index}")]
    NoBaseLine {
        row: usize,
        index: usize,
        category: String,
        line: usize,
    },
}

/// Outcome of one edit-application pass. `skipped` counts rows that changed
/// nothing: blank-desired no-ops plus every row behind an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchReport {
    pub applied: usize,
    pub synthesized: usize,
    pub skipped: usize,
    pub issues: Vec<PatchIssue>,
}

/// Post-merge view of one entry, for the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOverview {
    pub index: usize,
    pub key: BeneficiaryKey,
    pub satisfied: bool,
    pub category_count: usize,
    pub line_count: usize,
}

/// Everything a pipeline pulls in during extract.
#[derive(Debug, Clone)]
pub struct ReconInputs {
    pub target: Document,
    pub source: Option<Document>,
    pub edits: Option<Vec<EditRow>>,
}

/// Everything a pipeline hands to load.
#[derive(Debug, Clone)]
pub struct ReconOutcome {
    pub document: Document,
    pub merge_summary: Option<MergeSummary>,
    pub patch_report: Option<PatchReport>,
    /// Indices of entries still failing the structural contract.
    pub invalid_entries: Vec<usize>,
    /// Bulk-edit rows, populated when the template artifact is requested.
    pub template: Vec<EditRow>,
}
