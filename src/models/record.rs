use serde::{Deserialize, Serialize};

/// How the uploaded file was produced, which decides the column contract
/// and the validation rules applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// A single column literally named `barcode`.
    SimpleFile,
    /// IC product export with arbitrary headers, resolved via aliases.
    IcProductFile,
    /// QA campaign export with arbitrary headers plus a requirement column.
    QaCampaignFile,
}

impl IngestMode {
    pub fn validation_mode(&self) -> ValidationMode {
        match self {
            IngestMode::SimpleFile => ValidationMode::Simple,
            IngestMode::IcProductFile | IngestMode::QaCampaignFile => ValidationMode::SizeAware,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Missing-core and vague/short-description rules only.
    Simple,
    /// Description rules plus millilitre volume extraction and threshold.
    SizeAware,
}

/// The normalized unit of work all downstream stages operate on.
/// Identity fields are never mutated after normalization; derived flags
/// live in [`FlagVerdict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Digits only, left-zero-padded to the configured width, at most 14.
    pub barcode: String,
    /// `None` when the source had no brand column at all.
    pub brand: Option<String>,
    pub description: String,
    /// Present only when sourced from a catalog lookup.
    pub category: Option<String>,
    /// Campaign exports only; consumed by the awarding/audience split.
    pub requirement_label: Option<String>,
    pub keywords: String,
}

impl CanonicalRecord {
    pub fn new(barcode: impl Into<String>, description: impl Into<String>) -> Self {
        CanonicalRecord {
            barcode: barcode.into(),
            brand: None,
            description: description.into(),
            category: None,
            requirement_label: None,
            keywords: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionFlag {
    TooShort,
    UnclearOrGeneric,
}

impl DescriptionFlag {
    pub fn label(&self) -> &'static str {
        match self {
            DescriptionFlag::TooShort => "Too short",
            DescriptionFlag::UnclearOrGeneric => "Unclear or Generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeFlag {
    NoSizeFound,
    TooSmall,
}

impl SizeFlag {
    pub fn label(&self) -> &'static str {
        match self {
            SizeFlag::NoSizeFound => "No size found",
            SizeFlag::TooSmall => "Too small",
        }
    }
}

/// Per-record quality verdict, recomputed on every run from the active
/// rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagVerdict {
    pub missing_core: bool,
    pub description_flag: Option<DescriptionFlag>,
    pub parsed_size_ml: Option<f64>,
    pub size_flag: Option<SizeFlag>,
    pub needs_review: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub record: CanonicalRecord,
    pub verdict: FlagVerdict,
}

/// Exhaustive, disjoint, order-preserving partition of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationSplit {
    pub validated: Vec<ClassifiedRecord>,
    pub flagged: Vec<ClassifiedRecord>,
}

/// Awarding rows proceed to validation; audience rows are reporting-only.
#[derive(Debug, Clone, Default)]
pub struct CampaignSplit {
    pub awarding: Vec<CanonicalRecord>,
    pub audience: Vec<CanonicalRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionPair {
    pub source_barcode: String,
    pub suggested_barcode: String,
    pub reason: String,
}
