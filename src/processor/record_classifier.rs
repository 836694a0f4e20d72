use anyhow::Result;
use regex::Regex;
use std::str::FromStr;

use crate::models::record::{
    CampaignSplit, CanonicalRecord, ClassifiedRecord, DescriptionFlag, FlagVerdict, SizeFlag,
    ValidationMode, ValidationSplit,
};

/// Campaign rows whose requirement label equals this sentinel (case-folded,
/// trimmed) are the awarding subset; everything else is audience.
pub const AWARDING_SENTINEL: &str = "unlabeled requirement";

pub const DEFAULT_VAGUE_TERMS: [&str; 6] =
    ["assorted", "misc", "variety", "good product", "item", "product"];

pub const DEFAULT_MIN_DESCRIPTION_LEN: usize = 10;
pub const DEFAULT_MIN_SIZE_ML: f64 = 750.0;

const MIN_WORD_COUNT: usize = 3;

/// Deterministic quality rules over canonical records. Row-level issues
/// are classification outcomes, never errors; validation never fails a run.
pub struct RecordClassifier {
    vague_terms: Vec<String>,
    min_description_len: usize,
    min_size_ml: f64,
    ml_pattern: Regex,
    litre_pattern: Regex,
}

impl RecordClassifier {
    pub fn new(
        extra_vague_terms: &[String],
        min_description_len: usize,
        min_size_ml: f64,
    ) -> Result<Self> {
        let mut vague_terms: Vec<String> =
            DEFAULT_VAGUE_TERMS.iter().map(|t| t.to_string()).collect();
        for term in extra_vague_terms {
            let folded = term.trim().to_lowercase();
            if !folded.is_empty() && !vague_terms.contains(&folded) {
                vague_terms.push(folded);
            }
        }

        Ok(RecordClassifier {
            vague_terms,
            min_description_len,
            min_size_ml,
            ml_pattern: Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*ml\b")?,
            litre_pattern: Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*l\b")?,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&[], DEFAULT_MIN_DESCRIPTION_LEN, DEFAULT_MIN_SIZE_ML)
    }

    /// Split campaign rows into awarding and audience partitions, preserving
    /// relative row order within each side. The requirement label is consumed
    /// here and dropped from awarding rows.
    pub fn split_campaign(&self, records: Vec<CanonicalRecord>) -> CampaignSplit {
        let mut split = CampaignSplit::default();

        for mut record in records {
            let is_awarding = record
                .requirement_label
                .as_deref()
                .map(|label| label.trim().to_lowercase() == AWARDING_SENTINEL)
                .unwrap_or(false);

            if is_awarding {
                record.requirement_label = None;
                split.awarding.push(record);
            } else {
                split.audience.push(record);
            }
        }

        split
    }

    /// Extract a volume in millilitres from free-text. A millilitre match
    /// wins over a litre match; litres are converted at 1000 ml each. A
    /// captured number that fails to parse counts as no match.
    pub fn parse_size_ml(&self, description: &str) -> Option<f64> {
        if let Some(captures) = self.ml_pattern.captures(description) {
            if let Some(ml) = captures.get(1).and_then(|m| f64::from_str(m.as_str()).ok()) {
                return Some(ml);
            }
        }

        self.litre_pattern
            .captures(description)
            .and_then(|captures| captures.get(1).and_then(|m| f64::from_str(m.as_str()).ok()))
            .map(|litres| litres * 1000.0)
    }

    fn description_flag(&self, description: &str, mode: ValidationMode) -> Option<DescriptionFlag> {
        // Length check takes priority over the vague-term check.
        if description.len() < self.min_description_len {
            return Some(DescriptionFlag::TooShort);
        }

        let lower = description.to_lowercase();
        let has_vague_term = self.vague_terms.iter().any(|term| lower.contains(term));
        let too_few_words = mode == ValidationMode::Simple
            && lower.split_whitespace().count() < MIN_WORD_COUNT;

        if has_vague_term || too_few_words {
            return Some(DescriptionFlag::UnclearOrGeneric);
        }

        None
    }

    fn is_missing_core(&self, record: &CanonicalRecord) -> bool {
        let blank = |value: &String| value.trim().is_empty();

        record.description.trim().is_empty()
            || record.brand.as_ref().map(blank).unwrap_or(false)
            || record.category.as_ref().map(blank).unwrap_or(false)
    }

    pub fn assess(&self, record: &CanonicalRecord, mode: ValidationMode) -> FlagVerdict {
        let missing_core = self.is_missing_core(record);
        let description_flag = self.description_flag(&record.description, mode);

        let (parsed_size_ml, size_flag) = match mode {
            ValidationMode::Simple => (None, None),
            ValidationMode::SizeAware => {
                let parsed = self.parse_size_ml(&record.description);
                let flag = match parsed {
                    None => Some(SizeFlag::NoSizeFound),
                    Some(ml) if ml < self.min_size_ml => Some(SizeFlag::TooSmall),
                    Some(_) => None,
                };
                (parsed, flag)
            }
        };

        let needs_review = match mode {
            ValidationMode::Simple => missing_core || description_flag.is_some(),
            ValidationMode::SizeAware => description_flag.is_some() || size_flag.is_some(),
        };

        FlagVerdict {
            missing_core,
            description_flag,
            parsed_size_ml,
            size_flag,
            needs_review,
        }
    }

    /// Partition records into validated and flagged sides. Every input
    /// record lands in exactly one partition, in its original order.
    pub fn validate(&self, records: Vec<CanonicalRecord>, mode: ValidationMode) -> ValidationSplit {
        let mut split = ValidationSplit::default();

        for record in records {
            let verdict = self.assess(&record, mode);
            let classified = ClassifiedRecord { record, verdict };
            if classified.verdict.needs_review {
                split.flagged.push(classified);
            } else {
                split.validated.push(classified);
            }
        }

        split
    }
}
