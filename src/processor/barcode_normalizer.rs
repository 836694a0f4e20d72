use anyhow::Result;
use regex::Regex;
use tracing::warn;

/// Widest barcode standard we unify into (GTIN-14).
pub const MAX_BARCODE_WIDTH: usize = 14;

/// Narrowest standard width (EAN-8); anything shorter after cleaning is
/// non-standard and must be excluded by the caller.
pub const MIN_STANDARD_WIDTH: usize = 8;

pub const DEFAULT_TARGET_WIDTH: usize = 12;

/// Canonicalizes raw barcode text into a fixed-width digit string.
///
/// Cleaning is pure and never fails: tokens with no digits produce an
/// empty canonical value that downstream validation rejects.
pub struct BarcodeNormalizer {
    target_width: usize,
    digit_run: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBarcode {
    pub canonical: String,
    /// True when the raw token held more than one separated digit run.
    /// Only the first run is used, so the result may be a wrong barcode
    /// (e.g. a SKU with an embedded date); callers surface this as a
    /// warning rather than guessing which run was meant.
    pub multiple_runs: bool,
}

impl NormalizedBarcode {
    pub fn is_standard(&self) -> bool {
        let len = self.canonical.len();
        (MIN_STANDARD_WIDTH..=MAX_BARCODE_WIDTH).contains(&len)
            && self.canonical.bytes().all(|b| b.is_ascii_digit())
    }
}

impl BarcodeNormalizer {
    pub fn new(target_width: usize) -> Result<Self> {
        Ok(BarcodeNormalizer {
            target_width: target_width.min(MAX_BARCODE_WIDTH),
            digit_run: Regex::new(r"\d+")?,
        })
    }

    /// Extract the first maximal digit run, keep at most the rightmost 14
    /// digits, then left-zero-pad to the configured target width.
    pub fn clean(&self, raw: &str) -> NormalizedBarcode {
        let mut runs = self.digit_run.find_iter(raw);
        let first = runs.next();
        let multiple_runs = runs.next().is_some();

        let canonical = match first {
            None => String::new(),
            Some(run) => {
                let digits = run.as_str();
                let kept = if digits.len() > MAX_BARCODE_WIDTH {
                    &digits[digits.len() - MAX_BARCODE_WIDTH..]
                } else {
                    digits
                };
                format!("{:0>width$}", kept, width = self.target_width)
            }
        };

        NormalizedBarcode { canonical, multiple_runs }
    }

    /// Clean a batch of raw tokens into unique canonical barcodes.
    ///
    /// Empty and non-standard results are excluded with a warning, and
    /// duplicates are resolved first-occurrence-wins in stable order.
    pub fn clean_unique(&self, raw_values: &[String]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::new();
        let mut dropped = 0usize;

        for raw in raw_values {
            let cleaned = self.clean(raw);
            if cleaned.multiple_runs {
                warn!(
                    "Barcode '{}' contains multiple digit runs, using the first: {}",
                    raw.trim(),
                    cleaned.canonical
                );
            }
            if !cleaned.is_standard() {
                if !raw.trim().is_empty() {
                    warn!("Skipping non-standard barcode value: '{}'", raw.trim());
                }
                dropped += 1;
                continue;
            }
            if seen.insert(cleaned.canonical.clone()) {
                unique.push(cleaned.canonical);
            }
        }

        if dropped > 0 {
            warn!("Dropped {} empty or non-standard barcode values", dropped);
        }

        unique
    }
}
