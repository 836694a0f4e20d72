use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::models::record::{CanonicalRecord, ClassifiedRecord, SuggestionPair};

/// Exports are grouped by UTC date and run id, one directory per run.
pub fn run_export_dir(base: &Path, run_id: &Uuid) -> PathBuf {
    let date = Utc::now().format("%Y/%m/%d").to_string();
    base.join("exports").join(date).join(run_id.to_string())
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        info!("No rows to export for {}", path.display());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV export: {}", path.display()))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

fn string_series(name: &str, values: Vec<String>) -> Column {
    Series::new(name.into(), values).into()
}

/// Canonical columns first, derived flag columns appended.
pub fn classified_to_dataframe(records: &[ClassifiedRecord]) -> Result<DataFrame> {
    let columns = vec![
        string_series(
            "barcode",
            records.iter().map(|r| r.record.barcode.clone()).collect(),
        ),
        string_series(
            "brand",
            records
                .iter()
                .map(|r| r.record.brand.clone().unwrap_or_default())
                .collect(),
        ),
        string_series(
            "category",
            records
                .iter()
                .map(|r| r.record.category.clone().unwrap_or_default())
                .collect(),
        ),
        string_series(
            "description",
            records.iter().map(|r| r.record.description.clone()).collect(),
        ),
        string_series(
            "keywords",
            records.iter().map(|r| r.record.keywords.clone()).collect(),
        ),
        string_series(
            "parsed_size_ml",
            records
                .iter()
                .map(|r| {
                    r.verdict
                        .parsed_size_ml
                        .map(|ml| ml.to_string())
                        .unwrap_or_default()
                })
                .collect(),
        ),
        string_series(
            "description_flag",
            records
                .iter()
                .map(|r| {
                    r.verdict
                        .description_flag
                        .map(|f| f.label().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        ),
        string_series(
            "size_flag",
            records
                .iter()
                .map(|r| {
                    r.verdict
                        .size_flag
                        .map(|f| f.label().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        ),
        string_series(
            "needs_review",
            records
                .iter()
                .map(|r| r.verdict.needs_review.to_string())
                .collect(),
        ),
    ];

    DataFrame::new(columns).map_err(|e| anyhow!("Failed to build export DataFrame: {}", e))
}

/// Audience rows and other unclassified record sets share one shape.
pub fn records_to_dataframe(records: &[CanonicalRecord]) -> Result<DataFrame> {
    let columns = vec![
        string_series("barcode", records.iter().map(|r| r.barcode.clone()).collect()),
        string_series(
            "brand",
            records
                .iter()
                .map(|r| r.brand.clone().unwrap_or_default())
                .collect(),
        ),
        string_series(
            "description",
            records.iter().map(|r| r.description.clone()).collect(),
        ),
        string_series(
            "requirement",
            records
                .iter()
                .map(|r| r.requirement_label.clone().unwrap_or_default())
                .collect(),
        ),
    ];

    DataFrame::new(columns).map_err(|e| anyhow!("Failed to build export DataFrame: {}", e))
}

pub fn suggestions_to_dataframe(suggestions: &[SuggestionPair]) -> Result<DataFrame> {
    let columns = vec![
        string_series(
            "source_barcode",
            suggestions.iter().map(|s| s.source_barcode.clone()).collect(),
        ),
        string_series(
            "suggested_barcode",
            suggestions
                .iter()
                .map(|s| s.suggested_barcode.clone())
                .collect(),
        ),
        string_series("reason", suggestions.iter().map(|s| s.reason.clone()).collect()),
    ];

    DataFrame::new(columns).map_err(|e| anyhow!("Failed to build export DataFrame: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{DescriptionFlag, FlagVerdict};

    #[test]
    fn test_classified_export_shape() {
        let record = CanonicalRecord {
            barcode: "012345678905".to_string(),
            brand: Some("Acme".to_string()),
            description: "good product".to_string(),
            category: Some("Snacks".to_string()),
            requirement_label: None,
            keywords: "acme,snacks,item".to_string(),
        };
        let classified = ClassifiedRecord {
            record,
            verdict: FlagVerdict {
                missing_core: false,
                description_flag: Some(DescriptionFlag::UnclearOrGeneric),
                parsed_size_ml: None,
                size_flag: None,
                needs_review: true,
            },
        };

        let df = classified_to_dataframe(&[classified]).unwrap();
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            vec![
                "barcode",
                "brand",
                "category",
                "description",
                "keywords",
                "parsed_size_ml",
                "description_flag",
                "size_flag",
                "needs_review",
            ]
        );
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_empty_suggestions_keep_column_shape() {
        let df = suggestions_to_dataframe(&[]).unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_run_export_dir_is_run_scoped() {
        let run_id = Uuid::new_v4();
        let dir = run_export_dir(Path::new("out"), &run_id);
        assert!(dir.starts_with("out/exports"));
        assert!(dir.ends_with(run_id.to_string()));
    }
}
