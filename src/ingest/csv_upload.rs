use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Read an uploaded CSV with schema inference disabled so every column
/// comes back as a string. Barcodes keep their leading zeros this way.
pub fn read_upload(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open upload: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read upload as CSV: {}", path.display()))?;

    if df.height() == 0 {
        return Err(anyhow!("upload is empty: {}", path.display()));
    }

    info!(
        "Loaded upload {} with {} rows and {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}

pub fn column_headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Pull a column out as owned strings, with nulls read as empty values.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df
        .column(name)
        .with_context(|| format!("missing required column '{}'", name))?;

    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or("").to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_df() -> DataFrame {
        let barcode = Series::new(
            "barcode".into(),
            vec!["012345678905".to_string(), "".to_string()],
        );
        let desc = Series::new(
            "Product Description".into(),
            vec!["Acme Pretzel Sticks".to_string(), "Globex Cola".to_string()],
        );
        DataFrame::new(vec![barcode.into(), desc.into()]).unwrap()
    }

    #[test]
    fn test_column_headers() {
        let df = upload_df();
        assert_eq!(
            column_headers(&df),
            vec!["barcode".to_string(), "Product Description".to_string()]
        );
    }

    #[test]
    fn test_string_column_reads_empty_values() {
        let df = upload_df();
        let values = string_column(&df, "barcode").unwrap();
        assert_eq!(values, vec!["012345678905".to_string(), "".to_string()]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let df = upload_df();
        assert!(string_column(&df, "brand").is_err());
    }
}
