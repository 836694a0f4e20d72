use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::CatalogConfig;
use crate::models::record::CanonicalRecord;

pub const CATALOG_COLUMNS: [&str; 5] = ["barcode", "brand", "category", "description", "keywords"];

/// External catalog collaborator: given normalized, de-duplicated barcodes,
/// return product rows. Implemented by the Pinot-backed client and by the
/// deterministic stub.
#[async_trait]
pub trait CatalogLookup {
    async fn lookup(&self, barcodes: &[String]) -> Result<Vec<CanonicalRecord>>;
}

/// Queries a Pinot SQL endpoint in bounded, strictly sequential batches.
/// Any batch failure aborts the whole lookup; no partial batches are
/// merged into the result.
pub struct PinotCatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl PinotCatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder().emulation(Emulation::Firefox136).build()?;

        Ok(PinotCatalogClient { client, config })
    }

    fn build_sql(batch: &[String]) -> String {
        let in_list = batch
            .iter()
            .map(|barcode| format!("'{}'", barcode))
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "SELECT {} FROM products WHERE barcode IN ({})",
            CATALOG_COLUMNS.join(", "),
            in_list
        )
    }

    fn cell_to_string(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Parse a Pinot result table into catalog records. Missing columns
    /// are synthesized as empty; an empty or absent table yields no rows.
    fn parse_result_table(data: &Value) -> Vec<CanonicalRecord> {
        let table = data.get("resultTable");
        let columns: Vec<String> = table
            .and_then(|t| t.get("dataSchema"))
            .and_then(|s| s.get("columnNames"))
            .and_then(|c| c.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str())
                    .map(|n| n.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows = table
            .and_then(|t| t.get("rows"))
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        if columns.is_empty() || rows.is_empty() {
            return Vec::new();
        }

        let column_value = |row: &[Value], name: &str| -> String {
            columns
                .iter()
                .position(|c| c == name)
                .and_then(|i| row.get(i))
                .map(Self::cell_to_string)
                .unwrap_or_default()
        };

        rows.iter()
            .filter_map(|row| row.as_array())
            .map(|row| CanonicalRecord {
                barcode: column_value(row, "barcode"),
                brand: Some(column_value(row, "brand")),
                description: column_value(row, "description"),
                category: Some(column_value(row, "category")),
                requirement_label: None,
                keywords: column_value(row, "keywords"),
            })
            .collect()
    }
}

#[async_trait]
impl CatalogLookup for PinotCatalogClient {
    async fn lookup(&self, barcodes: &[String]) -> Result<Vec<CanonicalRecord>> {
        if self.config.endpoint.is_empty() {
            return Err(anyhow!("catalog endpoint is required when stub mode is off"));
        }
        if barcodes.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = barcodes.chunks(self.config.batch_size).collect();
        let mut records = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            info!(
                "Querying catalog batch {}/{} ({} barcodes)",
                index + 1,
                batches.len(),
                batch.len()
            );

            let payload = serde_json::json!({ "sql": Self::build_sql(batch) });

            let mut request = self
                .client
                .post(&self.config.endpoint)
                .header("Content-Type", "application/json")
                .json(&payload);

            if let Some(ref auth) = self.config.authorization {
                request = request.header("Authorization", auth);
            }

            let response = request.send().await.with_context(|| {
                format!("catalog request failed on batch {}/{}", index + 1, batches.len())
            })?;

            if !response.status().is_success() {
                return Err(anyhow!(
                    "catalog returned HTTP {} on batch {}/{}",
                    response.status(),
                    index + 1,
                    batches.len()
                ));
            }

            let data: Value = response.json().await.with_context(|| {
                format!(
                    "malformed catalog response on batch {}/{}",
                    index + 1,
                    batches.len()
                )
            })?;

            let batch_records = Self::parse_result_table(&data);
            if batch_records.is_empty() {
                warn!("Catalog batch {}/{} returned no rows", index + 1, batches.len());
            }
            records.extend(batch_records);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_sql_quotes_each_barcode() {
        let sql = PinotCatalogClient::build_sql(&[
            "012345678905".to_string(),
            "4006381333931".to_string(),
        ]);
        assert_eq!(
            sql,
            "SELECT barcode, brand, category, description, keywords FROM products \
             WHERE barcode IN ('012345678905','4006381333931')"
        );
    }

    #[test]
    fn test_parse_result_table() {
        let data = json!({
            "resultTable": {
                "dataSchema": {
                    "columnNames": ["barcode", "brand", "category", "description", "keywords"]
                },
                "rows": [
                    ["012345678905", "Acme", "Snacks", "Acme Pretzel Sticks 900 ml", "acme,snacks"],
                    ["036000291452", "Globex", "Beverages", "Globex Cola", "globex,beverages"]
                ]
            }
        });

        let records = PinotCatalogClient::parse_result_table(&data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].barcode, "012345678905");
        assert_eq!(records[0].brand.as_deref(), Some("Acme"));
        assert_eq!(records[1].category.as_deref(), Some("Beverages"));
    }

    #[test]
    fn test_parse_result_table_synthesizes_missing_columns() {
        let data = json!({
            "resultTable": {
                "dataSchema": { "columnNames": ["barcode", "description"] },
                "rows": [["012345678905", "Acme Pretzel Sticks"]]
            }
        });

        let records = PinotCatalogClient::parse_result_table(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brand.as_deref(), Some(""));
        assert_eq!(records[0].category.as_deref(), Some(""));
        assert_eq!(records[0].keywords, "");
    }

    #[test]
    fn test_parse_empty_or_malformed_table() {
        assert!(PinotCatalogClient::parse_result_table(&json!({})).is_empty());
        assert!(
            PinotCatalogClient::parse_result_table(&json!({
                "resultTable": { "dataSchema": { "columnNames": [] }, "rows": [] }
            }))
            .is_empty()
        );
    }

    #[test]
    fn test_numeric_cells_are_stringified() {
        let data = json!({
            "resultTable": {
                "dataSchema": { "columnNames": ["barcode", "brand"] },
                "rows": [[12345678905_i64, "Acme"]]
            }
        });

        let records = PinotCatalogClient::parse_result_table(&data);
        assert_eq!(records[0].barcode, "12345678905");
    }
}
