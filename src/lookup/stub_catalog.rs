use anyhow::Result;
use async_trait::async_trait;

use crate::lookup::catalog_client::CatalogLookup;
use crate::models::record::CanonicalRecord;

const STUB_BRANDS: [&str; 4] = ["Acme", "Globex", "Umbrella", "Initech"];
const STUB_CATEGORIES: [&str; 4] = ["Snacks", "Beverages", "Household", "Personal Care"];

/// Synthetic catalog for demos and tests, derived deterministically from
/// the input barcode list. Every 5th description is "good product" and
/// every 7th is "assorted item" so the classifier has flaggable rows.
pub struct StubCatalog;

impl StubCatalog {
    pub fn generate(barcodes: &[String]) -> Vec<CanonicalRecord> {
        barcodes
            .iter()
            .enumerate()
            .map(|(i, barcode)| {
                let brand = STUB_BRANDS[i % STUB_BRANDS.len()];
                let category = STUB_CATEGORIES[(i / 2) % STUB_CATEGORIES.len()];

                let description = if i % 5 == 0 {
                    "good product".to_string()
                } else if i % 7 == 0 {
                    "assorted item".to_string()
                } else {
                    let tail = &barcode[barcode.len().saturating_sub(3)..];
                    format!("{} {} Item {} — 12oz", brand, category, tail)
                };

                CanonicalRecord {
                    barcode: barcode.clone(),
                    brand: Some(brand.to_string()),
                    description,
                    category: Some(category.to_string()),
                    requirement_label: None,
                    keywords: format!("{},{},item", brand.to_lowercase(), category.to_lowercase()),
                }
            })
            .collect()
    }
}

#[async_trait]
impl CatalogLookup for StubCatalog {
    async fn lookup(&self, barcodes: &[String]) -> Result<Vec<CanonicalRecord>> {
        Ok(Self::generate(barcodes))
    }
}
