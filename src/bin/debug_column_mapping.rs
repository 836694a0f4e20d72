use anyhow::Result;

#[path = "../processor/barcode_normalizer.rs"]
mod barcode_normalizer;

#[path = "../processor/column_resolver.rs"]
mod column_resolver;

use barcode_normalizer::BarcodeNormalizer;
use column_resolver::{ColumnResolver, ManualMapping};

fn main() -> Result<()> {
    println!("=== DEBUGGING COLUMN RESOLUTION ===\n");

    let resolver = ColumnResolver::new();

    let header_sets = vec![
        vec!["UPC", "Brand Name", "Product Description"],
        vec!["gtin", "Item Description", "Requirement Name"],
        vec!["code", "maker", "notes"],
    ];

    for headers in header_sets {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let resolved = resolver.resolve(&headers);
        println!("Headers:     {:?}", headers);
        println!("  barcode     -> {:?}", resolved.barcode);
        println!("  brand       -> {:?}", resolved.brand);
        println!("  description -> {:?}", resolved.description);
        println!("  requirement -> {:?}", resolved.requirement);
        println!("  unresolved  -> {}\n", resolved.unresolved());
    }

    println!("=== MANUAL MAPPING FALLBACK ===\n");
    let headers: Vec<String> = ["code", "maker", "notes"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mapping = ManualMapping {
        barcode: Some("code".to_string()),
        brand: Some("maker".to_string()),
        description: Some("notes".to_string()),
    };
    match resolver.apply_manual(&headers, &mapping) {
        Ok(resolved) => println!("Manual mapping accepted: {:?}\n", resolved),
        Err(e) => println!("Manual mapping rejected: {}\n", e),
    }

    println!("=== BARCODE CLEANING SAMPLES ===\n");
    let normalizer = BarcodeNormalizer::new(12)?;
    for raw in ["12345678", " 0123456789012 ", "UPC:4006381333931", "123456789-20240101", "n/a"] {
        let cleaned = normalizer.clean(raw);
        println!(
            "{:24} -> '{}' (standard: {}, multiple runs: {})",
            format!("'{}'", raw),
            cleaned.canonical,
            cleaned.is_standard(),
            cleaned.multiple_runs
        );
    }

    Ok(())
}
