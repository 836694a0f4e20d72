use anyhow::Result;

#[path = "../config/mod.rs"]
mod config;

#[path = "../models/mod.rs"]
mod models;

#[path = "../processor/mod.rs"]
mod processor;

#[path = "../lookup/mod.rs"]
mod lookup;

use lookup::StubCatalog;
use models::record::ValidationMode;
use processor::{BarcodeNormalizer, RecordClassifier, RelatedItemRecommender};

fn main() -> Result<()> {
    println!("=== STUB VALIDATION RUN (no backend) ===\n");

    let raw_barcodes = vec![
        "012345678905".to_string(),
        "0 1234 5678 905".to_string(),
        "4006381333931".to_string(),
        "".to_string(),
        "036000291452".to_string(),
        "078915030900".to_string(),
        "041220576463".to_string(),
        "030000056219".to_string(),
        "014100085478".to_string(),
        "021000658831".to_string(),
    ];

    let normalizer = BarcodeNormalizer::new(12)?;
    let barcodes = normalizer.clean_unique(&raw_barcodes);
    println!("Cleaned {} raw values into {} unique barcodes\n", raw_barcodes.len(), barcodes.len());

    let catalog = StubCatalog::generate(&barcodes);
    println!("Stub catalog ({} rows):", catalog.len());
    for row in &catalog {
        println!(
            "  {} | {:8} | {:13} | {}",
            row.barcode,
            row.brand.as_deref().unwrap_or(""),
            row.category.as_deref().unwrap_or(""),
            row.description
        );
    }

    let classifier = RecordClassifier::with_defaults()?;
    let split = classifier.validate(catalog.clone(), ValidationMode::Simple);

    println!("\nValidated ({}):", split.validated.len());
    for item in &split.validated {
        println!("  {} | {}", item.record.barcode, item.record.description);
    }

    println!("\nNeeds review ({}):", split.flagged.len());
    for item in &split.flagged {
        let reason = item
            .verdict
            .description_flag
            .map(|f| f.label())
            .unwrap_or("Missing core fields");
        println!("  {} | {} | {}", item.record.barcode, reason, item.record.description);
    }

    let suggestions = RelatedItemRecommender.recommend(&catalog, 2);
    println!("\nRelated product suggestions ({}):", suggestions.len());
    for pair in &suggestions {
        println!(
            "  {} -> {} ({})",
            pair.source_barcode, pair.suggested_barcode, pair.reason
        );
    }

    Ok(())
}
