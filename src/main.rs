use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use config::PipelineConfig;
use lookup::{CatalogLookup, PinotCatalogClient, StubCatalog};
use models::record::{CanonicalRecord, ClassifiedRecord, IngestMode, SuggestionPair};
use processor::{
    BarcodeNormalizer, ColumnResolver, ManualMapping, RecordClassifier, RelatedItemRecommender,
    ResolvedColumns,
};

mod config;
mod export;
mod ingest;
mod lookup;
mod models;
mod processor;

const CONFIG_PATH: &str = "src/configs/pipeline.toml";

struct RunOutcome {
    validated: Vec<ClassifiedRecord>,
    flagged: Vec<ClassifiedRecord>,
    audience: Vec<CanonicalRecord>,
    suggestions: Vec<SuggestionPair>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let input = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var("UPLOAD_FILE").ok().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no upload given: pass a CSV path or set UPLOAD_FILE"))?;

    let mode = ingest_mode_from_env()?;
    let config = load_config()?;

    let run_id = Uuid::new_v4();
    info!("Starting validation run {} ({:?})", run_id, mode);

    let outcome = run_validation(&config, &input, mode).await?;

    info!(
        "Validation complete: {} validated, {} need review, {} audience rows, {} suggestions",
        outcome.validated.len(),
        outcome.flagged.len(),
        outcome.audience.len(),
        outcome.suggestions.len()
    );

    let export_dir = export::run_export_dir(Path::new("."), &run_id);

    let mut validated_df = export::classified_to_dataframe(&outcome.validated)?;
    export::write_csv(&mut validated_df, &export_dir.join("validated.csv"))?;

    let mut flagged_df = export::classified_to_dataframe(&outcome.flagged)?;
    export::write_csv(&mut flagged_df, &export_dir.join("needs_review.csv"))?;

    let mut suggestions_df = export::suggestions_to_dataframe(&outcome.suggestions)?;
    export::write_csv(&mut suggestions_df, &export_dir.join("recommendations.csv"))?;

    if !outcome.audience.is_empty() {
        let mut audience_df = export::records_to_dataframe(&outcome.audience)?;
        export::write_csv(&mut audience_df, &export_dir.join("audience.csv"))?;
    }

    info!("Run {} exported to {}", run_id, export_dir.display());

    Ok(())
}

fn load_config() -> Result<PipelineConfig> {
    if Path::new(CONFIG_PATH).exists() {
        return PipelineConfig::from_file(CONFIG_PATH);
    }

    warn!("Config file not found at {}, using defaults", CONFIG_PATH);
    let mut config = PipelineConfig::default();
    config.load_env_overrides();
    config.validate()?;
    Ok(config)
}

fn ingest_mode_from_env() -> Result<IngestMode> {
    match env::var("UPLOAD_MODE").as_deref() {
        Err(_) | Ok("") | Ok("simple") => Ok(IngestMode::SimpleFile),
        Ok("ic-product") => Ok(IngestMode::IcProductFile),
        Ok("qa-campaign") => Ok(IngestMode::QaCampaignFile),
        Ok(other) => Err(anyhow!(
            "unknown UPLOAD_MODE '{}': expected simple, ic-product, or qa-campaign",
            other
        )),
    }
}

fn build_lookup(config: &PipelineConfig) -> Result<Box<dyn CatalogLookup>> {
    if config.catalog.stub_mode {
        info!("Stub mode: generating a synthetic catalog, no backend calls");
        Ok(Box::new(StubCatalog))
    } else {
        Ok(Box::new(PinotCatalogClient::new(config.catalog.clone())?))
    }
}

async fn run_validation(
    config: &PipelineConfig,
    input: &Path,
    mode: IngestMode,
) -> Result<RunOutcome> {
    let df = ingest::read_upload(input)?;
    let normalizer = BarcodeNormalizer::new(config.rules.barcode_width)?;
    let classifier = RecordClassifier::new(
        &config.rules.extra_vague_terms,
        config.rules.min_description_len,
        config.rules.min_size_ml,
    )?;
    let lookup = build_lookup(config)?;

    match mode {
        IngestMode::SimpleFile => {
            let raw = ingest::string_column(&df, "barcode")
                .context("simple uploads must include a 'barcode' column")?;
            let barcodes = normalizer.clean_unique(&raw);
            if barcodes.is_empty() {
                return Err(anyhow!("upload contains no usable barcodes"));
            }
            info!("Loaded {} unique barcodes", barcodes.len());

            let catalog = lookup.lookup(&barcodes).await?;
            if catalog.is_empty() {
                warn!("No catalog matches returned; check endpoint, auth, or barcode values");
            }

            let suggestions =
                RelatedItemRecommender.recommend(&catalog, config.rules.suggestion_fanout);
            let split = classifier.validate(catalog, mode.validation_mode());

            Ok(RunOutcome {
                validated: split.validated,
                flagged: split.flagged,
                audience: Vec::new(),
                suggestions,
            })
        }
        IngestMode::IcProductFile | IngestMode::QaCampaignFile => {
            let headers = ingest::column_headers(&df);
            let resolved = resolve_columns(&headers)?;

            if mode == IngestMode::QaCampaignFile && resolved.requirement.is_none() {
                return Err(anyhow!("campaign upload has no requirement column"));
            }

            let records = records_from_upload(&df, &resolved, &normalizer, mode)?;

            // De-duplication applies to the batch being validated, so the
            // campaign split sees every row first.
            let (to_validate, audience) = if mode == IngestMode::QaCampaignFile {
                let split = classifier.split_campaign(records);
                info!(
                    "Campaign split: {} awarding, {} audience rows",
                    split.awarding.len(),
                    split.audience.len()
                );
                (dedup_first_wins(split.awarding), split.audience)
            } else {
                (dedup_first_wins(records), Vec::new())
            };

            if to_validate.is_empty() {
                return Err(anyhow!("no rows left to validate after ingestion"));
            }

            let barcodes: Vec<String> = to_validate.iter().map(|r| r.barcode.clone()).collect();
            let catalog = lookup.lookup(&barcodes).await?;
            let enriched = attach_catalog_fields(to_validate, &catalog);

            let suggestions =
                RelatedItemRecommender.recommend(&enriched, config.rules.suggestion_fanout);
            let split = classifier.validate(enriched, mode.validation_mode());

            Ok(RunOutcome {
                validated: split.validated,
                flagged: split.flagged,
                audience,
                suggestions,
            })
        }
    }
}

/// Alias resolution first; an explicit mapping from the environment is the
/// fallback when a required column cannot be found.
fn resolve_columns(headers: &[String]) -> Result<ResolvedColumns> {
    let resolver = ColumnResolver::new();
    let resolved = resolver.resolve(headers);
    if !resolved.unresolved() {
        return Ok(resolved);
    }

    let mapping = ManualMapping {
        barcode: env::var("COLUMN_MAP_BARCODE").ok(),
        brand: env::var("COLUMN_MAP_BRAND").ok(),
        description: env::var("COLUMN_MAP_DESCRIPTION").ok(),
    };

    resolver.apply_manual(headers, &mapping).with_context(|| {
        format!(
            "could not resolve required columns from headers {:?}; \
             set COLUMN_MAP_BARCODE and COLUMN_MAP_DESCRIPTION (and optionally COLUMN_MAP_BRAND)",
            headers
        )
    })
}

/// Build canonical records from the resolved upload columns. Rows whose
/// barcode cleans to a non-standard value are excluded with a warning,
/// and duplicates resolve first-occurrence-wins in stable order.
fn records_from_upload(
    df: &polars::prelude::DataFrame,
    resolved: &ResolvedColumns,
    normalizer: &BarcodeNormalizer,
    mode: IngestMode,
) -> Result<Vec<CanonicalRecord>> {
    let barcode_col = resolved
        .barcode
        .as_deref()
        .ok_or_else(|| anyhow!("barcode column unresolved"))?;
    let description_col = resolved
        .description
        .as_deref()
        .ok_or_else(|| anyhow!("description column unresolved"))?;

    let barcodes = ingest::string_column(df, barcode_col)?;
    let descriptions = ingest::string_column(df, description_col)?;
    let brands = match resolved.brand.as_deref() {
        Some(col) => Some(ingest::string_column(df, col)?),
        None => None,
    };
    let requirements = match (mode, resolved.requirement.as_deref()) {
        (IngestMode::QaCampaignFile, Some(col)) => Some(ingest::string_column(df, col)?),
        _ => None,
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, raw_barcode) in barcodes.iter().enumerate() {
        let cleaned = normalizer.clean(raw_barcode);
        if cleaned.multiple_runs {
            warn!(
                "Row {}: barcode '{}' has multiple digit runs, using the first",
                index + 1,
                raw_barcode.trim()
            );
        }
        if !cleaned.is_standard() {
            warn!(
                "Row {}: skipping non-standard barcode '{}'",
                index + 1,
                raw_barcode.trim()
            );
            dropped += 1;
            continue;
        }

        records.push(CanonicalRecord {
            barcode: cleaned.canonical,
            brand: brands.as_ref().map(|b| b[index].clone()),
            description: descriptions[index].clone(),
            category: None,
            requirement_label: requirements.as_ref().map(|r| r[index].clone()),
            keywords: String::new(),
        });
    }

    if dropped > 0 {
        warn!("Dropped {} rows with unusable barcodes", dropped);
    }

    Ok(records)
}

/// First occurrence of a barcode wins; order stays stable.
fn dedup_first_wins(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.barcode.clone()))
        .collect()
}

/// Merge catalog-sourced category and keywords into upload records by
/// barcode; identity fields from the upload are left untouched.
fn attach_catalog_fields(
    records: Vec<CanonicalRecord>,
    catalog: &[CanonicalRecord],
) -> Vec<CanonicalRecord> {
    let mut by_barcode: HashMap<&str, &CanonicalRecord> = HashMap::new();
    for row in catalog {
        by_barcode.entry(row.barcode.as_str()).or_insert(row);
    }

    records
        .into_iter()
        .map(|mut record| {
            if let Some(row) = by_barcode.get(record.barcode.as_str()) {
                record.category = row.category.clone();
                if record.keywords.is_empty() {
                    record.keywords = row.keywords.clone();
                }
            }
            record
        })
        .collect()
}
