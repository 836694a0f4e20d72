use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Maps arbitrary upload column headers to the canonical field set
/// {barcode, brand, description, requirement} via alias matching.
///
/// Matching is first-match in original header order, not best-match:
/// for each target field the first header whose trimmed, lowercased,
/// whitespace-collapsed form is a member of that field's alias set wins.
pub struct ColumnResolver {
    barcode_aliases: HashSet<String>,
    brand_aliases: HashSet<String>,
    description_aliases: HashSet<String>,
    requirement_aliases: HashSet<String>,
}

/// Outcome of resolution. Each field holds the original (unnormalized)
/// header name so callers can index the upload directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub barcode: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub requirement: Option<String>,
}

impl ResolvedColumns {
    /// Barcode and description are required; brand and requirement are not.
    pub fn unresolved(&self) -> bool {
        self.barcode.is_none() || self.description.is_none()
    }
}

/// Explicit user-supplied mapping, used when alias matching fails.
#[derive(Debug, Clone, Default)]
pub struct ManualMapping {
    pub barcode: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
}

impl ColumnResolver {
    pub fn new() -> Self {
        let barcode_aliases = [
            "barcode",
            "barcodes",
            "upc",
            "upc code",
            "upc/ean",
            "ean",
            "gtin",
            "item upc",
            "product barcode",
        ];
        let brand_aliases = ["brand", "brand name", "manufacturer", "vendor"];
        let description_aliases = [
            "description",
            "desc",
            "product description",
            "item description",
            "product name",
            "item name",
            "title",
        ];
        let requirement_aliases = ["requirement", "requirement name", "requirement label"];

        ColumnResolver {
            barcode_aliases: barcode_aliases.iter().map(|s| s.to_string()).collect(),
            brand_aliases: brand_aliases.iter().map(|s| s.to_string()).collect(),
            description_aliases: description_aliases.iter().map(|s| s.to_string()).collect(),
            requirement_aliases: requirement_aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn normalize_header(&self, name: &str) -> String {
        name.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn first_match(&self, headers: &[String], aliases: &HashSet<String>) -> Option<String> {
        headers
            .iter()
            .find(|h| aliases.contains(&self.normalize_header(h)))
            .cloned()
    }

    pub fn resolve(&self, headers: &[String]) -> ResolvedColumns {
        ResolvedColumns {
            barcode: self.first_match(headers, &self.barcode_aliases),
            brand: self.first_match(headers, &self.brand_aliases),
            description: self.first_match(headers, &self.description_aliases),
            requirement: self.first_match(headers, &self.requirement_aliases),
        }
    }

    /// Validate and apply an explicit mapping. Required fields must be
    /// present among the headers, and no header may be mapped to two
    /// canonical fields; violations are surfaced, never silently fixed.
    pub fn apply_manual(
        &self,
        headers: &[String],
        mapping: &ManualMapping,
    ) -> Result<ResolvedColumns> {
        let find = |chosen: &Option<String>, field: &str| -> Result<Option<String>> {
            match chosen {
                None => Ok(None),
                Some(name) => {
                    let normalized = self.normalize_header(name);
                    headers
                        .iter()
                        .find(|h| self.normalize_header(h) == normalized)
                        .cloned()
                        .map(Some)
                        .ok_or_else(|| {
                            anyhow!("mapped {} column '{}' not found in upload", field, name)
                        })
                }
            }
        };

        let barcode = find(&mapping.barcode, "barcode")?
            .ok_or_else(|| anyhow!("manual mapping must name a barcode column"))?;
        let description = find(&mapping.description, "description")?
            .ok_or_else(|| anyhow!("manual mapping must name a description column"))?;
        let brand = find(&mapping.brand, "brand")?;

        let mut used = HashSet::new();
        for header in [Some(&barcode), Some(&description), brand.as_ref()]
            .into_iter()
            .flatten()
        {
            if !used.insert(self.normalize_header(header)) {
                return Err(anyhow!(
                    "column '{}' is mapped to more than one canonical field",
                    header
                ));
            }
        }

        Ok(ResolvedColumns {
            barcode: Some(barcode),
            brand,
            description: Some(description),
            requirement: self.first_match(headers, &self.requirement_aliases),
        })
    }
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_documented_aliases_resolve() {
        let resolver = ColumnResolver::new();
        let resolved = resolver.resolve(&headers(&["UPC", "Brand Name", "Product Description"]));

        assert_eq!(resolved.barcode.as_deref(), Some("UPC"));
        assert_eq!(resolved.brand.as_deref(), Some("Brand Name"));
        assert_eq!(resolved.description.as_deref(), Some("Product Description"));
        assert!(!resolved.unresolved());
    }

    #[test]
    fn test_first_match_in_header_order() {
        let resolver = ColumnResolver::new();
        // Both "UPC" and "ean" are barcode aliases; the earlier header wins.
        let resolved = resolver.resolve(&headers(&["UPC", "ean", "Description"]));
        assert_eq!(resolved.barcode.as_deref(), Some("UPC"));
    }

    #[test]
    fn test_missing_brand_is_not_a_failure() {
        let resolver = ColumnResolver::new();
        let resolved = resolver.resolve(&headers(&["gtin", "Item Description"]));
        assert!(resolved.brand.is_none());
        assert!(!resolved.unresolved());
    }

    #[test]
    fn test_unresolved_required_field() {
        let resolver = ColumnResolver::new();
        let resolved = resolver.resolve(&headers(&["code", "Brand", "notes"]));
        assert!(resolved.barcode.is_none());
        assert!(resolved.unresolved());
    }

    #[test]
    fn test_requirement_column_detection() {
        let resolver = ColumnResolver::new();
        let resolved = resolver.resolve(&headers(&["barcode", "description", "Requirement Name"]));
        assert_eq!(resolved.requirement.as_deref(), Some("Requirement Name"));
    }

    #[test]
    fn test_manual_mapping_applies() {
        let resolver = ColumnResolver::new();
        let cols = headers(&["code", "maker", "notes"]);
        let mapping = ManualMapping {
            barcode: Some("code".to_string()),
            brand: Some("maker".to_string()),
            description: Some("notes".to_string()),
        };
        let resolved = resolver.apply_manual(&cols, &mapping).unwrap();
        assert_eq!(resolved.barcode.as_deref(), Some("code"));
        assert_eq!(resolved.brand.as_deref(), Some("maker"));
        assert_eq!(resolved.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_manual_mapping_rejects_duplicate_target() {
        let resolver = ColumnResolver::new();
        let cols = headers(&["code", "notes"]);
        let mapping = ManualMapping {
            barcode: Some("code".to_string()),
            brand: Some("code".to_string()),
            description: Some("notes".to_string()),
        };
        assert!(resolver.apply_manual(&cols, &mapping).is_err());
    }

    #[test]
    fn test_manual_mapping_requires_required_fields() {
        let resolver = ColumnResolver::new();
        let cols = headers(&["code", "notes"]);
        let mapping = ManualMapping {
            barcode: Some("code".to_string()),
            brand: None,
            description: None,
        };
        assert!(resolver.apply_manual(&cols, &mapping).is_err());

        let mapping = ManualMapping {
            barcode: Some("missing".to_string()),
            brand: None,
            description: Some("notes".to_string()),
        };
        assert!(resolver.apply_manual(&cols, &mapping).is_err());
    }
}
