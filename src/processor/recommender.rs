use std::collections::{HashMap, HashSet};

use crate::models::record::{CanonicalRecord, SuggestionPair};

pub const DEFAULT_SUGGESTION_FANOUT: usize = 2;

/// Toy same-group pairing over (brand, category): each source record
/// suggests the first k other members of its group in stable input order.
/// This is positional, not a similarity ranking.
pub struct RelatedItemRecommender;

impl RelatedItemRecommender {
    pub fn recommend(&self, records: &[CanonicalRecord], k: usize) -> Vec<SuggestionPair> {
        if records.is_empty() {
            return Vec::new();
        }

        // Groups keyed by the literal (possibly empty) brand and category
        // values, in first-appearance order.
        let mut group_index: HashMap<(String, String), usize> = HashMap::new();
        let mut groups: Vec<((String, String), Vec<String>)> = Vec::new();

        for record in records {
            let key = (
                record.brand.clone().unwrap_or_default(),
                record.category.clone().unwrap_or_default(),
            );
            match group_index.get(&key) {
                Some(&index) => groups[index].1.push(record.barcode.clone()),
                None => {
                    group_index.insert(key.clone(), groups.len());
                    groups.push((key, vec![record.barcode.clone()]));
                }
            }
        }

        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for ((brand, category), barcodes) in &groups {
            let reason = format!("Same brand '{}' and category '{}'", brand, category);
            for source in barcodes {
                let others = barcodes
                    .iter()
                    .filter(|other| *other != source)
                    .take(k);
                for suggested in others {
                    let pair = SuggestionPair {
                        source_barcode: source.clone(),
                        suggested_barcode: suggested.clone(),
                        reason: reason.clone(),
                    };
                    if seen.insert(pair.clone()) {
                        suggestions.push(pair);
                    }
                }
            }
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(barcode: &str, brand: &str, category: &str) -> CanonicalRecord {
        CanonicalRecord {
            barcode: barcode.to_string(),
            brand: Some(brand.to_string()),
            description: format!("{} {} bottle 900 ml", brand, category),
            category: Some(category.to_string()),
            requirement_label: None,
            keywords: String::new(),
        }
    }

    #[test]
    fn test_same_group_fanout() {
        let records = vec![
            record("000000000001", "Acme", "Snacks"),
            record("000000000002", "Acme", "Snacks"),
            record("000000000003", "Acme", "Snacks"),
        ];
        let suggestions = RelatedItemRecommender.recommend(&records, 2);

        assert_eq!(suggestions.len(), 6);
        for source in ["000000000001", "000000000002", "000000000003"] {
            let for_source: Vec<_> = suggestions
                .iter()
                .filter(|s| s.source_barcode == source)
                .collect();
            assert_eq!(for_source.len(), 2);
            assert!(for_source.iter().all(|s| s.suggested_barcode != source));
        }
    }

    #[test]
    fn test_fanout_bounded_by_group_size() {
        let records = vec![
            record("000000000001", "Acme", "Snacks"),
            record("000000000002", "Acme", "Snacks"),
        ];
        let suggestions = RelatedItemRecommender.recommend(&records, 5);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn test_groups_do_not_cross() {
        let records = vec![
            record("000000000001", "Acme", "Snacks"),
            record("000000000002", "Globex", "Snacks"),
            record("000000000003", "Acme", "Beverages"),
        ];
        let suggestions = RelatedItemRecommender.recommend(&records, 2);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_empty_category_is_a_valid_group() {
        let mut a = record("000000000001", "Acme", "");
        a.category = None;
        let mut b = record("000000000002", "Acme", "");
        b.category = Some(String::new());

        // Literal empty category, whether missing or blank, groups together.
        let suggestions = RelatedItemRecommender.recommend(&[a, b], 1);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(
            suggestions[0].reason,
            "Same brand 'Acme' and category ''"
        );
    }

    #[test]
    fn test_empty_catalog_yields_empty_result() {
        assert!(RelatedItemRecommender.recommend(&[], 3).is_empty());
    }

    #[test]
    fn test_exact_duplicate_pairs_are_deduplicated() {
        let records = vec![
            record("000000000001", "Acme", "Snacks"),
            record("000000000002", "Acme", "Snacks"),
            record("000000000002", "Acme", "Snacks"),
        ];
        let suggestions = RelatedItemRecommender.recommend(&records, 3);
        let unique: HashSet<_> = suggestions.iter().cloned().collect();
        assert_eq!(unique.len(), suggestions.len());
    }
}
