//! Reshapes raw aggregation buckets into client facing facets
use std::collections::BTreeMap;

use crate::models::{Aggregations, FacetBucket, Facets, NestedAttributesAggregation, PriceRange, TermBucket, TermsAggregation};

/// A facet is present only when its aggregation is present in the response
pub fn reshape(aggregations: &Aggregations) -> Facets {
    Facets {
        categories: aggregations.categories.as_ref().map(buckets),
        locations: aggregations.locations.as_ref().map(buckets),
        conditions: aggregations.conditions.as_ref().map(buckets),
        price_range: aggregations.price_stats.as_ref().map(|stats| PriceRange {
            min: stats.min,
            max: stats.max,
        }),
        attributes: aggregations.attrs.as_ref().and_then(attributes),
    }
}

fn bucket(raw: &TermBucket) -> FacetBucket {
    FacetBucket {
        key: raw.key_string(),
        count: raw.doc_count,
    }
}

fn buckets(aggregation: &TermsAggregation) -> Vec<FacetBucket> {
    aggregation.buckets.iter().map(bucket).collect()
}

/// Option key buckets first, then free text buckets, per attribute key.
/// Absent when the nested aggregation carries no key buckets.
fn attributes(aggregation: &NestedAttributesAggregation) -> Option<BTreeMap<String, Vec<FacetBucket>>> {
    let attr_keys = aggregation.attr_keys.as_ref()?;

    let attributes = attr_keys
        .buckets
        .iter()
        .map(|attr| {
            let values = attr
                .values
                .iter()
                .chain(attr.text_values.iter())
                .flat_map(|aggregation| aggregation.buckets.iter().map(bucket))
                .collect::<Vec<_>>();
            (attr.key_string(), values)
        })
        .collect();
    Some(attributes)
}

#[cfg(test)]
mod tests {
    use serde_json;

    use super::*;

    fn parse(raw: serde_json::Value) -> Aggregations {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_attribute_buckets_merged() {
        let aggregations = parse(json!({
            "attrs": {
                "doc_count": 4,
                "attr_keys": {
                    "buckets": [{
                        "key": "color",
                        "doc_count": 4,
                        "values": {"buckets": [{"key": "red", "doc_count": 3}]},
                        "text_values": {"buckets": [{"key": "crimson", "doc_count": 1}]}
                    }]
                }
            }
        }));

        let facets = reshape(&aggregations);
        let attributes = facets.attributes.unwrap();
        assert_eq!(
            attributes["color"],
            vec![
                FacetBucket {
                    key: "red".to_string(),
                    count: 3
                },
                FacetBucket {
                    key: "crimson".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_absent_aggregations_absent_facets() {
        let facets = reshape(&parse(json!({
            "conditions": {"buckets": [{"key": "new", "doc_count": 2}, {"key": "used", "doc_count": 1}]}
        })));
        assert!(facets.categories.is_none());
        assert!(facets.locations.is_none());
        assert!(facets.price_range.is_none());
        assert!(facets.attributes.is_none());
        let conditions = facets.conditions.unwrap();
        assert_eq!(conditions[0].key, "new");
        assert_eq!(conditions[1].count, 1);
    }

    #[test]
    fn test_nested_attrs_without_key_buckets_absent() {
        let facets = reshape(&parse(json!({"attrs": {"doc_count": 0}})));
        assert!(facets.attributes.is_none());

        let facets = reshape(&parse(json!({"attrs": {"doc_count": 0, "attr_keys": {"buckets": []}}})));
        assert_eq!(facets.attributes, Some(BTreeMap::new()));
    }

    #[test]
    fn test_price_range_and_paths() {
        let facets = reshape(&parse(json!({
            "categories": {"buckets": [{"key": "electronics", "doc_count": 5}, {"key": "phones", "doc_count": 3}]},
            "locations": {"buckets": []},
            "price_stats": {"count": 0, "min": null, "max": null, "avg": null, "sum": 0.0}
        })));
        assert_eq!(facets.categories.unwrap().len(), 2);
        assert_eq!(facets.locations, Some(vec![]));
        assert_eq!(facets.price_range, Some(PriceRange { min: None, max: None }));

        let json = serde_json::to_value(&reshape(&parse(json!({"price_stats": {"min": 10.0, "max": 99.5}})))).unwrap();
        assert_eq!(json, json!({"price_range": {"min": 10.0, "max": 99.5}}));
    }
}
