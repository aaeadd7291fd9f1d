//! Compiles a structured listing filter into a search request body.
//!
//! Attribute values are stored in one of four typed fields and the
//! compiler does not know which one a given attribute uses, so each
//! candidate value is matched against every field it could live in.
use serde_json;

use crate::models::{FilterRequest, RangeFilter, SearchPage, SortOrder};

pub const ATTRS_PATH: &str = "attrs";

pub const CATEGORIES_AGG: &str = "categories";
pub const LOCATIONS_AGG: &str = "locations";
pub const CONDITIONS_AGG: &str = "conditions";
pub const PRICE_STATS_AGG: &str = "price_stats";
pub const ATTRS_AGG: &str = "attrs";
pub const ATTR_KEYS_AGG: &str = "attr_keys";
pub const ATTR_VALUES_AGG: &str = "values";
pub const ATTR_TEXT_VALUES_AGG: &str = "text_values";

/// Compiled search, ready to be sent to the index
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSearch {
    pub query: serde_json::Value,
    pub aggregations: serde_json::Value,
    pub sort: Option<serde_json::Value>,
    pub from: i64,
    pub size: i64,
}

impl CompiledSearch {
    pub fn into_body(self) -> serde_json::Value {
        let mut body = json!({
            "from": self.from,
            "size": self.size,
            "query": self.query,
            "aggs": self.aggregations,
        });
        if let Some(sort) = self.sort {
            body["sort"] = sort;
        }
        body
    }
}

pub fn compile(filter: &FilterRequest, sort: SortOrder, page: SearchPage) -> CompiledSearch {
    CompiledSearch {
        query: compile_query(filter),
        aggregations: aggregations(),
        sort: compile_sort(sort),
        from: page.offset(),
        size: page.per_page,
    }
}

/// Boolean query: relevance clauses in `must`, exact constraints in `filter`
pub fn compile_query(filter: &FilterRequest) -> serde_json::Value {
    let mut must = vec![];
    let mut filters = vec![];

    if let Some(ref text) = filter.full_text_query {
        must.push(json!({
            "multi_match": {
                "query": text,
                "fields": ["title^2", "description"],
                "type": "best_fields",
            }
        }));
    }

    if let Some(ref slug) = filter.category_slug {
        filters.push(json!({ "terms": { "category_path": [slug] } }));
    }

    if let Some(ref slug) = filter.location_slug {
        filters.push(json!({ "terms": { "location_path": [slug] } }));
    }

    if let Some(ref condition) = filter.condition {
        filters.push(json!({ "term": { "condition": condition } }));
    }

    if let Some(range) = range_map(&filter.price_range()) {
        filters.push(json!({ "range": { "price": range } }));
    }

    for (key, values) in &filter.attribute_filters {
        if values.is_empty() {
            continue;
        }
        filters.push(attribute_values_clause(key, values));
    }

    for (key, range) in &filter.attribute_range_filters {
        if let Some(range) = range_map(range) {
            filters.push(nested_attrs(json!({
                "bool": {
                    "must": [
                        { "term": { "attrs.key": key } },
                        { "range": { "attrs.value_number": range } },
                    ]
                }
            })));
        }
    }

    json!({ "bool": { "must": must, "filter": filters } })
}

/// `gte`/`lte` map holding only the bounds that are set
fn range_map(range: &RangeFilter) -> Option<serde_json::Map<String, serde_json::Value>> {
    if range.is_empty() {
        return None;
    }
    let mut range_map = serde_json::Map::<String, serde_json::Value>::new();
    if let Some(min) = range.min {
        range_map.insert("gte".to_string(), json!(min));
    }
    if let Some(max) = range.max {
        range_map.insert("lte".to_string(), json!(max));
    }
    Some(range_map)
}

fn nested_attrs(query: serde_json::Value) -> serde_json::Value {
    json!({
        "nested": {
            "path": ATTRS_PATH,
            "query": query,
        }
    })
}

/// Any candidate value may match, each one within a single attribute row of `key`
fn attribute_values_clause(key: &str, values: &[String]) -> serde_json::Value {
    let groups = values
        .iter()
        .map(|value| {
            json!({
                "bool": {
                    "must": [
                        { "term": { "attrs.key": key } },
                        { "bool": { "should": value_matchers(value), "minimum_should_match": 1 } },
                    ]
                }
            })
        })
        .collect::<Vec<_>>();

    nested_attrs(json!({
        "bool": {
            "should": groups,
            "minimum_should_match": 1,
        }
    }))
}

/// Every physical representation a raw filter value may be stored in
fn value_matchers(value: &str) -> Vec<serde_json::Value> {
    let mut matchers = vec![
        json!({ "term": { "attrs.value_option_key": value } }),
        json!({ "term": { "attrs.value_text": value } }),
    ];

    match value.to_lowercase().as_str() {
        "true" => matchers.push(json!({ "term": { "attrs.value_bool": true } })),
        "false" => matchers.push(json!({ "term": { "attrs.value_bool": false } })),
        _ => {}
    }

    if let Ok(number) = value.trim().parse::<f64>() {
        if number.is_finite() {
            matchers.push(json!({ "term": { "attrs.value_number": number } }));
        }
    }

    matchers
}

fn compile_sort(sort: SortOrder) -> Option<serde_json::Value> {
    match sort {
        SortOrder::Relevance => None,
        SortOrder::Newest => Some(json!([{ "refreshed_at": { "order": "desc" } }])),
        SortOrder::PriceAsc => Some(json!([{ "price": { "order": "asc" } }])),
        SortOrder::PriceDesc => Some(json!([{ "price": { "order": "desc" } }])),
    }
}

/// Facet aggregations, requested with every search
pub fn aggregations() -> serde_json::Value {
    json!({
        CATEGORIES_AGG: { "terms": { "field": "category_path", "size": 50 } },
        LOCATIONS_AGG: { "terms": { "field": "location_path", "size": 50 } },
        CONDITIONS_AGG: { "terms": { "field": "condition", "size": 10 } },
        PRICE_STATS_AGG: { "stats": { "field": "price" } },
        ATTRS_AGG: {
            "nested": { "path": ATTRS_PATH },
            "aggs": {
                ATTR_KEYS_AGG: {
                    "terms": { "field": "attrs.key", "size": 20 },
                    "aggs": {
                        ATTR_VALUES_AGG: { "terms": { "field": "attrs.value_option_key", "size": 30 } },
                        ATTR_TEXT_VALUES_AGG: { "terms": { "field": "attrs.value_text", "size": 30 } },
                    }
                }
            }
        }
    })
}
