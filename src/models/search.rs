//! Search request and response models.
//!
//! `FilterRequest::from_params` turns the decoded query string into a
//! structured filter. Keys may repeat and any value may be comma-delimited.
use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json;

const ATTRS_PREFIX: &str = "attrs.";
const RANGE_MIN_SUFFIX: &str = "_min";
const RANGE_MAX_SUFFIX: &str = "_max";

/// Optional numeric bounds, both inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub full_text_query: Option<String>,
    pub category_slug: Option<String>,
    pub location_slug: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Candidate values per attribute key, matched with logical OR
    pub attribute_filters: BTreeMap<String, Vec<String>>,
    pub attribute_range_filters: BTreeMap<String, RangeFilter>,
}

impl FilterRequest {
    /// Builds a filter from query parameters in their original order.
    /// Unknown keys are ignored.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let mut filter = FilterRequest::default();

        for (name, value) in params {
            if name.starts_with(ATTRS_PREFIX) {
                let key = &name[ATTRS_PREFIX.len()..];
                filter.push_attribute(key, value);
                continue;
            }

            match name.as_str() {
                "q" => filter.full_text_query = non_empty(value),
                "category_slug" => filter.category_slug = non_empty(value),
                "location_slug" => filter.location_slug = non_empty(value),
                "condition" => filter.condition = non_empty(value),
                "min_price" => filter.min_price = parse_number(name, value).or(filter.min_price),
                "max_price" => filter.max_price = parse_number(name, value).or(filter.max_price),
                _ => {}
            }
        }

        filter
    }

    fn push_attribute(&mut self, key: &str, value: &str) {
        if key.ends_with(RANGE_MIN_SUFFIX) || key.ends_with(RANGE_MAX_SUFFIX) {
            let (attr_key, suffix) = key.split_at(key.len() - RANGE_MIN_SUFFIX.len());
            if attr_key.is_empty() {
                return;
            }
            // an unparsable bound leaves any earlier bound in place
            if let Some(bound) = parse_number(key, value) {
                let range = self.attribute_range_filters.entry(attr_key.to_string()).or_insert_with(RangeFilter::default);
                if suffix == RANGE_MIN_SUFFIX {
                    range.min = Some(bound);
                } else {
                    range.max = Some(bound);
                }
            }
            return;
        }

        if key.is_empty() {
            return;
        }
        let candidates = value.split(',').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();
        if candidates.is_empty() {
            return;
        }
        let values = self.attribute_filters.entry(key.to_string()).or_insert_with(Vec::new);
        for candidate in candidates {
            if !values.iter().any(|v| v == candidate) {
                values.push(candidate.to_string());
            }
        }
    }

    pub fn price_range(&self) -> RangeFilter {
        RangeFilter {
            min: self.min_price,
            max: self.max_price,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_number(name: &str, value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => {
            debug!("Ignoring non numeric search parameter {}={}", name, value);
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    Newest,
    PriceAsc,
    PriceDesc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Relevance
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortOrder::Relevance),
            "newest" => Ok(SortOrder::Newest),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            _ => Err(()),
        }
    }
}

/// Result window of a search, page starts at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: i64,
    pub per_page: i64,
}

impl SearchPage {
    pub const MAX_PER_PAGE: i64 = 50;

    /// Clamps the page to at least 1 and the page size to `[1, max_per_page]`
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64, max_per_page: i64) -> Self {
        let max_per_page = max_per_page.max(1).min(Self::MAX_PER_PAGE);
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).max(1).min(max_per_page),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Search over listings as requested by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchListings {
    pub filter: FilterRequest,
    pub sort: SortOrder,
    pub page: SearchPage,
}

impl SearchListings {
    /// Reads the filter, `sort` (unknown falls back to relevance), `page` and `per_page`
    pub fn from_params(params: &[(String, String)], default_per_page: i64, max_per_page: i64) -> Self {
        let last = |name: &str| params.iter().rev().find(|(key, _)| key == name).map(|(_, value)| value.as_str());
        let sort = last("sort").and_then(|value| value.parse().ok()).unwrap_or_default();
        let page = last("page").and_then(|value| value.trim().parse().ok());
        let per_page = last("per_page").and_then(|value| value.trim().parse().ok());

        Self {
            filter: FilterRequest::from_params(params),
            sort,
            page: SearchPage::new(page, per_page, default_per_page, max_per_page),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Client facing facets, a facet is absent when its aggregation is absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<FacetBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<FacetBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<FacetBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Vec<FacetBucket>>>,
}

/// Search hit: indexed document fields plus id and score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    #[serde(flatten)]
    pub source: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Facets>,
    /// Set when the search backend could not serve the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SearchResults {
    /// Empty result annotated with the reason search was unavailable
    pub fn unavailable<S: Into<String>>(note: S) -> Self {
        Self {
            results: vec![],
            total: 0,
            page: None,
            per_page: None,
            facets: None,
            note: Some(note.into()),
        }
    }
}
