use serde_json;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Detailed { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match *self {
            TotalHits::Count(value) | TotalHits::Detailed { value } => value,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Hits {
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub hits: Option<Hits>,
    #[serde(default)]
    pub aggregations: Aggregations,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits
            .as_ref()
            .and_then(|hits| hits.total.as_ref())
            .map(TotalHits::value)
            .unwrap_or(0)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TermBucket {
    pub key: serde_json::Value,
    pub doc_count: u64,
}

/// Bucket key as text, numeric and boolean keys are stringified
fn key_string(key: &serde_json::Value) -> String {
    match *key {
        serde_json::Value::String(ref key) => key.clone(),
        ref other => other.to_string(),
    }
}

impl TermBucket {
    pub fn key_string(&self) -> String {
        key_string(&self.key)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermsAggregation {
    #[serde(default)]
    pub buckets: Vec<TermBucket>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StatsAggregation {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AttributeKeyBucket {
    pub key: serde_json::Value,
    pub doc_count: u64,
    pub values: Option<TermsAggregation>,
    pub text_values: Option<TermsAggregation>,
}

impl AttributeKeyBucket {
    pub fn key_string(&self) -> String {
        key_string(&self.key)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AttributeKeysAggregation {
    #[serde(default)]
    pub buckets: Vec<AttributeKeyBucket>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NestedAttributesAggregation {
    pub attr_keys: Option<AttributeKeysAggregation>,
}

/// Aggregations requested by every listing search, each may be absent
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Aggregations {
    pub categories: Option<TermsAggregation>,
    pub locations: Option<TermsAggregation>,
    pub conditions: Option<TermsAggregation>,
    pub price_stats: Option<StatsAggregation>,
    pub attrs: Option<NestedAttributesAggregation>,
}
